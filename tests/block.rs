//! End-to-end scenarios driven through the public block handle: graphs
//! are wired, fed, and observed exactly the way an external graph editor
//! would.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use blockflow::{library, Block, KeyValueStore, Message, Source, Spec};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(1);

fn spec(name: &str) -> Arc<Spec> {
    library()
        .get(name)
        .unwrap_or_else(|| panic!("missing spec '{name}'"))
}

async fn recv(rx: &mut mpsc::Receiver<Message>) -> Message {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("sink channel closed")
}

#[tokio::test]
async fn set_builds_a_single_entry_object() -> Result<()> {
    let set = Block::new(spec("set"));
    let (tx, mut rx) = mpsc::channel(1);
    set.serve()?;
    set.connect(0, tx).await?;

    set.input(0)?.send(Message::from("testing")).await?;
    set.input(1)?.send(Message::from("success")).await?;

    let object = recv(&mut rx).await;
    assert_eq!(serde_json::to_string(&object)?, r#"{"testing":"success"}"#);

    set.stop().await;
    Ok(())
}

#[tokio::test]
async fn delay_holds_the_message_for_the_duration() -> Result<()> {
    let delay = Block::new(spec("delay"));
    let (tx, mut rx) = mpsc::channel(1);
    delay.serve()?;
    delay.connect(0, tx).await?;
    delay.set_input(1, Message::from("1s")).await?;

    let started = Instant::now();
    delay.input(0)?.send(Message::from("x")).await?;
    let message = timeout(Duration::from_secs(2), rx.recv())
        .await?
        .expect("sink channel closed");
    let elapsed = started.elapsed();

    assert_eq!(message, Message::from("x"));
    assert!(elapsed >= Duration::from_secs(1), "fired early: {elapsed:?}");
    assert!(
        elapsed <= Duration::from_millis(1300),
        "fired late: {elapsed:?}"
    );

    delay.stop().await;
    Ok(())
}

#[tokio::test]
async fn kv_set_and_dump_share_one_store() -> Result<()> {
    let store = Arc::new(KeyValueStore::new());

    let kvset = Block::new(spec("kvSet"));
    let kvdump = Block::new(spec("kvDump"));
    let (ack_tx, mut ack_rx) = mpsc::channel(1);
    let (dump_tx, mut dump_rx) = mpsc::channel(1);

    kvset.serve()?;
    kvdump.serve()?;
    kvset.set_source(Source::KeyValue(Arc::clone(&store))).await?;
    kvdump.set_source(Source::KeyValue(Arc::clone(&store))).await?;
    kvset.connect(0, ack_tx).await?;
    kvdump.connect(0, dump_tx).await?;

    let pairs = [
        ("apple", "red"),
        ("orange", "orange"),
        ("pineapple", "prickly"),
        ("grapefruit", "orange"),
        ("banana", "yellow"),
        ("strawberry", "red"),
    ];
    for (key, value) in pairs {
        kvset.input(0)?.send(Message::from(key)).await?;
        kvset.input(1)?.send(Message::from(value)).await?;
        let _ = recv(&mut ack_rx).await;
    }

    kvdump.input(0)?.send(Message::from("bang")).await?;
    let dump = recv(&mut dump_rx).await;

    let mut expected = BTreeMap::new();
    for (key, value) in pairs {
        expected.insert(key.to_string(), Message::from(value));
    }
    assert_eq!(dump, Message::Object(expected));

    kvset.stop().await;
    kvdump.stop().await;
    Ok(())
}

#[tokio::test]
async fn first_is_true_exactly_once_until_reset() -> Result<()> {
    let first = Block::new(spec("first"));
    let (tx, mut rx) = mpsc::channel(1);
    first.serve()?;
    first.connect(0, tx).await?;
    let route = first.input(0)?;

    let expected = [true, false, false, false, false];
    for (n, want) in expected.into_iter().enumerate() {
        route.send(Message::Number(n as f64)).await?;
        assert_eq!(recv(&mut rx).await, Message::Bool(want));
    }

    first.reset().await?;
    route.send(Message::Number(9.0)).await?;
    assert_eq!(recv(&mut rx).await, Message::Bool(true));

    first.stop().await;
    Ok(())
}

#[tokio::test]
async fn identity_streams_a_null_literal() -> Result<()> {
    let identity = Block::new(spec("identity"));
    let (tx, mut rx) = mpsc::channel(1);
    identity.serve()?;
    identity.connect(0, tx).await?;
    identity.set_input(0, Message::Null).await?;

    let message = recv(&mut rx).await;
    assert!(message.is_null());
    assert_eq!(serde_json::to_string(&message)?, "null");

    identity.stop().await;
    Ok(())
}

#[tokio::test]
async fn parse_json_emits_values_and_parse_errors() -> Result<()> {
    let parse = Block::new(spec("parseJSON"));
    let (tx, mut rx) = mpsc::channel(1);
    parse.serve()?;
    parse.connect(0, tx).await?;
    let route = parse.input(0)?;

    route
        .send(Message::from(
            r#"{"foo":"bar", "weight":2.3, "someArray":[1,2,3]}"#,
        ))
        .await?;
    let parsed = recv(&mut rx).await;
    let fields = parsed.as_object().expect("object");
    assert_eq!(fields["foo"], Message::from("bar"));
    assert_eq!(fields["weight"], Message::Number(2.3));

    route
        .send(Message::from(r#"{"foo":bar, "weight":2.3}"#))
        .await?;
    assert!(recv(&mut rx).await.is_error());

    parse.stop().await;
    Ok(())
}

#[tokio::test]
async fn merge_prefers_the_first_input() -> Result<()> {
    let merge = Block::new(spec("merge"));
    let (tx, mut rx) = mpsc::channel(1);
    merge.serve()?;
    merge.connect(0, tx).await?;

    merge
        .input(0)?
        .send(serde_json::from_str(r#"{"a":3,"b":true}"#)?)
        .await?;
    merge.input(1)?.send(serde_json::from_str(r#"{"c":3}"#)?).await?;
    assert_eq!(
        recv(&mut rx).await,
        serde_json::from_str::<Message>(r#"{"a":3,"b":true,"c":3}"#)?
    );

    merge
        .input(0)?
        .send(serde_json::from_str(r#"{"a":3,"b":true}"#)?)
        .await?;
    merge.input(1)?.send(serde_json::from_str(r#"{"b":3}"#)?).await?;
    assert_eq!(
        recv(&mut rx).await,
        serde_json::from_str::<Message>(r#"{"a":3,"b":true}"#)?
    );

    merge.stop().await;
    Ok(())
}

#[tokio::test]
async fn emission_is_fifo_per_sink_and_fans_out() -> Result<()> {
    let identity = Block::new(spec("identity"));
    let (tx_one, mut rx_one) = mpsc::channel(1);
    let (tx_two, mut rx_two) = mpsc::channel(1);
    identity.serve()?;
    identity.connect(0, tx_one).await?;
    identity.connect(0, tx_two).await?;

    let route = identity.input(0)?;
    let producer = tokio::spawn(async move {
        for n in 0..20 {
            route
                .send(Message::Number(n as f64))
                .await
                .expect("route closed");
        }
    });

    for n in 0..20 {
        assert_eq!(recv(&mut rx_one).await, Message::Number(n as f64));
        assert_eq!(recv(&mut rx_two).await, Message::Number(n as f64));
    }

    producer.await?;
    identity.stop().await;
    Ok(())
}

#[tokio::test]
async fn latched_literals_repeat_until_replaced() -> Result<()> {
    let identity = Block::new(spec("identity"));
    let (tx, mut rx) = mpsc::channel(1);
    identity.serve()?;
    identity.connect(0, tx).await?;

    let object: Message = serde_json::from_str(r#"{"lol":"lol"}"#)?;
    identity.set_input(0, object.clone()).await?;

    // Every tick re-reads the same literal.
    assert_eq!(recv(&mut rx).await, object);
    assert_eq!(recv(&mut rx).await, object);

    // Replacing the literal shows up after the in-flight ticks drain.
    identity.set_input(0, Message::from("fresh")).await?;
    let mut saw_fresh = false;
    for _ in 0..10 {
        if recv(&mut rx).await == Message::from("fresh") {
            saw_fresh = true;
            break;
        }
    }
    assert!(saw_fresh, "replacement literal never surfaced");

    identity.stop().await;
    Ok(())
}

#[tokio::test]
async fn a_slow_sink_throttles_the_producer() -> Result<()> {
    let identity = Block::new(spec("identity"));
    let (tx, mut rx) = mpsc::channel(1);
    identity.serve()?;
    identity.connect(0, tx).await?;
    let route = identity.input(0)?;

    // One message in the sink buffer, one mid-emission, one in the route
    // buffer; the next send must park until the sink drains.
    for n in 0..3 {
        route.send(Message::Number(n as f64)).await?;
    }
    let blocked = timeout(Duration::from_millis(100), route.send(Message::Number(3.0))).await;
    assert!(blocked.is_err(), "producer was not throttled");

    for n in 0..3 {
        assert_eq!(recv(&mut rx).await, Message::Number(n as f64));
    }

    identity.stop().await;
    Ok(())
}

#[tokio::test]
async fn stop_unblocks_every_library_block() {
    for name in library().names() {
        let block = Block::new(spec(name));
        block.serve().expect("serve");
        timeout(Duration::from_secs(2), block.stop())
            .await
            .unwrap_or_else(|_| panic!("'{name}' failed to stop promptly"));
    }
}

#[tokio::test]
async fn arithmetic_graph_streams_sums() -> Result<()> {
    let left = Block::new(spec("uniform"));
    let right = Block::new(spec("uniform"));
    let add = Block::new(spec("+"));

    left.serve()?;
    right.serve()?;
    add.serve()?;

    left.connect(0, add.input(0)?).await?;
    right.connect(0, add.input(1)?).await?;
    let (tx, mut rx) = mpsc::channel(1);
    add.connect(0, tx).await?;

    for _ in 0..10 {
        let sum = recv(&mut rx).await.as_number().expect("numeric sum");
        assert!((0.0..2.0).contains(&sum), "sum {sum} out of range");
    }

    add.stop().await;
    left.stop().await;
    right.stop().await;
    Ok(())
}
