//! Wires a small graph out of the library: two uniform sources feed an
//! adder, and the sums stream to stdout. Useful as a smoke test and as a
//! minimal example of the block control surface.

use anyhow::{Context, Result};
use blockflow::{library, Block};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let lib = library();
    let spec = |name: &str| lib.get(name).with_context(|| format!("missing spec '{name}'"));

    let left = Block::new(spec("uniform")?);
    let right = Block::new(spec("uniform")?);
    let add = Block::new(spec("+")?);

    left.serve()?;
    right.serve()?;
    add.serve()?;

    left.connect(0, add.input(0)?).await?;
    right.connect(0, add.input(1)?).await?;

    let (sums, mut rx) = mpsc::channel(1);
    add.connect(0, sums).await?;

    for _ in 0..10 {
        match rx.recv().await {
            Some(sum) => println!("{}", serde_json::to_string(&sum)?),
            None => break,
        }
    }

    left.stop().await;
    right.stop().await;
    add.stop().await;
    Ok(())
}
