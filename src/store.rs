//! Shared stores blocks attach to as sources.
//!
//! Stores are the only mutable objects two blocks may share. Each store
//! locks internally and snapshots under the lock, so a dump is always
//! coherent even while other blocks mutate concurrently.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::message::Message;

/// Queue depth of a stream store before producers back off.
const STREAM_CAPACITY: usize = 64;

/// The source attached to a block, replaceable through a control
/// interrupt. Kernels match on the kind they need and emit an error value
/// when the attachment is missing or wrong.
#[derive(Debug, Clone)]
pub enum Source {
    KeyValue(Arc<KeyValueStore>),
    List(Arc<ListStore>),
    Value(Arc<ValueStore>),
    Stream(Arc<StreamStore>),
}

/// Concurrent map from string keys to messages.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    data: Mutex<BTreeMap<String, Message>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Message> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn set(&self, key: String, value: Message) {
        self.data.lock().unwrap().insert(key, value);
    }

    /// Removes a key, returning the value it held.
    pub fn delete(&self, key: &str) -> Option<Message> {
        self.data.lock().unwrap().remove(key)
    }

    pub fn clear(&self) {
        self.data.lock().unwrap().clear();
    }

    /// Clones the whole map under the lock: no torn reads, and the caller
    /// iterates without holding the store up.
    pub fn dump(&self) -> BTreeMap<String, Message> {
        self.data.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concurrent ordered sequence of messages.
#[derive(Debug, Default)]
pub struct ListStore {
    data: Mutex<Vec<Message>>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<Message> {
        self.data.lock().unwrap().get(index).cloned()
    }

    /// Replaces the element at `index`; `false` when out of range.
    pub fn set(&self, index: usize, value: Message) -> bool {
        let mut data = self.data.lock().unwrap();
        match data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the first element.
    pub fn shift(&self) -> Option<Message> {
        let mut data = self.data.lock().unwrap();
        if data.is_empty() {
            None
        } else {
            Some(data.remove(0))
        }
    }

    pub fn append(&self, value: Message) {
        self.data.lock().unwrap().push(value);
    }

    /// Removes and returns the last element.
    pub fn pop(&self) -> Option<Message> {
        self.data.lock().unwrap().pop()
    }

    pub fn dump(&self) -> Vec<Message> {
        self.data.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single shared message, null until first set.
#[derive(Debug, Default)]
pub struct ValueStore {
    data: Mutex<Message>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Message {
        self.data.lock().unwrap().clone()
    }

    pub fn set(&self, value: Message) {
        *self.data.lock().unwrap() = value;
    }
}

/// A queue external producers push into and the `receive` block pulls
/// from. Pushes park once the queue is full, pulls park until a message
/// arrives; a `receive` kernel pulls inside a select so interrupts still
/// land.
#[derive(Debug)]
pub struct StreamStore {
    tx: mpsc::Sender<Message>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Message>>,
}

impl StreamStore {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }

    /// Enqueues a message; `false` only if the store is being torn down.
    pub async fn push(&self, message: Message) -> bool {
        self.tx.send(message).await.is_ok()
    }

    /// Dequeues the next message. Cancel-safe: an abandoned pull loses
    /// nothing.
    pub async fn pull(&self) -> Option<Message> {
        self.rx.lock().await.recv().await
    }
}

impl Default for StreamStore {
    fn default() -> Self {
        Self::new()
    }
}
