//! Store-accessor kernels.
//!
//! Each kernel expects the block to be attached to a source of the right
//! kind; a missing or mismatched attachment is an ordinary error value on
//! output 0, never a runtime failure.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};
use crate::store::{KeyValueStore, ListStore, Source, ValueStore};

fn key_value<'a>(source: Option<&'a Source>, name: &str) -> Result<&'a KeyValueStore, Message> {
    match source {
        Some(Source::KeyValue(store)) => Ok(store),
        _ => Err(Message::error(format!(
            "{name} requires a key/value store source"
        ))),
    }
}

fn list<'a>(source: Option<&'a Source>, name: &str) -> Result<&'a ListStore, Message> {
    match source {
        Some(Source::List(store)) => Ok(store),
        _ => Err(Message::error(format!("{name} requires a list store source"))),
    }
}

fn value<'a>(source: Option<&'a Source>, name: &str) -> Result<&'a ValueStore, Message> {
    match source {
        Some(Source::Value(store)) => Ok(store),
        _ => Err(Message::error(format!(
            "{name} requires a value store source"
        ))),
    }
}

fn index(message: &Message, name: &str) -> Result<usize, Message> {
    let Some(n) = message.as_number() else {
        return Err(Message::error(format!("{name} requires a numeric index")));
    };
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(Message::error(format!("{name}: invalid index {n}")));
    }
    Ok(n as usize)
}

pub(super) fn kv_get() -> Spec {
    Spec {
        name: "kvGet",
        inputs: pins(&["key"]),
        outputs: pins(&["value"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            let store = match key_value(source, "kvGet") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            let Some(key) = inputs[0].as_str() else {
                outputs.insert(0, Message::error("kvGet requires a string key"));
                return;
            };
            match store.get(key) {
                Some(value) => {
                    outputs.insert(0, value);
                }
                None => {
                    outputs.insert(0, Message::error(format!("kvGet: no value for key {key:?}")));
                }
            }
        }),
    }
}

/// Stores the pair and acknowledges with the one-entry object it wrote.
pub(super) fn kv_set() -> Spec {
    Spec {
        name: "kvSet",
        inputs: pins(&["key", "value"]),
        outputs: pins(&["object"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            let store = match key_value(source, "kvSet") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            let Some(key) = inputs[0].as_str() else {
                outputs.insert(0, Message::error("kvSet requires a string key"));
                return;
            };
            store.set(key.to_string(), inputs[1].clone());
            let mut object = std::collections::BTreeMap::new();
            object.insert(key.to_string(), inputs[1].clone());
            outputs.insert(0, Message::Object(object));
        }),
    }
}

pub(super) fn kv_clear() -> Spec {
    Spec {
        name: "kvClear",
        inputs: pins(&["trigger"]),
        outputs: pins(&["cleared"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            let store = match key_value(source, "kvClear") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            store.clear();
            outputs.insert(0, Message::Null);
        }),
    }
}

/// Any trigger message produces a coherent snapshot of the whole map.
pub(super) fn kv_dump() -> Spec {
    Spec {
        name: "kvDump",
        inputs: pins(&["trigger"]),
        outputs: pins(&["object"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            let store = match key_value(source, "kvDump") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            outputs.insert(0, Message::Object(store.dump()));
        }),
    }
}

pub(super) fn kv_delete() -> Spec {
    Spec {
        name: "kvDelete",
        inputs: pins(&["key"]),
        outputs: pins(&["removed"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            let store = match key_value(source, "kvDelete") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            let Some(key) = inputs[0].as_str() else {
                outputs.insert(0, Message::error("kvDelete requires a string key"));
                return;
            };
            match store.delete(key) {
                Some(removed) => {
                    outputs.insert(0, removed);
                }
                None => {
                    outputs.insert(
                        0,
                        Message::error(format!("kvDelete: no value for key {key:?}")),
                    );
                }
            }
        }),
    }
}

pub(super) fn value_get() -> Spec {
    Spec {
        name: "valueGet",
        inputs: pins(&["trigger"]),
        outputs: pins(&["value"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            match value(source, "valueGet") {
                Ok(store) => {
                    outputs.insert(0, store.get());
                }
                Err(err) => {
                    outputs.insert(0, err);
                }
            };
        }),
    }
}

pub(super) fn value_set() -> Spec {
    Spec {
        name: "valueSet",
        inputs: pins(&["value"]),
        outputs: pins(&["value"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            match value(source, "valueSet") {
                Ok(store) => {
                    store.set(inputs[0].clone());
                    outputs.insert(0, inputs[0].clone());
                }
                Err(err) => {
                    outputs.insert(0, err);
                }
            };
        }),
    }
}

pub(super) fn list_get() -> Spec {
    Spec {
        name: "listGet",
        inputs: pins(&["index"]),
        outputs: pins(&["item"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            let store = match list(source, "listGet") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            let i = match index(&inputs[0], "listGet") {
                Ok(i) => i,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            match store.get(i) {
                Some(item) => {
                    outputs.insert(0, item);
                }
                None => {
                    outputs.insert(0, Message::error(format!("listGet: index {i} out of range")));
                }
            }
        }),
    }
}

pub(super) fn list_set() -> Spec {
    Spec {
        name: "listSet",
        inputs: pins(&["index", "item"]),
        outputs: pins(&["item"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            let store = match list(source, "listSet") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            let i = match index(&inputs[0], "listSet") {
                Ok(i) => i,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            if store.set(i, inputs[1].clone()) {
                outputs.insert(0, inputs[1].clone());
            } else {
                outputs.insert(0, Message::error(format!("listSet: index {i} out of range")));
            }
        }),
    }
}

pub(super) fn list_shift() -> Spec {
    Spec {
        name: "listShift",
        inputs: pins(&["trigger"]),
        outputs: pins(&["item"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            let store = match list(source, "listShift") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            match store.shift() {
                Some(item) => {
                    outputs.insert(0, item);
                }
                None => {
                    outputs.insert(0, Message::error("listShift: empty list"));
                }
            }
        }),
    }
}

pub(super) fn list_append() -> Spec {
    Spec {
        name: "listAppend",
        inputs: pins(&["item"]),
        outputs: pins(&["item"]),
        kernel: sync_kernel(|inputs, outputs, _, source| {
            match list(source, "listAppend") {
                Ok(store) => {
                    store.append(inputs[0].clone());
                    outputs.insert(0, inputs[0].clone());
                }
                Err(err) => {
                    outputs.insert(0, err);
                }
            };
        }),
    }
}

pub(super) fn list_pop() -> Spec {
    Spec {
        name: "listPop",
        inputs: pins(&["trigger"]),
        outputs: pins(&["item"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            let store = match list(source, "listPop") {
                Ok(store) => store,
                Err(err) => {
                    outputs.insert(0, err);
                    return;
                }
            };
            match store.pop() {
                Some(item) => {
                    outputs.insert(0, item);
                }
                None => {
                    outputs.insert(0, Message::error("listPop: empty list"));
                }
            }
        }),
    }
}

pub(super) fn list_dump() -> Spec {
    Spec {
        name: "listDump",
        inputs: pins(&["trigger"]),
        outputs: pins(&["array"]),
        kernel: sync_kernel(|_, outputs, _, source| {
            match list(source, "listDump") {
                Ok(store) => {
                    outputs.insert(0, Message::Array(store.dump()));
                }
                Err(err) => {
                    outputs.insert(0, err);
                }
            };
        }),
    }
}
