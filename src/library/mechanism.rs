//! Flow mechanisms: passing, gating, delaying, and structural edits.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tracing::warn;

use crate::block::Interrupt;
use crate::message::Message;
use crate::spec::{async_kernel, pins, sync_kernel, KernelIo, Spec};
use crate::store::Source;

// Internal-state slot used by `first`.
const SEEN: usize = 0;

/// Emits the passthrough message after the parsed duration. An interrupt
/// that lands mid-sleep wins the race and is handed back to the loop.
pub(super) fn delay() -> Spec {
    fn kernel(io: KernelIo<'_>) -> BoxFuture<'_, Option<Interrupt>> {
        Box::pin(async move {
            let Some(text) = io.inputs[1].as_str() else {
                io.outputs
                    .insert(0, Message::error("delay requires a duration string"));
                return None;
            };
            let duration = match humantime::parse_duration(text) {
                Ok(duration) => duration,
                Err(err) => {
                    io.outputs.insert(0, Message::error(format!("delay: {err}")));
                    return None;
                }
            };
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    io.outputs.insert(0, io.inputs[0].clone());
                    None
                }
                interrupt = io.control.recv() => interrupt.or(Some(Interrupt::Stop)),
            }
        })
    }
    Spec {
        name: "delay",
        inputs: pins(&["passthrough", "duration"]),
        outputs: pins(&["passthrough"]),
        kernel: async_kernel(kernel),
    }
}

/// Builds a one-entry object from a key and a value.
pub(super) fn set() -> Spec {
    Spec {
        name: "set",
        inputs: pins(&["key", "value"]),
        outputs: pins(&["object"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(key) = inputs[0].as_str() else {
                outputs.insert(0, Message::error("set requires a string key"));
                return;
            };
            let mut object = BTreeMap::new();
            object.insert(key.to_string(), inputs[1].clone());
            outputs.insert(0, Message::Object(object));
        }),
    }
}

/// Writes the inbound message to stdout in its canonical JSON form.
pub(super) fn log() -> Spec {
    Spec {
        name: "log",
        inputs: pins(&["log"]),
        outputs: pins(&[]),
        kernel: sync_kernel(|inputs, _, _, _| match serde_json::to_string(&inputs[0]) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "log block could not encode message"),
        }),
    }
}

/// Discards the inbound message.
pub(super) fn sink() -> Spec {
    Spec {
        name: "sink",
        inputs: pins(&["in"]),
        outputs: pins(&[]),
        kernel: sync_kernel(|_, _, _, _| {}),
    }
}

/// Routes the inbound message to output 0 when ctrl is true and output 1
/// when false.
pub(super) fn latch() -> Spec {
    Spec {
        name: "latch",
        inputs: pins(&["in", "ctrl"]),
        outputs: pins(&["out", "out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| match inputs[1].as_bool() {
            Some(true) => {
                outputs.insert(0, inputs[0].clone());
            }
            Some(false) => {
                outputs.insert(1, inputs[0].clone());
            }
            None => {
                outputs.insert(0, Message::error("latch ctrl requires a boolean"));
            }
        }),
    }
}

/// Emits the inbound message once a trigger arrives on ctrl.
pub(super) fn gate() -> Spec {
    Spec {
        name: "gate",
        inputs: pins(&["in", "ctrl"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            outputs.insert(0, inputs[0].clone());
        }),
    }
}

/// Emits the inbound message immediately.
pub(super) fn identity() -> Spec {
    Spec {
        name: "identity",
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            outputs.insert(0, inputs[0].clone());
        }),
    }
}

/// Appends the element to the array.
pub(super) fn append() -> Spec {
    Spec {
        name: "append",
        inputs: pins(&["element", "array"]),
        outputs: pins(&["array"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(items) = inputs[1].as_array() else {
                outputs.insert(0, Message::error("append requires an array"));
                return;
            };
            let mut items = items.to_vec();
            items.push(inputs[0].clone());
            outputs.insert(0, Message::Array(items));
        }),
    }
}

/// Emits the first element on output 0 and the rest of the array on
/// output 1.
pub(super) fn head() -> Spec {
    Spec {
        name: "head",
        inputs: pins(&["in"]),
        outputs: pins(&["head", "tail"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(items) = inputs[0].as_array() else {
                outputs.insert(0, Message::error("head requires an array"));
                return;
            };
            let Some((first, rest)) = items.split_first() else {
                outputs.insert(0, Message::error("head of an empty array"));
                return;
            };
            outputs.insert(0, first.clone());
            outputs.insert(1, Message::Array(rest.to_vec()));
        }),
    }
}

/// Emits the last element on output 0 and the prefix of the array on
/// output 1.
pub(super) fn tail() -> Spec {
    Spec {
        name: "tail",
        inputs: pins(&["in"]),
        outputs: pins(&["tail", "head"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(items) = inputs[0].as_array() else {
                outputs.insert(0, Message::error("tail requires an array"));
                return;
            };
            let Some((last, rest)) = items.split_last() else {
                outputs.insert(0, Message::error("tail of an empty array"));
                return;
            };
            outputs.insert(0, last.clone());
            outputs.insert(1, Message::Array(rest.to_vec()));
        }),
    }
}

/// Zero-input pressure source: emits null as fast as subscribers accept.
pub(super) fn pusher() -> Spec {
    Spec {
        name: "pusher",
        inputs: pins(&[]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|_, outputs, _, _| {
            outputs.insert(0, Message::Null);
        }),
    }
}

/// Emits true on the first tick of the instance and false afterwards.
/// Reset restores the first-tick behavior.
pub(super) fn first() -> Spec {
    Spec {
        name: "first",
        inputs: pins(&["in"]),
        outputs: pins(&["first"]),
        kernel: sync_kernel(|_, outputs, internal, _| {
            let seen = internal.contains_key(&SEEN);
            if !seen {
                internal.insert(SEEN, Message::Bool(true));
            }
            outputs.insert(0, Message::Bool(!seen));
        }),
    }
}

/// Unions two objects; keys from input 0 win on collision.
pub(super) fn merge() -> Spec {
    Spec {
        name: "merge",
        inputs: pins(&["a", "b"]),
        outputs: pins(&["merged"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let (Some(a), Some(b)) = (inputs[0].as_object(), inputs[1].as_object()) else {
                outputs.insert(0, Message::error("merge requires objects"));
                return;
            };
            let mut merged = b.clone();
            merged.extend(a.iter().map(|(key, value)| (key.clone(), value.clone())));
            outputs.insert(0, Message::Object(merged));
        }),
    }
}

/// Pulls the next message from an attached stream source.
pub(super) fn receive() -> Spec {
    fn kernel(io: KernelIo<'_>) -> BoxFuture<'_, Option<Interrupt>> {
        Box::pin(async move {
            let Some(Source::Stream(stream)) = io.source else {
                io.outputs
                    .insert(0, Message::error("receive requires a stream source"));
                return None;
            };
            tokio::select! {
                message = stream.pull() => {
                    match message {
                        Some(message) => {
                            io.outputs.insert(0, message);
                        }
                        None => {
                            io.outputs.insert(0, Message::error("receive: stream closed"));
                        }
                    }
                    None
                }
                interrupt = io.control.recv() => interrupt.or(Some(Interrupt::Stop)),
            }
        })
    }
    Spec {
        name: "receive",
        inputs: pins(&[]),
        outputs: pins(&["out"]),
        kernel: async_kernel(kernel),
    }
}
