//! Type probes and coercions over the dynamic message kinds.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

fn probe(name: &'static str, test: fn(&Message) -> bool) -> Spec {
    Spec {
        name,
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(move |inputs, outputs, _, _| {
            outputs.insert(0, Message::Bool(test(&inputs[0])));
        }),
    }
}

pub(super) fn is_boolean() -> Spec {
    probe("isBoolean", |m| matches!(m, Message::Bool(_)))
}

pub(super) fn is_number() -> Spec {
    probe("isNumber", |m| matches!(m, Message::Number(_)))
}

pub(super) fn is_string() -> Spec {
    probe("isString", |m| matches!(m, Message::String(_)))
}

pub(super) fn is_array() -> Spec {
    probe("isArray", |m| matches!(m, Message::Array(_)))
}

pub(super) fn is_object() -> Spec {
    probe("isObject", |m| matches!(m, Message::Object(_)))
}

pub(super) fn is_error() -> Spec {
    probe("isError", Message::is_error)
}

/// Strings pass through; numbers, booleans and null format themselves;
/// containers and errors render as canonical JSON.
pub(super) fn to_string() -> Spec {
    Spec {
        name: "toString",
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let text = match &inputs[0] {
                Message::String(s) => s.clone(),
                Message::Number(n) => n.to_string(),
                Message::Bool(b) => b.to_string(),
                Message::Null => "null".to_string(),
                other => match serde_json::to_string(other) {
                    Ok(text) => text,
                    Err(err) => {
                        outputs.insert(0, Message::error(format!("toString: {err}")));
                        return;
                    }
                },
            };
            outputs.insert(0, Message::String(text));
        }),
    }
}

/// Numbers pass through; strings parse; booleans coerce to 1 and 0.
pub(super) fn to_number() -> Spec {
    Spec {
        name: "toNumber",
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let n = match &inputs[0] {
                Message::Number(n) => *n,
                Message::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                Message::String(s) => match s.trim().parse::<f64>() {
                    Ok(n) => n,
                    Err(_) => {
                        outputs.insert(
                            0,
                            Message::error(format!("toNumber: cannot parse {s:?} as a number")),
                        );
                        return;
                    }
                },
                other => {
                    outputs.insert(
                        0,
                        Message::error(format!("toNumber: cannot coerce {}", other.kind())),
                    );
                    return;
                }
            };
            outputs.insert(0, Message::Number(n));
        }),
    }
}
