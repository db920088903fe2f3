//! Boolean connectives.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

fn connective(name: &'static str, apply: fn(bool, bool) -> bool) -> Spec {
    Spec {
        name,
        inputs: pins(&["value", "value"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(move |inputs, outputs, _, _| {
            let (Some(a), Some(b)) = (inputs[0].as_bool(), inputs[1].as_bool()) else {
                outputs.insert(0, Message::error(format!("{name} requires booleans")));
                return;
            };
            outputs.insert(0, Message::Bool(apply(a, b)));
        }),
    }
}

pub(super) fn and() -> Spec {
    connective("and", |a, b| a && b)
}

pub(super) fn or() -> Spec {
    connective("or", |a, b| a || b)
}

pub(super) fn not() -> Spec {
    Spec {
        name: "not",
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(a) = inputs[0].as_bool() else {
                outputs.insert(0, Message::error("not requires a boolean"));
                return;
            };
            outputs.insert(0, Message::Bool(!a));
        }),
    }
}
