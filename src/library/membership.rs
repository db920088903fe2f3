//! Membership tests over arrays, objects, and strings.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

/// Structural containment: the element matches by value, containers
/// included.
pub(super) fn in_array() -> Spec {
    Spec {
        name: "inArray",
        inputs: pins(&["element", "array"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(items) = inputs[1].as_array() else {
                outputs.insert(0, Message::error("inArray requires an array"));
                return;
            };
            outputs.insert(0, Message::Bool(items.contains(&inputs[0])));
        }),
    }
}

pub(super) fn has_field() -> Spec {
    Spec {
        name: "hasField",
        inputs: pins(&["in", "field"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(fields) = inputs[0].as_object() else {
                outputs.insert(0, Message::error("hasField requires an object"));
                return;
            };
            let Some(field) = inputs[1].as_str() else {
                outputs.insert(0, Message::error("hasField requires a string field name"));
                return;
            };
            outputs.insert(0, Message::Bool(fields.contains_key(field)));
        }),
    }
}

fn string_test(
    name: &'static str,
    needle_pin: &'static str,
    apply: fn(&str, &str) -> bool,
) -> Spec {
    Spec {
        name,
        inputs: pins(&["in", needle_pin]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(move |inputs, outputs, _, _| {
            let (Some(haystack), Some(needle)) = (inputs[0].as_str(), inputs[1].as_str()) else {
                outputs.insert(0, Message::error(format!("{name} requires strings")));
                return;
            };
            outputs.insert(0, Message::Bool(apply(haystack, needle)));
        }),
    }
}

pub(super) fn in_string() -> Spec {
    string_test("inString", "substring", |haystack, needle| {
        haystack.contains(needle)
    })
}

pub(super) fn has_prefix() -> Spec {
    string_test("hasPrefix", "prefix", |haystack, needle| {
        haystack.starts_with(needle)
    })
}

pub(super) fn has_suffix() -> Spec {
    string_test("hasSuffix", "suffix", |haystack, needle| {
        haystack.ends_with(needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::testing::evaluate_once;

    fn value(json: &str) -> Message {
        serde_json::from_str(json).expect("literal")
    }

    #[tokio::test]
    async fn in_array_matches_structurally() {
        let array = value(r#"[1,"two",{"k":3}]"#);
        for (needle, want) in [
            (value(r#"{"k":3}"#), true),
            (Message::Number(1.0), true),
            (Message::Number(9.0), false),
        ] {
            let outputs = evaluate_once(&in_array(), &[needle, array.clone()]).await;
            assert_eq!(outputs[&0], Message::Bool(want));
        }

        let bad = evaluate_once(&in_array(), &[Message::Null, Message::Null]).await;
        assert!(bad[&0].is_error());
    }

    #[tokio::test]
    async fn has_field_checks_object_keys() {
        let object = value(r#"{"foo":"bar"}"#);
        let outputs =
            evaluate_once(&has_field(), &[object.clone(), Message::from("foo")]).await;
        assert_eq!(outputs[&0], Message::Bool(true));
        let outputs = evaluate_once(&has_field(), &[object, Message::from("baz")]).await;
        assert_eq!(outputs[&0], Message::Bool(false));
    }

    #[tokio::test]
    async fn string_membership_family() {
        let cases = [
            (in_string(), "str", true),
            (in_string(), "xyz", false),
            (has_prefix(), "sub", true),
            (has_prefix(), "string", false),
            (has_suffix(), "string", true),
            (has_suffix(), "sub", false),
        ];
        for (spec, needle, want) in cases {
            let outputs =
                evaluate_once(&spec, &[Message::from("substring"), Message::from(needle)]).await;
            assert_eq!(outputs[&0], Message::Bool(want), "{} {needle}", spec.name);
        }

        let bad = evaluate_once(&in_string(), &[Message::Number(1.0), Message::from("x")]).await;
        assert!(bad[&0].is_error());
    }
}
