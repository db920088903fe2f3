//! The dynamic value exchanged between blocks.
//!
//! Every route and sink carries a [`Message`]: a tagged variant over the
//! seven kinds a graph can express. Errors are ordinary messages, not
//! runtime failures, so a kernel that rejects its input simply emits an
//! error value downstream and the graph keeps flowing.

use std::collections::{BTreeMap, HashMap};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// Sparse pin-indexed map, used for kernel outputs and per-instance
/// internal state.
pub type MessageMap = HashMap<usize, Message>;

/// A dynamically typed message.
///
/// Equality is structural for every kind; two errors are equal when their
/// message strings are equal. Object keys are kept ordered so that
/// serialization and iteration are deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Message {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Message>),
    Object(BTreeMap<String, Message>),
    Error(String),
}

impl Message {
    /// Builds an error value from anything string-like.
    pub fn error(core: impl Into<String>) -> Self {
        Message::Error(core.into())
    }

    /// Human-readable name of the variant, for "expected X got Y"
    /// diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Null => "null",
            Message::Bool(_) => "boolean",
            Message::Number(_) => "number",
            Message::String(_) => "string",
            Message::Array(_) => "array",
            Message::Object(_) => "object",
            Message::Error(_) => "error",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Message::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Message::Error(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Message::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Message::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Message::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Message]> {
        match self {
            Message::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Message>> {
        match self {
            Message::Object(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for Message {
    fn from(b: bool) -> Self {
        Message::Bool(b)
    }
}

impl From<f64> for Message {
    fn from(n: f64) -> Self {
        Message::Number(n)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::String(s.to_string())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::String(s)
    }
}

impl From<Vec<Message>> for Message {
    fn from(items: Vec<Message>) -> Self {
        Message::Array(items)
    }
}

impl From<BTreeMap<String, Message>> for Message {
    fn from(fields: BTreeMap<String, Message>) -> Self {
        Message::Object(fields)
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Message::Null,
            Value::Bool(b) => Message::Bool(b),
            // Integers outside the exact f64 range round; the message
            // number kind is a double, same as the wire format.
            Value::Number(n) => Message::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Message::String(s),
            Value::Array(items) => Message::Array(items.into_iter().map(Message::from).collect()),
            Value::Object(fields) => Message::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Message::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Message::Null => serializer.serialize_unit(),
            Message::Bool(b) => serializer.serialize_bool(*b),
            Message::Number(n) => serializer.serialize_f64(*n),
            Message::String(s) => serializer.serialize_str(s),
            Message::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Message::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            // Errors cross serialization boundaries as {"core": <string>}.
            Message::Error(core) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("core", core)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    /// Deserialization never yields the error kind: an incoming
    /// `{"core": ...}` object is just an object.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Message::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_serializes_to_the_four_character_string() {
        let encoded = serde_json::to_string(&Message::Null).expect("serialize null");
        assert_eq!(encoded, "null");
    }

    #[test]
    fn error_serializes_to_core_object() {
        let encoded =
            serde_json::to_string(&Message::error("head requires an array")).expect("serialize");
        assert_eq!(encoded, r#"{"core":"head requires an array"}"#);
    }

    #[test]
    fn json_round_trip_preserves_representable_values() {
        let source = r#"{"foo":"bar","weight":2.3,"someArray":[1,2,3],"none":null,"on":true}"#;
        let first: Message = serde_json::from_str(source).expect("first parse");
        let encoded = serde_json::to_string(&first).expect("serialize");
        let second: Message = serde_json::from_str(&encoded).expect("second parse");
        assert_eq!(first, second);
    }

    #[test]
    fn parsed_object_has_expected_fields() {
        let parsed: Message =
            serde_json::from_str(r#"{"foo":"bar","weight":2.3,"someArray":[1,2,3]}"#)
                .expect("parse");
        let fields = parsed.as_object().expect("object");
        assert_eq!(fields["foo"], Message::from("bar"));
        assert_eq!(fields["weight"], Message::Number(2.3));
        assert_eq!(
            fields["someArray"],
            Message::Array(vec![
                Message::Number(1.0),
                Message::Number(2.0),
                Message::Number(3.0)
            ])
        );
    }

    #[test]
    fn equality_is_structural_for_containers_and_errors() {
        let a: Message = serde_json::from_str(r#"{"k":[1,2]}"#).expect("parse");
        let b: Message = serde_json::from_str(r#"{"k":[1,2]}"#).expect("parse");
        assert_eq!(a, b);
        assert_eq!(Message::error("boom"), Message::error("boom"));
        assert_ne!(Message::error("boom"), Message::error("bang"));
    }

    #[test]
    fn kind_names_cover_every_variant() {
        assert_eq!(Message::Null.kind(), "null");
        assert_eq!(Message::Bool(true).kind(), "boolean");
        assert_eq!(Message::Number(1.0).kind(), "number");
        assert_eq!(Message::from("x").kind(), "string");
        assert_eq!(Message::Array(Vec::new()).kind(), "array");
        assert_eq!(Message::Object(BTreeMap::new()).kind(), "object");
        assert_eq!(Message::error("x").kind(), "error");
    }
}
