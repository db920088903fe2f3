//! Parsers from wire formats into messages.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

/// Parses a JSON string into a message; the parser error travels
/// downstream as an error value.
pub(super) fn parse_json() -> Spec {
    Spec {
        name: "parseJSON",
        inputs: pins(&["in"]),
        outputs: pins(&["out"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(text) = inputs[0].as_str() else {
                outputs.insert(0, Message::error("parseJSON requires a string"));
                return;
            };
            match serde_json::from_str::<Message>(text) {
                Ok(parsed) => {
                    outputs.insert(0, parsed);
                }
                Err(err) => {
                    outputs.insert(0, Message::error(format!("parseJSON: {err}")));
                }
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::testing::evaluate_once;

    #[tokio::test]
    async fn well_formed_json_parses_into_a_message() {
        let outputs = evaluate_once(
            &parse_json(),
            &[Message::from(r#"{"foo":"bar", "weight":2.3, "someArray":[1,2,3]}"#)],
        )
        .await;
        let fields = outputs[&0].as_object().expect("object");
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

    #[tokio::test]
    async fn malformed_json_and_non_strings_emit_errors() {
        let outputs = evaluate_once(
            &parse_json(),
            &[Message::from(r#"{"foo":bar, "weight":2.3}"#)],
        )
        .await;
        assert!(outputs[&0].is_error());

        let outputs = evaluate_once(&parse_json(), &[Message::Number(2.0)]).await;
        assert!(outputs[&0].is_error());
    }
}
