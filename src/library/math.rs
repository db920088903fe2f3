//! Arithmetic kernels: monadic functions, dyadic operators, comparisons.
//!
//! Numeric edges follow IEEE-754: division by zero yields an infinity or
//! NaN rather than an error value.

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

fn monad(
    name: &'static str,
    input: &'static str,
    output: &'static str,
    apply: fn(f64) -> f64,
) -> Spec {
    Spec {
        name,
        inputs: pins(&[input]),
        outputs: pins(&[output]),
        kernel: sync_kernel(move |inputs, outputs, _, _| {
            let Some(x) = inputs[0].as_number() else {
                outputs.insert(0, Message::error(format!("{name} requires a number")));
                return;
            };
            outputs.insert(0, Message::Number(apply(x)));
        }),
    }
}

fn dyad(
    name: &'static str,
    input_names: [&'static str; 2],
    output: &'static str,
    apply: fn(f64, f64) -> Message,
) -> Spec {
    Spec {
        name,
        inputs: pins(&input_names),
        outputs: pins(&[output]),
        kernel: sync_kernel(move |inputs, outputs, _, _| {
            let (Some(a), Some(b)) = (inputs[0].as_number(), inputs[1].as_number()) else {
                outputs.insert(0, Message::error(format!("{name} requires numbers")));
                return;
            };
            outputs.insert(0, apply(a, b));
        }),
    }
}

pub(super) fn exp() -> Spec {
    monad("exp", "exponent", "power", f64::exp)
}

pub(super) fn log10() -> Spec {
    monad("log10", "value", "logarithm", f64::log10)
}

pub(super) fn ln() -> Spec {
    monad("ln", "value", "logarithm", f64::ln)
}

pub(super) fn sqrt() -> Spec {
    monad("sqrt", "value", "root", f64::sqrt)
}

pub(super) fn sin() -> Spec {
    monad("sin", "angle", "sine", f64::sin)
}

pub(super) fn cos() -> Spec {
    monad("cos", "angle", "cosine", f64::cos)
}

pub(super) fn tan() -> Spec {
    monad("tan", "angle", "tangent", f64::tan)
}

pub(super) fn addition() -> Spec {
    dyad("+", ["addend", "addend"], "sum", |a, b| {
        Message::Number(a + b)
    })
}

pub(super) fn subtraction() -> Spec {
    dyad("-", ["minuend", "subtrahend"], "difference", |a, b| {
        Message::Number(a - b)
    })
}

pub(super) fn multiplication() -> Spec {
    dyad("×", ["multiplicand", "multiplicand"], "product", |a, b| {
        Message::Number(a * b)
    })
}

pub(super) fn division() -> Spec {
    dyad("÷", ["dividend", "divisor"], "quotient", |a, b| {
        Message::Number(a / b)
    })
}

pub(super) fn exponentiation() -> Spec {
    dyad("^", ["base", "exponent"], "power", |a, b| {
        Message::Number(a.powf(b))
    })
}

pub(super) fn modulation() -> Spec {
    dyad("mod", ["dividend", "divisor"], "remainder", |a, b| {
        Message::Number(a % b)
    })
}

pub(super) fn greater_than() -> Spec {
    dyad(">", ["value", "value"], "isGreaterThan", |a, b| {
        Message::Bool(a > b)
    })
}

pub(super) fn less_than() -> Spec {
    dyad("<", ["value", "value"], "isLessThan", |a, b| {
        Message::Bool(a < b)
    })
}

/// Structural equality over any message kinds, containers included.
pub(super) fn equal_to() -> Spec {
    Spec {
        name: "==",
        inputs: pins(&["value", "value"]),
        outputs: pins(&["isEqualTo"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            outputs.insert(0, Message::Bool(inputs[0] == inputs[1]));
        }),
    }
}

pub(super) fn not_equal_to() -> Spec {
    Spec {
        name: "!=",
        inputs: pins(&["value", "value"]),
        outputs: pins(&["isNotEqualTo"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            outputs.insert(0, Message::Bool(inputs[0] != inputs[1]));
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::testing::evaluate_once;

    const SAMPLES: &[f64] = &[-7.5, -1.0, 0.0, 0.25, 1.0, 3.0, 1e6];

    async fn number(spec: &Spec, a: f64, b: f64) -> f64 {
        let outputs = evaluate_once(spec, &[Message::Number(a), Message::Number(b)]).await;
        outputs[&0].as_number().expect("numeric output")
    }

    #[tokio::test]
    async fn addition_and_multiplication_are_commutative() {
        let add = addition();
        let mul = multiplication();
        for &a in SAMPLES {
            for &b in SAMPLES {
                assert_eq!(number(&add, a, b).await, number(&add, b, a).await);
                assert_eq!(number(&mul, a, b).await, number(&mul, b, a).await);
            }
        }
    }

    #[tokio::test]
    async fn subtraction_of_self_is_zero_and_unit_division_is_identity() {
        let sub = subtraction();
        let div = division();
        for &a in SAMPLES {
            assert_eq!(number(&sub, a, a).await, 0.0);
            assert_eq!(number(&div, a, 1.0).await, a);
        }
    }

    #[tokio::test]
    async fn division_by_zero_follows_ieee754() {
        let div = division();
        assert_eq!(number(&div, 1.0, 0.0).await, f64::INFINITY);
        assert_eq!(number(&div, -1.0, 0.0).await, f64::NEG_INFINITY);
        assert!(number(&div, 0.0, 0.0).await.is_nan());
    }

    #[tokio::test]
    async fn modulation_matches_the_truncated_remainder() {
        assert_eq!(number(&modulation(), 7.0, 3.0).await, 1.0);
        assert_eq!(number(&modulation(), -7.0, 3.0).await, -1.0);
    }

    #[tokio::test]
    async fn exponentiation_raises_the_base() {
        assert_eq!(number(&exponentiation(), 2.0, 10.0).await, 1024.0);
    }

    #[tokio::test]
    async fn monads_apply_their_function() {
        let outputs = evaluate_once(&sqrt(), &[Message::Number(9.0)]).await;
        assert_eq!(outputs[&0], Message::Number(3.0));

        let outputs = evaluate_once(&ln(), &[Message::Number(-1.0)]).await;
        assert!(outputs[&0].as_number().expect("number").is_nan());

        let outputs = evaluate_once(&sin(), &[Message::Number(0.0)]).await;
        assert_eq!(outputs[&0], Message::Number(0.0));
    }

    #[tokio::test]
    async fn non_numbers_emit_a_type_error() {
        let outputs =
            evaluate_once(&addition(), &[Message::from("one"), Message::Number(2.0)]).await;
        assert!(outputs[&0].is_error());

        let outputs = evaluate_once(&sqrt(), &[Message::Bool(true)]).await;
        assert!(outputs[&0].is_error());
    }

    #[tokio::test]
    async fn comparisons_order_numbers() {
        let outputs =
            evaluate_once(&greater_than(), &[Message::Number(2.0), Message::Number(1.0)]).await;
        assert_eq!(outputs[&0], Message::Bool(true));

        let outputs =
            evaluate_once(&less_than(), &[Message::Number(2.0), Message::Number(1.0)]).await;
        assert_eq!(outputs[&0], Message::Bool(false));
    }

    #[tokio::test]
    async fn equality_is_structural_even_for_containers() {
        let a: Message = serde_json::from_str(r#"{"k":[1,2]}"#).expect("parse");
        let b: Message = serde_json::from_str(r#"{"k":[1,2]}"#).expect("parse");

        let outputs = evaluate_once(&equal_to(), &[a.clone(), b.clone()]).await;
        assert_eq!(outputs[&0], Message::Bool(true));

        let outputs = evaluate_once(&not_equal_to(), &[a, b]).await;
        assert_eq!(outputs[&0], Message::Bool(false));

        let outputs =
            evaluate_once(&equal_to(), &[Message::error("boom"), Message::error("boom")]).await;
        assert_eq!(outputs[&0], Message::Bool(true));
    }
}
