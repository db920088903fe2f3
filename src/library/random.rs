//! Random sources.
//!
//! `uniform` has no inputs and behaves as a pressure source, emitting as
//! fast as its subscribers accept. The parameterized sources draw one
//! sample per tick from their distribution; latching the parameter pins
//! turns them into pressure sources too.

use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use rand_distr::{Normal, Poisson, Zipf};

use crate::message::Message;
use crate::spec::{pins, sync_kernel, Spec};

pub(super) fn uniform() -> Spec {
    Spec {
        name: "uniform",
        inputs: pins(&[]),
        outputs: pins(&["sample"]),
        kernel: sync_kernel(|_, outputs, _, _| {
            outputs.insert(0, Message::Number(rand::thread_rng().gen::<f64>()));
        }),
    }
}

pub(super) fn normal() -> Spec {
    Spec {
        name: "normal",
        inputs: pins(&["mean", "stdDev"]),
        outputs: pins(&["sample"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let (Some(mean), Some(std_dev)) = (inputs[0].as_number(), inputs[1].as_number())
            else {
                outputs.insert(0, Message::error("normal requires numbers"));
                return;
            };
            match Normal::new(mean, std_dev) {
                Ok(dist) => {
                    outputs.insert(0, Message::Number(dist.sample(&mut rand::thread_rng())));
                }
                Err(err) => {
                    outputs.insert(0, Message::error(format!("normal: {err}")));
                }
            }
        }),
    }
}

pub(super) fn zipf() -> Spec {
    Spec {
        name: "zipf",
        inputs: pins(&["n", "s"]),
        outputs: pins(&["sample"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let (Some(n), Some(s)) = (inputs[0].as_number(), inputs[1].as_number()) else {
                outputs.insert(0, Message::error("zipf requires numbers"));
                return;
            };
            if !n.is_finite() || n < 1.0 {
                outputs.insert(0, Message::error(format!("zipf: invalid element count {n}")));
                return;
            }
            match Zipf::new(n as u64, s) {
                Ok(dist) => {
                    outputs.insert(0, Message::Number(dist.sample(&mut rand::thread_rng())));
                }
                Err(err) => {
                    outputs.insert(0, Message::error(format!("zipf: {err}")));
                }
            }
        }),
    }
}

pub(super) fn poisson() -> Spec {
    Spec {
        name: "poisson",
        inputs: pins(&["rate"]),
        outputs: pins(&["sample"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(rate) = inputs[0].as_number() else {
                outputs.insert(0, Message::error("poisson requires a number"));
                return;
            };
            match Poisson::new(rate) {
                Ok(dist) => {
                    outputs.insert(0, Message::Number(dist.sample(&mut rand::thread_rng())));
                }
                Err(err) => {
                    outputs.insert(0, Message::error(format!("poisson: {err}")));
                }
            }
        }),
    }
}

pub(super) fn bernoulli() -> Spec {
    Spec {
        name: "bernoulli",
        inputs: pins(&["p"]),
        outputs: pins(&["sample"]),
        kernel: sync_kernel(|inputs, outputs, _, _| {
            let Some(p) = inputs[0].as_number() else {
                outputs.insert(0, Message::error("bernoulli requires a number"));
                return;
            };
            match Bernoulli::new(p) {
                Ok(dist) => {
                    outputs.insert(0, Message::Bool(dist.sample(&mut rand::thread_rng())));
                }
                Err(err) => {
                    outputs.insert(0, Message::error(format!("bernoulli: {err}")));
                }
            }
        }),
    }
}
