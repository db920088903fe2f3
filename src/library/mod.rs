//! Process-wide catalog of built-in block specs.
//!
//! Every block kind the runtime ships is registered here by name. The
//! catalog groups kernels by concern; the registry itself is built once
//! and shared for the lifetime of the process.

mod assertions;
mod logic;
mod math;
mod mechanism;
mod membership;
mod net;
mod parse;
mod random;
mod stores;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::spec::Spec;

/// Name-indexed registry of block specs.
pub struct Library {
    specs: HashMap<&'static str, Arc<Spec>>,
}

impl Library {
    fn build() -> Self {
        let mut specs = HashMap::new();
        for spec in catalog() {
            let previous = specs.insert(spec.name, Arc::new(spec));
            assert!(previous.is_none(), "duplicate spec name");
        }
        Self { specs }
    }

    /// Looks up a spec by name; the returned `Arc` is shared by every
    /// block instance of the kind.
    pub fn get(&self, name: &str) -> Option<Arc<Spec>> {
        self.specs.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// The process-wide registry.
pub fn library() -> &'static Library {
    static LIBRARY: LazyLock<Library> = LazyLock::new(Library::build);
    &LIBRARY
}

fn catalog() -> Vec<Spec> {
    vec![
        // mechanisms
        mechanism::delay(),
        mechanism::set(),
        mechanism::log(),
        mechanism::sink(),
        mechanism::latch(),
        mechanism::gate(),
        mechanism::identity(),
        mechanism::append(),
        mechanism::tail(),
        mechanism::head(),
        mechanism::pusher(),
        mechanism::first(),
        mechanism::merge(),
        // monads
        math::exp(),
        math::log10(),
        math::ln(),
        math::sqrt(),
        math::sin(),
        math::cos(),
        math::tan(),
        // dyads
        math::addition(),
        math::subtraction(),
        math::multiplication(),
        math::division(),
        math::exponentiation(),
        math::modulation(),
        math::greater_than(),
        math::less_than(),
        math::equal_to(),
        math::not_equal_to(),
        // random sources
        random::uniform(),
        random::normal(),
        random::zipf(),
        random::poisson(),
        random::bernoulli(),
        // membership
        membership::in_array(),
        membership::has_field(),
        membership::in_string(),
        membership::has_prefix(),
        membership::has_suffix(),
        // key/value store access
        stores::kv_get(),
        stores::kv_set(),
        stores::kv_clear(),
        stores::kv_dump(),
        stores::kv_delete(),
        // parsers
        parse::parse_json(),
        // stream
        mechanism::receive(),
        // primitive value store access
        stores::value_get(),
        stores::value_set(),
        // list store access
        stores::list_get(),
        stores::list_set(),
        stores::list_shift(),
        stores::list_append(),
        stores::list_pop(),
        stores::list_dump(),
        // network IO
        net::get(),
        // assertions and coercions
        assertions::is_boolean(),
        assertions::is_number(),
        assertions::is_string(),
        assertions::is_array(),
        assertions::is_object(),
        assertions::is_error(),
        assertions::to_string(),
        assertions::to_number(),
        // logic
        logic::and(),
        logic::or(),
        logic::not(),
    ]
}
