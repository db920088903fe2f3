//! Composable dataflow blocks for a graph runtime that is wired together
//! while it runs.
//!
//! A *block* is a small unit of computation with positional input and
//! output pins. Blocks run independently, each on its own serve loop, and
//! exchange dynamically typed [`Message`] values over point-to-point
//! channels. Each module focuses on a concrete responsibility:
//!
//! - [`message`] defines the dynamic value carried on every route and
//!   sink, including its JSON wire mapping.
//! - [`spec`] declares what a block kind looks like: named pins plus the
//!   kernel evaluated once per tick.
//! - [`block`] drives a spec: routes, subscriber sinks, latched literals,
//!   and the control interrupts that reconfigure a running block.
//! - [`store`] holds the shared collaborators (key/value, list, single
//!   value, stream) that blocks attach to as sources.
//! - [`library`] is the process-wide catalog of built-in specs.
//!
//! Integration tests exercise full graphs through the public handle; unit
//! tests in each module pin down kernel and store semantics.

pub mod block;
pub mod library;
pub mod message;
pub mod spec;
pub mod store;

pub use block::{Block, Interrupt, Sink};
pub use library::{library, Library};
pub use message::{Message, MessageMap};
pub use spec::{async_kernel, sync_kernel, Kernel, KernelFn, KernelIo, Pin, Spec};
pub use store::{KeyValueStore, ListStore, Source, StreamStore, ValueStore};
