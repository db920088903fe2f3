//! Static description of a block kind.
//!
//! A [`Spec`] names a block, declares its pins, and carries the kernel
//! evaluated once per tick. Specs are immutable and shared by every
//! instance of the kind, so the kernel is stored behind an `Arc`.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::block::Interrupt;
use crate::message::{Message, MessageMap};
use crate::store::Source;

/// A named pin. Pins are positional; the index is the identity and the
/// name exists for display.
#[derive(Debug, Clone, Copy)]
pub struct Pin {
    pub name: &'static str,
}

/// Builds a pin list from names.
pub fn pins(names: &[&'static str]) -> Vec<Pin> {
    names.iter().map(|name| Pin { name }).collect()
}

/// Everything a kernel may touch during one tick.
///
/// `inputs` holds exactly one value per input pin, drawn before the
/// kernel started. `outputs` starts empty; pins left unset emit nothing
/// this tick. `internal` persists across ticks for the lifetime of the
/// block instance. A kernel that blocks (timer, network) must select on
/// `control` and return any interrupt it observes so the serve loop can
/// apply it.
pub struct KernelIo<'a> {
    pub inputs: &'a [Message],
    pub outputs: &'a mut MessageMap,
    pub internal: &'a mut MessageMap,
    pub source: Option<&'a Source>,
    pub control: &'a mut mpsc::Receiver<Interrupt>,
}

/// Object-safe interface of a per-tick evaluation function.
pub trait KernelFn: Send + Sync {
    fn call<'a>(&'a self, io: KernelIo<'a>) -> BoxFuture<'a, Option<Interrupt>>;
}

/// The kernel of a block kind, shared by all of its instances.
pub type Kernel = Arc<dyn KernelFn>;

struct SyncKernel<F>(F);

impl<F> KernelFn for SyncKernel<F>
where
    F: Fn(&[Message], &mut MessageMap, &mut MessageMap, Option<&Source>) + Send + Sync,
{
    fn call<'a>(&'a self, io: KernelIo<'a>) -> BoxFuture<'a, Option<Interrupt>> {
        (self.0)(io.inputs, io.outputs, io.internal, io.source);
        Box::pin(std::future::ready(None::<Interrupt>))
    }
}

/// Wraps a non-blocking kernel body.
///
/// Most library kernels finish without suspending; this adapter runs the
/// body and resolves immediately, so only kernels that genuinely wait
/// (timers, network, stream pulls) deal with futures and interrupts
/// directly.
pub fn sync_kernel<F>(body: F) -> Kernel
where
    F: Fn(&[Message], &mut MessageMap, &mut MessageMap, Option<&Source>)
        + Send
        + Sync
        + 'static,
{
    Arc::new(SyncKernel(body))
}

struct AsyncKernel<F>(F);

impl<F> KernelFn for AsyncKernel<F>
where
    F: for<'a> Fn(KernelIo<'a>) -> BoxFuture<'a, Option<Interrupt>> + Send + Sync,
{
    fn call<'a>(&'a self, io: KernelIo<'a>) -> BoxFuture<'a, Option<Interrupt>> {
        (self.0)(io)
    }
}

/// Wraps a kernel that suspends mid-tick and therefore handles the
/// interrupt channel itself. Usually fed a plain `fn` item returning a
/// boxed future.
pub fn async_kernel<F>(body: F) -> Kernel
where
    F: for<'a> Fn(KernelIo<'a>) -> BoxFuture<'a, Option<Interrupt>> + Send + Sync + 'static,
{
    Arc::new(AsyncKernel(body))
}

/// The static declaration of a block kind.
pub struct Spec {
    pub name: &'static str,
    pub inputs: Vec<Pin>,
    pub outputs: Vec<Pin>,
    pub kernel: Kernel,
}

impl Spec {
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}
