//! The block runtime: one serve loop per block instance.
//!
//! A [`Block`] is the public handle; the serve loop itself runs on its
//! own tokio task and exclusively owns the route table, the sink lists,
//! the internal-state map, and the attached source. Everything the
//! outside world does to a running block (wiring, literal pins, source
//! swaps, reset, stop) travels through one control channel as an
//! [`Interrupt`] and takes effect between ticks, never during a kernel
//! evaluation.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::message::{Message, MessageMap};
use crate::spec::{KernelIo, Spec};
use crate::store::Source;

/// A subscriber endpoint on an output pin.
pub type Sink = mpsc::Sender<Message>;

// Capacity 1 is the closest tokio analogue of a rendezvous channel: a
// producer can run at most one message ahead of the consumer, so
// back-pressure propagates through the graph.
const ROUTE_CAPACITY: usize = 1;
const CONTROL_CAPACITY: usize = 16;

/// A control message directed at a block's serve loop.
#[derive(Debug, Clone)]
pub enum Interrupt {
    Stop,
    Reset,
    SetLiteral { pin: usize, value: Message },
    ClearLiteral { pin: usize },
    Connect { pin: usize, sink: Sink },
    Disconnect { pin: usize, sink: Sink },
    SetSource(Option<Source>),
}

/// Handle to one block instance.
///
/// The handle is cheap to share behind an `Arc` and every method is safe
/// to call while the block serves. Pin indices are checked here,
/// synchronously, against the spec; a bad index never reaches the serve
/// loop.
pub struct Block {
    spec: Arc<Spec>,
    inputs: Vec<mpsc::Sender<Message>>,
    control: mpsc::Sender<Interrupt>,
    worker: Mutex<Option<Worker>>,
    serving: Mutex<Option<JoinHandle<()>>>,
}

impl Block {
    /// Allocates routes and sink tables sized to the spec. The block does
    /// nothing until [`serve`](Self::serve) is called.
    pub fn new(spec: Arc<Spec>) -> Self {
        let mut inputs = Vec::with_capacity(spec.input_count());
        let mut routes = Vec::with_capacity(spec.input_count());
        for _ in &spec.inputs {
            let (tx, rx) = mpsc::channel(ROUTE_CAPACITY);
            inputs.push(tx);
            routes.push(Route { rx, literal: None });
        }
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let worker = Worker {
            spec: Arc::clone(&spec),
            routes,
            sinks: vec![Vec::new(); spec.output_count()],
            internal: MessageMap::new(),
            source: None,
            control: control_rx,
        };
        Self {
            spec,
            inputs,
            control: control_tx,
            worker: Mutex::new(Some(worker)),
            serving: Mutex::new(None),
        }
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Starts the serve loop on its own task.
    pub fn serve(&self) -> Result<()> {
        let worker = self.worker.lock().unwrap().take();
        let Some(worker) = worker else {
            bail!("block '{}' is already serving", self.spec.name);
        };
        let handle = tokio::spawn(worker.run());
        *self.serving.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Delivers a stop interrupt and waits for the serve loop to exit.
    pub async fn stop(&self) {
        let _ = self.control.send(Interrupt::Stop).await;
        let handle = self.serving.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Registers a sink on an output pin. Takes effect between ticks.
    pub async fn connect(&self, out_idx: usize, sink: Sink) -> Result<()> {
        self.check_output(out_idx)?;
        self.interrupt(Interrupt::Connect { pin: out_idx, sink }).await
    }

    /// Removes a sink from an output pin. Identity is the channel itself:
    /// pass a clone of the sender that was connected.
    pub async fn disconnect(&self, out_idx: usize, sink: Sink) -> Result<()> {
        self.check_output(out_idx)?;
        self.interrupt(Interrupt::Disconnect { pin: out_idx, sink }).await
    }

    /// The producer endpoint of an input route. Values sent here feed the
    /// pin one message per tick, in FIFO order.
    pub fn input(&self, in_idx: usize) -> Result<mpsc::Sender<Message>> {
        self.check_input(in_idx)?;
        Ok(self.inputs[in_idx].clone())
    }

    /// Latches a literal onto an input route; every subsequent tick reads
    /// this value instead of waiting on the channel.
    pub async fn set_input(&self, in_idx: usize, literal: Message) -> Result<()> {
        self.check_input(in_idx)?;
        self.interrupt(Interrupt::SetLiteral {
            pin: in_idx,
            value: literal,
        })
        .await
    }

    /// Detaches a latched literal; the route waits on its channel again.
    pub async fn clear_input(&self, in_idx: usize) -> Result<()> {
        self.check_input(in_idx)?;
        self.interrupt(Interrupt::ClearLiteral { pin: in_idx }).await
    }

    /// Attaches or replaces the shared-store source.
    pub async fn set_source(&self, source: Source) -> Result<()> {
        self.interrupt(Interrupt::SetSource(Some(source))).await
    }

    pub async fn clear_source(&self) -> Result<()> {
        self.interrupt(Interrupt::SetSource(None)).await
    }

    /// Clears the internal-state map between ticks.
    pub async fn reset(&self) -> Result<()> {
        self.interrupt(Interrupt::Reset).await
    }

    async fn interrupt(&self, interrupt: Interrupt) -> Result<()> {
        if self.control.send(interrupt).await.is_err() {
            bail!("block '{}' is no longer serving", self.spec.name);
        }
        Ok(())
    }

    fn check_input(&self, idx: usize) -> Result<()> {
        if idx >= self.spec.input_count() {
            bail!("block '{}' has no input pin {}", self.spec.name, idx);
        }
        Ok(())
    }

    fn check_output(&self, idx: usize) -> Result<()> {
        if idx >= self.spec.output_count() {
            bail!("block '{}' has no output pin {}", self.spec.name, idx);
        }
        Ok(())
    }
}

/// Per-input runtime state: the delivery channel plus an optional latched
/// literal that shadows it.
struct Route {
    rx: mpsc::Receiver<Message>,
    literal: Option<Message>,
}

/// Whether the serve loop keeps going after handling an event.
enum Flow {
    Continue,
    Exit,
}

enum GatherEvent {
    Value(usize, Message),
    RouteClosed(usize),
    Interrupt(Option<Interrupt>),
}

enum SendOutcome {
    Sent,
    SinkClosed,
    Disconnected,
    Exit,
}

/// The serve-loop state, owned by exactly one task.
struct Worker {
    spec: Arc<Spec>,
    routes: Vec<Route>,
    sinks: Vec<Vec<Sink>>,
    internal: MessageMap,
    source: Option<Source>,
    control: mpsc::Receiver<Interrupt>,
}

impl Worker {
    async fn run(mut self) {
        debug!(block = self.spec.name, "serve loop started");
        loop {
            let Some(snapshot) = self.gather().await else {
                break;
            };

            let mut outputs = MessageMap::new();
            let kernel = Arc::clone(&self.spec.kernel);
            let interrupt = {
                let io = KernelIo {
                    inputs: &snapshot,
                    outputs: &mut outputs,
                    internal: &mut self.internal,
                    source: self.source.as_ref(),
                    control: &mut self.control,
                };
                kernel.call(io).await
            };

            // A kernel hands back any interrupt that reached it mid-work;
            // apply it and start a fresh tick without emitting.
            if let Some(interrupt) = interrupt {
                match self.apply(interrupt) {
                    Flow::Exit => break,
                    Flow::Continue => continue,
                }
            }

            if let Flow::Exit = self.emit(&outputs).await {
                break;
            }
        }
        debug!(block = self.spec.name, "serve loop exited");
    }

    /// Assembles one value per input pin: literals contribute a fresh
    /// clone each tick, channel routes are awaited one missing pin at a
    /// time with the control channel always in the race. Returns `None`
    /// when the block should exit.
    async fn gather(&mut self) -> Option<Vec<Message>> {
        let mut drawn: Vec<Option<Message>> = vec![None; self.routes.len()];
        loop {
            // Apply anything already queued so literal edits and wiring
            // land before this tick draws values.
            loop {
                match self.control.try_recv() {
                    Ok(interrupt) => {
                        if let Flow::Exit = self.apply(interrupt) {
                            return None;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return None,
                }
            }

            for (slot, route) in drawn.iter_mut().zip(&self.routes) {
                if slot.is_none() {
                    if let Some(literal) = &route.literal {
                        *slot = Some(literal.clone());
                    }
                }
            }

            let Some(missing) = drawn.iter().position(Option::is_none) else {
                // Zero-input and all-literal blocks would otherwise never
                // reach an await point; give the scheduler a turn.
                tokio::task::yield_now().await;
                return Some(drawn.into_iter().flatten().collect());
            };

            let event = tokio::select! {
                message = self.routes[missing].rx.recv() => match message {
                    Some(value) => GatherEvent::Value(missing, value),
                    None => GatherEvent::RouteClosed(missing),
                },
                interrupt = self.control.recv() => GatherEvent::Interrupt(interrupt),
            };

            match event {
                GatherEvent::Value(pin, value) => drawn[pin] = Some(value),
                GatherEvent::RouteClosed(pin) => {
                    debug!(block = self.spec.name, pin, "input route closed");
                    return None;
                }
                GatherEvent::Interrupt(None) => return None,
                GatherEvent::Interrupt(Some(interrupt)) => {
                    if let Flow::Exit = self.apply(interrupt) {
                        return None;
                    }
                }
            }
        }
    }

    /// Delivers each produced output to every sink on its pin, blocking
    /// per sink. While blocked, stop and disconnect-of-the-awaited-sink
    /// apply inline; every other interrupt is deferred until emission
    /// completes, so no sink observes a half-emitted tick.
    async fn emit(&mut self, outputs: &MessageMap) -> Flow {
        let mut deferred: Vec<Interrupt> = Vec::new();
        for pin in 0..self.sinks.len() {
            let Some(value) = outputs.get(&pin) else {
                continue;
            };
            let mut idx = 0;
            while idx < self.sinks[pin].len() {
                let sink = self.sinks[pin][idx].clone();
                match self.send_one(pin, &sink, value, &mut deferred).await {
                    SendOutcome::Sent => idx += 1,
                    SendOutcome::SinkClosed => {
                        warn!(block = self.spec.name, pin, "dropping closed sink");
                        self.sinks[pin].retain(|s| !s.same_channel(&sink));
                    }
                    SendOutcome::Disconnected => {}
                    SendOutcome::Exit => return Flow::Exit,
                }
            }
        }
        for interrupt in deferred {
            if let Flow::Exit = self.apply(interrupt) {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    async fn send_one(
        &mut self,
        pin: usize,
        sink: &Sink,
        value: &Message,
        deferred: &mut Vec<Interrupt>,
    ) -> SendOutcome {
        loop {
            tokio::select! {
                permit = sink.reserve() => {
                    return match permit {
                        Ok(permit) => {
                            permit.send(value.clone());
                            SendOutcome::Sent
                        }
                        Err(_) => SendOutcome::SinkClosed,
                    };
                }
                interrupt = self.control.recv() => {
                    match interrupt {
                        None | Some(Interrupt::Stop) => return SendOutcome::Exit,
                        Some(Interrupt::Disconnect { pin: target_pin, sink: target })
                            if target_pin == pin && target.same_channel(sink) =>
                        {
                            self.sinks[pin].retain(|s| !s.same_channel(&target));
                            return SendOutcome::Disconnected;
                        }
                        Some(other) => deferred.push(other),
                    }
                }
            }
        }
    }

    fn apply(&mut self, interrupt: Interrupt) -> Flow {
        match interrupt {
            Interrupt::Stop => return Flow::Exit,
            Interrupt::Reset => self.internal.clear(),
            Interrupt::SetLiteral { pin, value } => {
                if let Some(route) = self.routes.get_mut(pin) {
                    route.literal = Some(value);
                }
            }
            Interrupt::ClearLiteral { pin } => {
                if let Some(route) = self.routes.get_mut(pin) {
                    route.literal = None;
                }
            }
            Interrupt::Connect { pin, sink } => {
                if let Some(sinks) = self.sinks.get_mut(pin) {
                    sinks.push(sink);
                }
            }
            Interrupt::Disconnect { pin, sink } => {
                if let Some(sinks) = self.sinks.get_mut(pin) {
                    sinks.retain(|s| !s.same_channel(&sink));
                }
            }
            Interrupt::SetSource(source) => self.source = source,
        }
        Flow::Continue
    }
}
