//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::any::Any;

use crate::circuit::Circuit;
use crate::component::{Component, ComponentError};
use crate::context::{ReadContext, RefreshContext};
use crate::id::{ConnectionId, NodeId};
use crate::plug::{ConnectionKind, PlugSpec};
use crate::signal::{Combine, Signal};

// ===========================================================================
// Layouts
// ===========================================================================

/// `[in, out]` with max-power fan-in.
pub const RELAY: &[PlugSpec] = &[PlugSpec::input("in"), PlugSpec::output("out")];

/// `[in, out]` with summing fan-in.
pub const SUM_RELAY: &[PlugSpec] = &[
    PlugSpec::input("in").combine(Combine::Sum),
    PlugSpec::output("out"),
];

pub const SOURCE: &[PlugSpec] = &[PlugSpec::output("out")];

// ===========================================================================
// Test components
// ===========================================================================

/// An output that always reads the same signal.
#[derive(Debug, Clone)]
pub struct Constant {
    pub signal: Signal,
}

impl Constant {
    pub fn new(power: f32) -> Self {
        Self {
            signal: Signal::new(power),
        }
    }
}

impl Component for Constant {
    fn kind(&self) -> &str {
        "constant"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        SOURCE
    }

    fn read_output(&self, _plug: usize, _ctx: &ReadContext<'_>) -> Signal {
        self.signal
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Passes its input through and counts every hook call.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    pub summing: bool,
    pub refreshes: usize,
    pub enables: usize,
    pub disables: usize,
    /// Input observed by the latest refresh.
    pub last_input: Signal,
}

impl Probe {
    pub fn summing() -> Self {
        Self {
            summing: true,
            ..Self::default()
        }
    }
}

impl Component for Probe {
    fn kind(&self) -> &str {
        "probe"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        if self.summing { SUM_RELAY } else { RELAY }
    }

    fn read_output(&self, plug: usize, ctx: &ReadContext<'_>) -> Signal {
        if plug == 1 { ctx.input(0) } else { Signal::OFF }
    }

    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        self.refreshes += 1;
        self.last_input = ctx.input(0);
        Ok(())
    }

    fn on_enable(&mut self) {
        self.enables += 1;
    }

    fn on_disable(&mut self) {
        self.disables += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A relay whose hook always fails, by error or by panic.
#[derive(Debug, Clone)]
pub struct Failing {
    pub panic: bool,
}

impl Failing {
    pub fn error() -> Self {
        Self { panic: false }
    }

    pub fn panic() -> Self {
        Self { panic: true }
    }
}

impl Component for Failing {
    fn kind(&self) -> &str {
        "failing"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        RELAY
    }

    fn read_output(&self, plug: usize, ctx: &ReadContext<'_>) -> Signal {
        if plug == 1 { ctx.input(0) } else { Signal::OFF }
    }

    fn on_refresh(&mut self, _ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        if self.panic {
            panic!("failing component");
        }
        Err(ComponentError::failed("failing component"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A relay that asks for a refresh of `target` inside its hook.
#[derive(Debug, Clone, Default)]
pub struct Retrigger {
    pub target: Option<NodeId>,
    /// Refresh requests made so far.
    pub requests: usize,
}

impl Component for Retrigger {
    fn kind(&self) -> &str {
        "retrigger"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        RELAY
    }

    fn read_output(&self, plug: usize, ctx: &ReadContext<'_>) -> Signal {
        if plug == 1 { ctx.input(0) } else { Signal::OFF }
    }

    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        if let Some(target) = self.target {
            ctx.refresh(target);
            self.requests += 1;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Scene helpers
// ===========================================================================

pub fn offline_circuit() -> Circuit {
    Circuit::offline()
}

pub fn add_probe(circuit: &mut Circuit, label: &str) -> NodeId {
    circuit.add(label, Probe::default()).unwrap()
}

pub fn probe(circuit: &Circuit, node: NodeId) -> &Probe {
    circuit.component_as::<Probe>(node).unwrap()
}

/// Wire `from.out` to `to.in`.
pub fn wire_out_in(circuit: &mut Circuit, from: NodeId, to: NodeId) -> ConnectionId {
    let out = circuit.plug_named(from, "out").unwrap();
    let inp = circuit.plug_named(to, "in").unwrap();
    circuit.wire(out, inp, ConnectionKind::Wired).unwrap()
}

/// `count` probes wired in a line, first to last.
pub fn chain(circuit: &mut Circuit, count: usize) -> Vec<NodeId> {
    let nodes: Vec<NodeId> = (0..count)
        .map(|i| add_probe(circuit, &format!("p{i}")))
        .collect();
    for pair in nodes.windows(2) {
        wire_out_in(circuit, pair[0], pair[1]);
    }
    nodes
}
