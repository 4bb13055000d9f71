//! A lever or button whose position is replicated state.

use std::any::Any;

use voltaic_authority::{AuthorityError, AuthorityGate, GateId, GateListener, Replicated, SessionTransport};
use voltaic_core::{Circuit, Component, NodeId, PlugSpec, ReadContext, Signal};

use crate::ActuateError;

const LAYOUT: &[PlugSpec] = &[PlugSpec::output("out")];

/// Outputs full power while on. The position only changes when a write
/// from the gate's authority is delivered.
#[derive(Debug)]
pub struct Switch {
    position: AuthorityGate<bool>,
}

impl Switch {
    pub fn new(gate: GateId) -> Self {
        Self::with_position(gate, false)
    }

    pub fn with_position(gate: GateId, on: bool) -> Self {
        Self {
            position: AuthorityGate::new(gate, on),
        }
    }

    pub fn gate(&self) -> GateId {
        self.position.id()
    }

    pub fn is_on(&self) -> bool {
        *self.position.value()
    }

    /// Request a new position. Takes effect on delivery.
    pub fn set(&self, session: &mut dyn SessionTransport, on: bool) -> Result<(), AuthorityError> {
        self.position.set(session, on)
    }

    pub fn toggle(&self, session: &mut dyn SessionTransport) -> Result<(), AuthorityError> {
        self.set(session, !self.is_on())
    }

    /// Listen for position changes (animation, sound).
    pub fn subscribe(&mut self) -> GateListener<bool> {
        self.position.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.position.listener_count()
    }
}

impl Component for Switch {
    fn kind(&self) -> &str {
        "switch"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, _ctx: &ReadContext<'_>) -> Signal {
        Signal::from_bool(self.is_on())
    }

    fn on_disable(&mut self) {
        self.position.unsubscribe_all();
    }

    fn replicated_gates(&self) -> Vec<GateId> {
        vec![self.position.id()]
    }

    fn replicated_mut(&mut self, gate: GateId) -> Option<&mut dyn Replicated> {
        if gate == self.position.id() {
            Some(&mut self.position)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Actuate the switch on `node` from this participant and deliver pending
/// writes. Returns the number of gate changes applied.
pub fn set_switch(circuit: &mut Circuit, node: NodeId, on: bool) -> Result<usize, ActuateError> {
    circuit.with_component::<Switch, _>(node, |switch, ctx| switch.set(ctx.session(), on))??;
    Ok(circuit.sync())
}
