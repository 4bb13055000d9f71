//! The node contract every circuit behavior implements.
//!
//! A component owns no graph state: its plugs, connections and visit epoch
//! live in the [`CircuitGraph`](crate::graph::CircuitGraph). It only answers
//! two questions: "what is on this output right now?" ([`read_output`]) and
//! "something upstream changed, react" ([`on_refresh`]).
//!
//! [`read_output`]: Component::read_output
//! [`on_refresh`]: Component::on_refresh

use voltaic_authority::{AuthorityError, GateId, Replicated};

use crate::context::{ReadContext, RefreshContext};
use crate::plug::PlugSpec;
use crate::signal::Signal;

/// A circuit component: switch, gate, lamp, actuator...
///
/// Plugs are addressed by their index in [`layout`](Component::layout).
pub trait Component: std::fmt::Debug {
    /// Short behavior name, used in logs and scene files.
    fn kind(&self) -> &str;

    /// The fixed plug layout. Called once, when the node is added.
    fn layout(&self) -> &'static [PlugSpec];

    /// Compute the signal on output plug `plug` from current inputs.
    ///
    /// Must not trigger propagation. Reads are uncached: every call pulls
    /// fresh values upstream through `ctx`.
    fn read_output(&self, plug: usize, ctx: &ReadContext<'_>) -> Signal;

    /// Called once per wave that reaches this node while it is enabled.
    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        let _ = ctx;
        Ok(())
    }

    /// The node entered the live scene. A refresh follows immediately.
    fn on_enable(&mut self) {}

    /// The node left the live scene. Drop gate listeners here.
    fn on_disable(&mut self) {}

    /// Gates this component replicates. Registered when the node is added.
    fn replicated_gates(&self) -> Vec<GateId> {
        Vec::new()
    }

    /// Mutable access to one replicated gate, for delivering writes.
    fn replicated_mut(&mut self, gate: GateId) -> Option<&mut dyn Replicated> {
        let _ = gate;
        None
    }

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// A failure inside one component's hook. Contained to that node.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

impl ComponentError {
    pub fn failed(message: impl Into<String>) -> Self {
        ComponentError::Failed(message.into())
    }
}
