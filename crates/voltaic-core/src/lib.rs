//! Voltaic Core -- the signal propagation engine for circuit puzzles.
//!
//! Components (switches, gates, lamps, breakers...) are nodes in a directed,
//! possibly cyclic graph. Each node owns typed plugs; connections always join
//! one output to one input. When something changes, a wave walks the graph
//! from the changed node and every node it reaches re-derives its own state by
//! pulling fresh values upstream.
//!
//! # Push notify, pull recompute
//!
//! 1. **Notify** -- [`Circuit::refresh`] allocates a new epoch and walks
//!    Output -> Input edges depth-first in insertion order. A node stamped
//!    with the current epoch is not visited again, so cycles terminate.
//! 2. **Recompute** -- a visited node's [`Component::on_refresh`] pulls its
//!    inputs through its context. Nothing is cached; a pull that loops back
//!    to a node already on the pull stack reads [`Signal::OFF`].
//!
//! ```rust,ignore
//! let mut circuit = Circuit::offline();
//! let switch = circuit.add("switch", Switch::new(GateId(1)))?;
//! let lamp = circuit.add("lamp", Lamp::new())?;
//! circuit.wire(circuit.plug(switch, 0)?, circuit.plug(lamp, 0)?, ConnectionKind::Wired)?;
//! circuit.enable_all();
//! ```
//!
//! # Key Types
//!
//! - [`circuit::Circuit`] -- One participant's scene: graph, components,
//!   engine, session link and event log.
//! - [`graph::CircuitGraph`] -- Arena of nodes, plugs and connections with
//!   orphan-tolerant reads.
//! - [`component::Component`] -- The node contract behaviors implement.
//! - [`propagation::PropagationEngine`] -- Epoch counter owned by the scene.
//! - [`signal::Signal`] / [`signal::Combine`] -- Values and fan-in policies.
//! - [`event::EventLog`] -- Bounded ring buffer of [`event::CircuitEvent`]s.

pub mod circuit;
pub mod component;
pub mod config;
pub mod context;
pub mod event;
pub mod graph;
pub mod id;
pub mod plug;
pub mod propagation;
pub mod signal;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use circuit::{Circuit, CircuitError};
pub use component::{Component, ComponentError};
pub use config::CircuitConfig;
pub use context::{ReadContext, RefreshContext};
pub use event::{CircuitEvent, EventLog};
pub use graph::{CircuitGraph, GraphError, PrunedConnection};
pub use id::{ConnectionId, Epoch, NodeId, PlugId};
pub use plug::{ConnectionKind, PlugDirection, PlugSpec};
pub use propagation::{NodeFailure, PropagationEngine, WaveReport};
pub use signal::{Combine, Payload, Signal};
