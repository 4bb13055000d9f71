//! Plugs (typed terminals) and the connections between them.

use serde::{Deserialize, Serialize};

use crate::id::{ConnectionId, NodeId, PlugId};
use crate::signal::Combine;

/// Which way a plug faces. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlugDirection {
    Input,
    Output,
}

impl PlugDirection {
    pub fn opposite(self) -> Self {
        match self {
            PlugDirection::Input => PlugDirection::Output,
            PlugDirection::Output => PlugDirection::Input,
        }
    }
}

/// How a connection is realized. Both kinds behave identically in the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// A persistent physical cable.
    #[default]
    Wired,
    /// A transient pairing, e.g. a transmitter and a receiver.
    Wireless,
}

/// Static description of one plug in a component's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlugSpec {
    pub label: &'static str,
    pub direction: PlugDirection,
    /// Fan-in policy. Ignored for outputs.
    pub combine: Combine,
}

impl PlugSpec {
    pub const fn input(label: &'static str) -> Self {
        Self {
            label,
            direction: PlugDirection::Input,
            combine: Combine::MaxPower,
        }
    }

    pub const fn output(label: &'static str) -> Self {
        Self {
            label,
            direction: PlugDirection::Output,
            combine: Combine::MaxPower,
        }
    }

    pub const fn combine(mut self, combine: Combine) -> Self {
        self.combine = combine;
        self
    }
}

/// Per-plug data stored in the circuit graph.
#[derive(Debug, Clone)]
pub struct PlugData {
    pub owner: NodeId,
    pub label: &'static str,
    pub direction: PlugDirection,
    pub combine: Combine,
    /// Position in the owner's layout.
    pub index: usize,
    /// Connections in the order they were made.
    pub(crate) connections: Vec<ConnectionId>,
}

impl PlugData {
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn is_input(&self) -> bool {
        self.direction == PlugDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PlugDirection::Output
    }
}

/// Per-connection data: always one output and one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionData {
    pub output: PlugId,
    pub input: PlugId,
    pub kind: ConnectionKind,
}

impl ConnectionData {
    /// The endpoint opposite `plug`, or `None` if `plug` is not an endpoint.
    pub fn other(&self, plug: PlugId) -> Option<PlugId> {
        if plug == self.output {
            Some(self.input)
        } else if plug == self.input {
            Some(self.output)
        } else {
            None
        }
    }

    pub fn touches(&self, plug: PlugId) -> bool {
        self.output == plug || self.input == plug
    }
}
