//! Circuit events and the bounded log the presentation layer drains.
//!
//! The engine never calls into rendering, audio or animation. It records what
//! happened in an [`EventLog`] ring buffer; hosts drain it once per frame.

use voltaic_authority::GateId;

use crate::id::{ConnectionId, Epoch, NodeId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitEvent {
    /// A node entered the live scene.
    NodeEnabled { node: NodeId },
    /// A node left the live scene.
    NodeDisabled { node: NodeId },
    /// A propagation wave ran to completion.
    WaveCompleted {
        epoch: Epoch,
        origin: NodeId,
        visited: usize,
    },
    /// A node's hook failed; the wave carried on without it.
    NodeFailed {
        node: NodeId,
        epoch: Epoch,
        message: String,
    },
    /// A dangling connection was removed.
    ConnectionPruned {
        connection: ConnectionId,
        survivor: Option<NodeId>,
    },
    /// A replicated gate on `node` took a new value.
    GateChanged { node: NodeId, gate: GateId },
    /// A component's externally visible output changed (emitted by components).
    OutputChanged { node: NodeId, powered: bool },
}

impl CircuitEvent {
    /// The node this event concerns, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            CircuitEvent::NodeEnabled { node }
            | CircuitEvent::NodeDisabled { node }
            | CircuitEvent::NodeFailed { node, .. }
            | CircuitEvent::GateChanged { node, .. }
            | CircuitEvent::OutputChanged { node, .. } => Some(*node),
            CircuitEvent::WaveCompleted { origin, .. } => Some(*origin),
            CircuitEvent::ConnectionPruned { survivor, .. } => *survivor,
        }
    }
}

// ---------------------------------------------------------------------------
// EventLog -- pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A fixed-capacity ring buffer. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Option<CircuitEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
    dropped: u64,
}

impl EventLog {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: CircuitEvent) {
        let capacity = self.capacity();
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CircuitEvent> {
        let capacity = self.capacity();
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    /// Take every buffered event, oldest first, leaving the log empty.
    pub fn drain(&mut self) -> Vec<CircuitEvent> {
        let capacity = self.capacity();
        let start = if self.len < capacity { 0 } else { self.head };
        let drained = (0..self.len)
            .filter_map(|i| self.events[(start + i) % capacity].take())
            .collect();
        self.head = 0;
        self.len = 0;
        drained
    }
}
