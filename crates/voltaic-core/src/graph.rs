use std::cell::RefCell;
use std::collections::BTreeSet;

use slotmap::SlotMap;

use crate::id::*;
use crate::plug::{ConnectionData, ConnectionKind, PlugData, PlugDirection, PlugSpec};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("plug not found: {0:?}")]
    PlugNotFound(PlugId),
    #[error("connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),
    #[error("cannot connect two {0:?} plugs")]
    SameDirection(PlugDirection),
    #[error("plugs {output:?} and {input:?} are already connected")]
    AlreadyConnected { output: PlugId, input: PlugId },
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// Per-node data stored in the circuit graph.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Level-authored name, used in logs.
    pub label: String,
    /// Plugs in layout order.
    pub(crate) plugs: Vec<PlugId>,
    /// Cycle-safety field: the last wave that processed this node.
    pub(crate) last_epoch_visited: Epoch,
    pub(crate) enabled: bool,
}

impl NodeData {
    pub fn plugs(&self) -> &[PlugId] {
        &self.plugs
    }

    pub fn last_epoch_visited(&self) -> Epoch {
        self.last_epoch_visited
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// A connection removed by [`CircuitGraph::prune_orphans`], with whichever
/// endpoint survived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrunedConnection {
    pub connection: ConnectionId,
    pub survivor: Option<PlugId>,
}

// ---------------------------------------------------------------------------
// CircuitGraph
// ---------------------------------------------------------------------------

/// Arena of nodes, plugs and connections addressed by slotmap handles.
///
/// Back-references (plug -> owner, connection -> plug) are plain handles, so
/// removing a node is one arena removal; connections that pointed at its plugs
/// become orphans until [`prune_orphans`](Self::prune_orphans) runs. Reads
/// tolerate orphans and report each one once.
#[derive(Debug, Default)]
pub struct CircuitGraph {
    nodes: SlotMap<NodeId, NodeData>,
    plugs: SlotMap<PlugId, PlugData>,
    connections: SlotMap<ConnectionId, ConnectionData>,
    /// Orphans already logged on a read path.
    reported_orphans: RefCell<BTreeSet<ConnectionId>>,
    /// Report orphans at debug level instead of warn.
    quiet_orphans: bool,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Topology mutation
    // -----------------------------------------------------------------------

    /// Add a node with one plug per layout entry. The plug set is fixed.
    pub fn add_node(&mut self, label: impl Into<String>, layout: &[PlugSpec]) -> NodeId {
        let node = self.nodes.insert(NodeData {
            label: label.into(),
            plugs: Vec::with_capacity(layout.len()),
            last_epoch_visited: Epoch::NEVER,
            enabled: false,
        });
        for (index, spec) in layout.iter().enumerate() {
            let plug = self.plugs.insert(PlugData {
                owner: node,
                label: spec.label,
                direction: spec.direction,
                combine: spec.combine,
                index,
                connections: Vec::new(),
            });
            self.nodes[node].plugs.push(plug);
        }
        node
    }

    /// Remove a node and its plugs. Connections touching them are left as
    /// orphans and returned; call [`prune_orphans`](Self::prune_orphans) next.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Vec<ConnectionId>, GraphError> {
        let data = self
            .nodes
            .remove(node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let mut orphaned = Vec::new();
        for plug in data.plugs {
            if let Some(plug_data) = self.plugs.remove(plug) {
                orphaned.extend(plug_data.connections);
            }
        }
        Ok(orphaned)
    }

    /// Connect two plugs. The order of `a` and `b` does not matter; exactly
    /// one must be an output.
    pub fn connect(
        &mut self,
        a: PlugId,
        b: PlugId,
        kind: ConnectionKind,
    ) -> Result<ConnectionId, GraphError> {
        let dir_a = self.plugs.get(a).ok_or(GraphError::PlugNotFound(a))?.direction;
        let dir_b = self.plugs.get(b).ok_or(GraphError::PlugNotFound(b))?.direction;
        if dir_a == dir_b {
            return Err(GraphError::SameDirection(dir_a));
        }
        let (output, input) = if dir_a == PlugDirection::Output {
            (a, b)
        } else {
            (b, a)
        };
        let duplicate = self.plugs[output].connections.iter().any(|&c| {
            self.connections
                .get(c)
                .is_some_and(|data| data.input == input)
        });
        if duplicate {
            return Err(GraphError::AlreadyConnected { output, input });
        }

        let connection = self.connections.insert(ConnectionData {
            output,
            input,
            kind,
        });
        self.plugs[output].connections.push(connection);
        self.plugs[input].connections.push(connection);
        Ok(connection)
    }

    /// Remove a connection from both endpoints.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<ConnectionData, GraphError> {
        let data = self
            .connections
            .remove(connection)
            .ok_or(GraphError::ConnectionNotFound(connection))?;
        for plug in [data.output, data.input] {
            if let Some(p) = self.plugs.get_mut(plug) {
                p.connections.retain(|&c| c != connection);
            }
        }
        self.reported_orphans.borrow_mut().remove(&connection);
        Ok(data)
    }

    /// Connections with at least one missing endpoint.
    pub fn orphaned_connections(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, c)| !self.plugs.contains_key(c.output) || !self.plugs.contains_key(c.input))
            .map(|(id, _)| id)
            .collect()
    }

    /// Remove every orphaned connection, returning the surviving endpoints so
    /// their owners can be refreshed.
    pub fn prune_orphans(&mut self) -> Vec<PrunedConnection> {
        let orphans = self.orphaned_connections();
        let mut pruned = Vec::with_capacity(orphans.len());
        for connection in orphans {
            if let Ok(data) = self.disconnect(connection) {
                let survivor = [data.output, data.input]
                    .into_iter()
                    .find(|&p| self.plugs.contains_key(p));
                tracing::debug!(?connection, ?survivor, "pruned orphaned connection");
                pruned.push(PrunedConnection {
                    connection,
                    survivor,
                });
            }
        }
        pruned
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node)
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node)
    }

    pub fn plug(&self, plug: PlugId) -> Option<&PlugData> {
        self.plugs.get(plug)
    }

    pub fn connection(&self, connection: ConnectionId) -> Option<&ConnectionData> {
        self.connections.get(connection)
    }

    /// The plug at `index` in the node's layout.
    pub fn plug_at(&self, node: NodeId, index: usize) -> Option<PlugId> {
        self.nodes.get(node)?.plugs.get(index).copied()
    }

    /// The first plug on `node` with the given label.
    pub fn plug_named(&self, node: NodeId, label: &str) -> Option<PlugId> {
        self.nodes
            .get(node)?
            .plugs
            .iter()
            .copied()
            .find(|&p| self.plugs.get(p).is_some_and(|d| d.label == label))
    }

    /// Owner of a plug, if both still exist.
    pub fn owner_of(&self, plug: PlugId) -> Option<NodeId> {
        let owner = self.plugs.get(plug)?.owner;
        self.nodes.contains_key(owner).then_some(owner)
    }

    /// The opposite endpoint of the plug's `index`-th connection.
    ///
    /// `None` if the index is out of range or the connection is dangling.
    pub fn other_plug(&self, plug: PlugId, index: usize) -> Option<PlugId> {
        let connection = *self.plugs.get(plug)?.connections.get(index)?;
        let Some(data) = self.connections.get(connection) else {
            self.note_orphan(connection);
            return None;
        };
        let other = data.other(plug)?;
        if self.plugs.contains_key(other) {
            Some(other)
        } else {
            self.note_orphan(connection);
            None
        }
    }

    /// Owners of every plug fed by this node's outputs, in plug order then
    /// connection order. May contain duplicates and the node itself.
    pub fn downstream(&self, node: NodeId) -> Vec<NodeId> {
        let Some(data) = self.nodes.get(node) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &plug in &data.plugs {
            let Some(plug_data) = self.plugs.get(plug) else {
                continue;
            };
            if !plug_data.is_output() {
                continue;
            }
            for index in 0..plug_data.connections.len() {
                if let Some(owner) = self.other_plug(plug, index).and_then(|p| self.owner_of(p)) {
                    out.push(owner);
                }
            }
        }
        out
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn contains_plug(&self, plug: PlugId) -> bool {
        self.plugs.contains_key(plug)
    }

    pub fn contains_connection(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(connection)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn plug_count(&self) -> usize {
        self.plugs.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &ConnectionData)> {
        self.connections.iter()
    }

    /// Log a dangling connection the first time a read meets it.
    fn note_orphan(&self, connection: ConnectionId) {
        if !self.reported_orphans.borrow_mut().insert(connection) {
            return;
        }
        if self.quiet_orphans {
            tracing::debug!(?connection, "read through orphaned connection");
        } else {
            tracing::warn!(?connection, "read through orphaned connection; treating as unpowered");
        }
    }

    pub fn set_quiet_orphans(&mut self, quiet: bool) {
        self.quiet_orphans = quiet;
    }

    /// Orphans met on read paths since they were last pruned.
    pub fn reported_orphans(&self) -> Vec<ConnectionId> {
        self.reported_orphans.borrow().iter().copied().collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
