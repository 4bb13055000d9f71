//! Contexts handed to components: uncached pulls, and the refresh hook's
//! access to the rest of the scene.

use std::cell::RefCell;

use slotmap::SecondaryMap;
use voltaic_authority::{GateId, SessionTransport};

use crate::circuit::Circuit;
use crate::component::Component;
use crate::event::CircuitEvent;
use crate::graph::CircuitGraph;
use crate::id::{Epoch, NodeId, PlugId};
use crate::plug::PlugDirection;
use crate::signal::Signal;

/// Component storage. A slot is `None` while its component's hook runs.
pub(crate) type ComponentStore = SecondaryMap<NodeId, Option<Box<dyn Component>>>;

// ---------------------------------------------------------------------------
// Pull walk
// ---------------------------------------------------------------------------

/// Demand-driven upstream walk. Nothing is cached; every read re-enters the
/// graph. A read that comes back to a node already on the pull stack (a
/// cycle), or to a node whose hook is running, is truncated to `OFF`.
pub(crate) struct Puller<'a> {
    graph: &'a CircuitGraph,
    components: &'a ComponentStore,
    stack: RefCell<Vec<NodeId>>,
}

impl<'a> Puller<'a> {
    pub(crate) fn new(graph: &'a CircuitGraph, components: &'a ComponentStore) -> Self {
        Self {
            graph,
            components,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// A pull that starts inside `node`, so loops back to it truncate.
    pub(crate) fn rooted(
        graph: &'a CircuitGraph,
        components: &'a ComponentStore,
        node: NodeId,
    ) -> Self {
        Self {
            graph,
            components,
            stack: RefCell::new(vec![node]),
        }
    }

    /// Outputs answer from their owner; inputs aggregate their fan-in.
    pub(crate) fn read(&self, plug: PlugId) -> Signal {
        match self.graph.plug(plug).map(|p| p.direction) {
            Some(PlugDirection::Output) => self.read_output(plug),
            Some(PlugDirection::Input) => self.aggregate(plug),
            None => Signal::OFF,
        }
    }

    /// For an input, the `index`-th connected output. For an output, its own
    /// value (the index is ignored).
    pub(crate) fn read_at(&self, plug: PlugId, index: usize) -> Signal {
        match self.graph.plug(plug).map(|p| p.direction) {
            Some(PlugDirection::Output) => self.read_output(plug),
            Some(PlugDirection::Input) => self
                .graph
                .other_plug(plug, index)
                .map_or(Signal::OFF, |other| self.read_output(other)),
            None => Signal::OFF,
        }
    }

    /// Every connected signal of an input, in connection order.
    pub(crate) fn connected(&self, plug: PlugId) -> Vec<Signal> {
        let count = self.graph.plug(plug).map_or(0, |p| p.connections().len());
        (0..count).map(|i| self.read_at(plug, i)).collect()
    }

    /// Fan-in reduced with the plug's own combination policy.
    pub(crate) fn aggregate(&self, plug: PlugId) -> Signal {
        let Some(data) = self.graph.plug(plug) else {
            return Signal::OFF;
        };
        data.combine.reduce(self.connected(plug))
    }

    pub(crate) fn read_output(&self, plug: PlugId) -> Signal {
        let Some(data) = self.graph.plug(plug) else {
            return Signal::OFF;
        };
        if !data.is_output() {
            return Signal::OFF;
        }
        let owner = data.owner;
        if self.stack.borrow().contains(&owner) {
            tracing::trace!(?owner, "pull truncated at cycle");
            return Signal::OFF;
        }
        let Some(Some(component)) = self.components.get(owner) else {
            return Signal::OFF;
        };
        self.stack.borrow_mut().push(owner);
        let ctx = ReadContext {
            puller: self,
            node: owner,
        };
        let signal = component.read_output(data.index, &ctx);
        self.stack.borrow_mut().pop();
        signal
    }
}

/// Resolve a layout index to an input plug of `node`.
fn input_plug(graph: &CircuitGraph, node: NodeId, index: usize) -> Option<PlugId> {
    let plug = graph.plug_at(node, index)?;
    let is_input = graph.plug(plug).is_some_and(|p| p.is_input());
    debug_assert!(is_input, "plug {index} of {node:?} is not an input");
    is_input.then_some(plug)
}

// ---------------------------------------------------------------------------
// ReadContext
// ---------------------------------------------------------------------------

/// Handed to [`Component::read_output`]. Pulls the node's inputs on demand.
pub struct ReadContext<'a> {
    puller: &'a Puller<'a>,
    node: NodeId,
}

impl ReadContext<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Input plug `index`, reduced with its combination policy.
    pub fn input(&self, index: usize) -> Signal {
        input_plug(self.puller.graph, self.node, index)
            .map_or(Signal::OFF, |p| self.puller.aggregate(p))
    }

    /// The `k`-th connection of input plug `index`.
    pub fn input_at(&self, index: usize, k: usize) -> Signal {
        input_plug(self.puller.graph, self.node, index)
            .map_or(Signal::OFF, |p| self.puller.read_at(p, k))
    }

    /// Every connection of input plug `index`, in connection order.
    pub fn inputs(&self, index: usize) -> Vec<Signal> {
        input_plug(self.puller.graph, self.node, index)
            .map_or_else(Vec::new, |p| self.puller.connected(p))
    }

    pub fn input_count(&self, index: usize) -> usize {
        input_plug(self.puller.graph, self.node, index)
            .and_then(|p| self.puller.graph.plug(p))
            .map_or(0, |p| p.connections().len())
    }
}

// ---------------------------------------------------------------------------
// RefreshContext
// ---------------------------------------------------------------------------

/// Handed to [`Component::on_refresh`]. The component itself is checked out
/// of the scene while its hook runs.
pub struct RefreshContext<'a> {
    pub(crate) circuit: &'a mut Circuit,
    pub(crate) node: NodeId,
    pub(crate) epoch: Epoch,
}

impl RefreshContext<'_> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The wave that reached this node.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn label(&self) -> &str {
        self.circuit
            .graph()
            .node(self.node)
            .map_or("", |n| n.label.as_str())
    }

    fn puller(&self) -> Puller<'_> {
        Puller::rooted(&self.circuit.graph, &self.circuit.components, self.node)
    }

    /// Input plug `index`, pulled fresh and reduced.
    pub fn input(&self, index: usize) -> Signal {
        let puller = self.puller();
        input_plug(&self.circuit.graph, self.node, index)
            .map_or(Signal::OFF, |p| puller.aggregate(p))
    }

    pub fn input_at(&self, index: usize, k: usize) -> Signal {
        let puller = self.puller();
        input_plug(&self.circuit.graph, self.node, index)
            .map_or(Signal::OFF, |p| puller.read_at(p, k))
    }

    pub fn inputs(&self, index: usize) -> Vec<Signal> {
        let puller = self.puller();
        input_plug(&self.circuit.graph, self.node, index)
            .map_or_else(Vec::new, |p| puller.connected(p))
    }

    /// Ask for `node` to be refreshed. Inside a wave the node joins that
    /// wave and is skipped if it was already visited; from
    /// [`Circuit::with_component`] it gets its own wave once the component
    /// is back in its slot.
    pub fn refresh(&mut self, node: NodeId) {
        self.circuit.engine.schedule(node);
    }

    /// This participant's session transport, for gate writes.
    pub fn session(&mut self) -> &mut dyn SessionTransport {
        self.circuit.session_mut()
    }

    pub fn has_authority(&self, gate: GateId) -> bool {
        self.circuit.session().has_authority(gate)
    }

    /// Record an event for the presentation layer.
    pub fn emit(&mut self, event: CircuitEvent) {
        self.circuit.events.push(event);
    }
}
