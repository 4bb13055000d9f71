//! The live scene: graph, components, engine, session and event log.

use std::collections::BTreeMap;

use voltaic_authority::{GateId, ParticipantId, SessionLink, SessionTransport};

use crate::component::Component;
use crate::config::CircuitConfig;
use crate::context::{ComponentStore, Puller, RefreshContext};
use crate::event::{CircuitEvent, EventLog};
use crate::graph::{CircuitGraph, GraphError, PrunedConnection};
use crate::id::{ConnectionId, NodeId, PlugId};
use crate::plug::{ConnectionKind, PlugDirection};
use crate::propagation::PropagationEngine;
use crate::signal::Signal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("node {node:?} has no plug {plug}")]
    UnknownPlug { node: NodeId, plug: String },
    #[error("gate {gate} is already routed to {owner:?}")]
    DuplicateGate { gate: GateId, owner: NodeId },
    #[error("component on {0:?} is not of the requested kind")]
    KindMismatch(NodeId),
    #[error("component on {0:?} is running its hook")]
    Busy(NodeId),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Circuit
// ---------------------------------------------------------------------------

/// One participant's replica of a circuit scene.
///
/// Nodes are added disabled. [`enable`](Self::enable) brings a node into the
/// live scene and runs one wave from it, so it is never stale.
#[derive(Debug)]
pub struct Circuit {
    pub(crate) graph: CircuitGraph,
    pub(crate) components: ComponentStore,
    pub(crate) engine: PropagationEngine,
    pub(crate) events: EventLog,
    session: Box<dyn SessionTransport>,
    /// Which node replicates each gate.
    gate_routes: BTreeMap<GateId, NodeId>,
    config: CircuitConfig,
}

impl Circuit {
    pub fn new(session: impl SessionTransport + 'static) -> Self {
        Self::with_config(session, CircuitConfig::default())
    }

    pub fn with_config(session: impl SessionTransport + 'static, config: CircuitConfig) -> Self {
        let mut graph = CircuitGraph::new();
        graph.set_quiet_orphans(!config.warn_on_orphans);
        Self {
            graph,
            components: ComponentStore::new(),
            engine: PropagationEngine::new(),
            events: EventLog::new(config.event_capacity),
            session: Box::new(session),
            gate_routes: BTreeMap::new(),
            config,
        }
    }

    /// A single-player scene: participant 0 hosts and owns every gate.
    pub fn offline() -> Self {
        Self::new(SessionLink::offline(ParticipantId(0)))
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    pub fn add(
        &mut self,
        label: impl Into<String>,
        component: impl Component + 'static,
    ) -> Result<NodeId, CircuitError> {
        self.add_component(label, Box::new(component))
    }

    /// Add a node for `component`. Its replicated gates are routed to it.
    pub fn add_component(
        &mut self,
        label: impl Into<String>,
        component: Box<dyn Component>,
    ) -> Result<NodeId, CircuitError> {
        let gates = component.replicated_gates();
        for gate in &gates {
            if let Some(&owner) = self.gate_routes.get(gate) {
                return Err(CircuitError::DuplicateGate { gate: *gate, owner });
            }
        }
        let label = label.into();
        let node = self.graph.add_node(label.clone(), component.layout());
        tracing::debug!(?node, %label, kind = component.kind(), "node added");
        self.components.insert(node, Some(component));
        for gate in gates {
            self.gate_routes.insert(gate, node);
        }
        Ok(node)
    }

    /// Bring a node into the live scene and run one wave from it.
    /// Enabling an enabled node does nothing.
    pub fn enable(&mut self, node: NodeId) -> Result<(), CircuitError> {
        let data = self
            .graph
            .node_mut(node)
            .ok_or(CircuitError::NodeNotFound(node))?;
        if data.enabled {
            return Ok(());
        }
        data.enabled = true;
        if let Some(Some(component)) = self.components.get_mut(node) {
            component.on_enable();
        }
        self.events.push(CircuitEvent::NodeEnabled { node });
        self.refresh(node);
        Ok(())
    }

    /// Enable every disabled node, in arena order.
    pub fn enable_all(&mut self) {
        let disabled: Vec<NodeId> = self
            .graph
            .nodes()
            .filter(|(_, data)| !data.enabled)
            .map(|(id, _)| id)
            .collect();
        for node in disabled {
            // A hook may despawn a node before its turn comes.
            if self.enable(node).is_err() {
                tracing::debug!(?node, "node gone before enable");
            }
        }
    }

    /// Take a node out of the live scene. Its outputs stay readable.
    pub fn disable(&mut self, node: NodeId) -> Result<(), CircuitError> {
        let data = self
            .graph
            .node_mut(node)
            .ok_or(CircuitError::NodeNotFound(node))?;
        if !data.enabled {
            return Ok(());
        }
        data.enabled = false;
        if let Some(Some(component)) = self.components.get_mut(node) {
            component.on_disable();
        }
        self.events.push(CircuitEvent::NodeDisabled { node });
        Ok(())
    }

    pub fn is_enabled(&self, node: NodeId) -> bool {
        self.graph.node(node).is_some_and(|n| n.enabled)
    }

    /// Remove a node from the arena only. Connections to it become orphans
    /// and are returned; reads through them see `OFF` until pruned.
    pub fn detach_node(&mut self, node: NodeId) -> Result<Vec<ConnectionId>, CircuitError> {
        self.disable(node)?;
        let orphaned = self.graph.remove_node(node)?;
        if let Some(Some(component)) = self.components.remove(node) {
            tracing::debug!(?node, kind = component.kind(), "node detached");
        }
        self.gate_routes.retain(|_, owner| *owner != node);
        Ok(orphaned)
    }

    /// Remove every orphaned connection. The enabled owner of each surviving
    /// endpoint gets a wave, upstream or downstream.
    pub fn prune_orphans(&mut self) -> Vec<PrunedConnection> {
        let pruned = self.graph.prune_orphans();
        let mut notify = Vec::new();
        for entry in &pruned {
            let survivor_owner = entry.survivor.and_then(|p| self.graph.owner_of(p));
            self.events.push(CircuitEvent::ConnectionPruned {
                connection: entry.connection,
                survivor: survivor_owner,
            });
            if let Some(owner) = survivor_owner {
                if !notify.contains(&owner) {
                    notify.push(owner);
                }
            }
        }
        for owner in notify {
            if self.is_enabled(owner) {
                self.refresh(owner);
            }
        }
        pruned
    }

    /// Remove a node and clean up behind it.
    pub fn despawn(&mut self, node: NodeId) -> Result<(), CircuitError> {
        self.detach_node(node)?;
        self.prune_orphans();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Wiring
    // -----------------------------------------------------------------------

    /// The plug at layout index `index` on `node`.
    pub fn plug(&self, node: NodeId, index: usize) -> Result<PlugId, CircuitError> {
        self.require_node(node)?;
        self.graph
            .plug_at(node, index)
            .ok_or_else(|| CircuitError::UnknownPlug {
                node,
                plug: index.to_string(),
            })
    }

    pub fn plug_named(&self, node: NodeId, label: &str) -> Result<PlugId, CircuitError> {
        self.require_node(node)?;
        self.graph
            .plug_named(node, label)
            .ok_or_else(|| CircuitError::UnknownPlug {
                node,
                plug: label.to_string(),
            })
    }

    /// Connect two plugs (either order). The input's owner is refreshed.
    pub fn wire(
        &mut self,
        a: PlugId,
        b: PlugId,
        kind: ConnectionKind,
    ) -> Result<ConnectionId, CircuitError> {
        let connection = self.graph.connect(a, b, kind)?;
        let input = self.graph.connection(connection).map(|c| c.input);
        self.refresh_owner(input);
        Ok(connection)
    }

    /// Remove a connection. The input's owner is refreshed.
    pub fn unwire(&mut self, connection: ConnectionId) -> Result<(), CircuitError> {
        let data = self.graph.disconnect(connection)?;
        self.refresh_owner(Some(data.input));
        Ok(())
    }

    fn refresh_owner(&mut self, plug: Option<PlugId>) {
        if let Some(owner) = plug.and_then(|p| self.graph.owner_of(p)) {
            if self.is_enabled(owner) {
                self.refresh(owner);
            }
        }
    }

    pub fn other_plug(&self, plug: PlugId, index: usize) -> Option<PlugId> {
        self.graph.other_plug(plug, index)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    fn puller(&self) -> Puller<'_> {
        Puller::new(&self.graph, &self.components)
    }

    /// An output's value, or an input's aggregated fan-in.
    pub fn read(&self, plug: PlugId) -> Signal {
        self.puller().read(plug)
    }

    /// The `index`-th connected signal of an input. Outputs ignore `index`.
    pub fn read_at(&self, plug: PlugId, index: usize) -> Signal {
        self.puller().read_at(plug, index)
    }

    /// Fan-in of an input reduced with its combination policy.
    pub fn read_aggregate(&self, plug: PlugId) -> Signal {
        let puller = self.puller();
        match self.graph.plug(plug).map(|p| p.direction) {
            Some(PlugDirection::Input) => puller.aggregate(plug),
            Some(PlugDirection::Output) => puller.read_output(plug),
            None => Signal::OFF,
        }
    }

    /// Ask `node` for the value on one of its own outputs.
    ///
    /// Asking for a plug the node does not own, or for an input, is a
    /// programming error: it asserts in debug builds and reads `OFF`
    /// otherwise.
    pub fn read_output(&self, node: NodeId, plug: PlugId) -> Signal {
        let owned = self
            .graph
            .plug(plug)
            .is_some_and(|p| p.owner == node && p.is_output());
        debug_assert!(owned, "{plug:?} is not an output of {node:?}");
        if !owned {
            return Signal::OFF;
        }
        self.puller().read_output(plug)
    }

    /// [`read_output`](Self::read_output) by layout index.
    pub fn read_output_at(&self, node: NodeId, index: usize) -> Signal {
        match self.graph.plug_at(node, index) {
            Some(plug) => self.read_output(node, plug),
            None => Signal::OFF,
        }
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    pub fn component(&self, node: NodeId) -> Option<&dyn Component> {
        self.components.get(node)?.as_deref()
    }

    pub fn component_mut(&mut self, node: NodeId) -> Option<&mut dyn Component> {
        let component: &mut dyn Component = self.components.get_mut(node)?.as_deref_mut()?;
        Some(component)
    }

    pub fn component_as<T: Component + 'static>(&self, node: NodeId) -> Option<&T> {
        self.component(node)?.as_any().downcast_ref()
    }

    pub fn component_as_mut<T: Component + 'static>(&mut self, node: NodeId) -> Option<&mut T> {
        self.component_mut(node)?.as_any_mut().downcast_mut()
    }

    /// Run `f` on a component with a refresh context, the way a host
    /// actuates a node (flip a switch, claim a lock).
    pub fn with_component<T, R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(&mut T, &mut RefreshContext<'_>) -> R,
    ) -> Result<R, CircuitError>
    where
        T: Component + 'static,
    {
        let slot = self
            .components
            .get_mut(node)
            .ok_or(CircuitError::NodeNotFound(node))?;
        let mut component = slot.take().ok_or(CircuitError::Busy(node))?;
        let result = match component.as_any_mut().downcast_mut::<T>() {
            Some(typed) => {
                let epoch = self.engine.current();
                let mut ctx = RefreshContext {
                    circuit: self,
                    node,
                    epoch,
                };
                Ok(f(typed, &mut ctx))
            }
            None => Err(CircuitError::KindMismatch(node)),
        };
        if let Some(slot) = self.components.get_mut(node) {
            *slot = Some(component);
        }
        for requested in self.engine.take_scheduled() {
            self.refresh(requested);
        }
        result
    }

    // -----------------------------------------------------------------------
    // Replication
    // -----------------------------------------------------------------------

    /// Deliver pending session writes to their gates. Writes whose origin
    /// does not hold the gate's authority are dropped. Every node whose gate
    /// changed gets a wave. Returns the number of changes applied.
    pub fn sync(&mut self) -> usize {
        let writes = self.session.poll();
        let mut changed = 0;
        for write in writes {
            let owner = self.session.authority_of(write.gate);
            if owner != Some(write.origin) {
                tracing::warn!(
                    gate = %write.gate,
                    origin = %write.origin,
                    ?owner,
                    "dropped write from non-authority"
                );
                continue;
            }
            let Some(&node) = self.gate_routes.get(&write.gate) else {
                tracing::trace!(gate = %write.gate, "write for a gate not in this scene");
                continue;
            };
            let Some(Some(component)) = self.components.get_mut(node) else {
                tracing::warn!(?node, gate = %write.gate, "gate owner unavailable; write dropped");
                continue;
            };
            let Some(gate) = component.replicated_mut(write.gate) else {
                tracing::warn!(?node, gate = %write.gate, "component does not expose routed gate");
                continue;
            };
            match gate.apply_write(&write) {
                Ok(true) => {
                    changed += 1;
                    self.events.push(CircuitEvent::GateChanged {
                        node,
                        gate: write.gate,
                    });
                    self.refresh(node);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(?node, error = %e, "gate write rejected"),
            }
        }
        changed
    }

    /// The node replicating `gate`, if any.
    pub fn gate_owner(&self, gate: GateId) -> Option<NodeId> {
        self.gate_routes.get(&gate).copied()
    }

    pub fn session(&self) -> &dyn SessionTransport {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionTransport {
        self.session.as_mut()
    }

    pub fn local(&self) -> ParticipantId {
        self.session.local()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    pub fn engine(&self) -> &PropagationEngine {
        &self.engine
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CircuitEvent> {
        self.events.drain()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn require_node(&self, node: NodeId) -> Result<(), CircuitError> {
        if self.graph.contains_node(node) {
            Ok(())
        } else {
            Err(CircuitError::NodeNotFound(node))
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Combine;
    use crate::test_utils::*;

    // =======================================================================
    // Lifecycle
    // =======================================================================

    #[test]
    fn nodes_start_disabled_and_enable_refreshes_once() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        assert!(!circuit.is_enabled(a));
        assert_eq!(probe(&circuit, a).refreshes, 0);

        circuit.enable(a).unwrap();
        assert!(circuit.is_enabled(a));
        assert_eq!(probe(&circuit, a).refreshes, 1);
        assert_eq!(probe(&circuit, a).enables, 1);

        // Idempotent.
        circuit.enable(a).unwrap();
        assert_eq!(probe(&circuit, a).refreshes, 1);
    }

    #[test]
    fn disable_runs_hook_and_emits() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        circuit.enable(a).unwrap();
        circuit.drain_events();

        circuit.disable(a).unwrap();
        assert!(!circuit.is_enabled(a));
        assert_eq!(probe(&circuit, a).disables, 1);
        assert_eq!(
            circuit.drain_events(),
            vec![CircuitEvent::NodeDisabled { node: a }]
        );
    }

    #[test]
    fn missing_node_is_an_error() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        circuit.despawn(a).unwrap();
        assert!(matches!(
            circuit.enable(a),
            Err(CircuitError::NodeNotFound(_))
        ));
        assert!(matches!(
            circuit.plug(a, 0),
            Err(CircuitError::NodeNotFound(_))
        ));
    }

    #[test]
    fn unknown_plug_label_is_an_error() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        let err = circuit.plug_named(a, "nope").unwrap_err();
        assert!(matches!(err, CircuitError::UnknownPlug { .. }));
        assert!(err.to_string().contains("nope"));
    }

    // =======================================================================
    // Reads
    // =======================================================================

    #[test]
    fn constant_drives_downstream_output() {
        let mut circuit = offline_circuit();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let b = add_probe(&mut circuit, "b");
        wire_out_in(&mut circuit, src, b);
        circuit.enable_all();

        assert_eq!(circuit.read_output_at(b, 1).power, 1.0);
        let b_in = circuit.plug(b, 0).unwrap();
        assert_eq!(circuit.read(b_in).power, 1.0);
        assert_eq!(circuit.read_at(b_in, 0).power, 1.0);
        assert_eq!(circuit.read_at(b_in, 1), Signal::OFF);
    }

    #[test]
    fn reads_are_idempotent() {
        let mut circuit = offline_circuit();
        let src = circuit.add("src", Constant::new(0.7)).unwrap();
        let nodes = chain(&mut circuit, 3);
        wire_out_in(&mut circuit, src, nodes[0]);
        circuit.enable_all();

        let out = circuit.plug(nodes[2], 1).unwrap();
        assert_eq!(circuit.read(out), circuit.read(out));
    }

    #[test]
    fn fan_in_uses_the_plug_policy() {
        let mut circuit = offline_circuit();
        let sum = circuit.add("sum", Probe::summing()).unwrap();
        let max = add_probe(&mut circuit, "max");
        for (i, power) in [0.4, 0.3, 0.5].into_iter().enumerate() {
            let src = circuit.add(format!("src{i}"), Constant::new(power)).unwrap();
            wire_out_in(&mut circuit, src, sum);
            wire_out_in(&mut circuit, src, max);
        }
        assert_eq!(
            circuit.graph().plug(circuit.plug(sum, 0).unwrap()).unwrap().combine,
            Combine::Sum
        );
        let total = circuit.read_aggregate(circuit.plug(sum, 0).unwrap()).power;
        assert!((total - 1.2).abs() < 1e-6);
        assert_eq!(circuit.read_aggregate(circuit.plug(max, 0).unwrap()).power, 0.5);
    }

    #[test]
    fn pull_cycle_truncates_to_off() {
        let mut circuit = offline_circuit();
        let nodes = chain(&mut circuit, 2);
        wire_out_in(&mut circuit, nodes[1], nodes[0]);
        circuit.enable_all();
        assert_eq!(circuit.read_output_at(nodes[0], 1), Signal::OFF);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not an output")]
    fn read_output_of_foreign_plug_asserts() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        let b = add_probe(&mut circuit, "b");
        let b_out = circuit.plug(b, 1).unwrap();
        circuit.read_output(a, b_out);
    }

    // =======================================================================
    // Topology changes
    // =======================================================================

    #[test]
    fn wire_refreshes_the_input_owner() {
        let mut circuit = offline_circuit();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let b = add_probe(&mut circuit, "b");
        circuit.enable_all();
        let before = probe(&circuit, b).refreshes;

        wire_out_in(&mut circuit, src, b);
        assert_eq!(probe(&circuit, b).refreshes, before + 1);
        assert_eq!(probe(&circuit, b).last_input.power, 1.0);
    }

    #[test]
    fn unwire_refreshes_and_powers_down() {
        let mut circuit = offline_circuit();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let b = add_probe(&mut circuit, "b");
        let c = wire_out_in(&mut circuit, src, b);
        circuit.enable_all();

        circuit.unwire(c).unwrap();
        assert_eq!(probe(&circuit, b).last_input, Signal::OFF);
        assert!(matches!(
            circuit.unwire(c),
            Err(CircuitError::Graph(GraphError::ConnectionNotFound(_)))
        ));
    }

    #[test]
    fn detached_node_leaves_readable_orphans() {
        let mut circuit = offline_circuit();
        let nodes = chain(&mut circuit, 2);
        circuit.enable_all();
        let a_out = circuit.plug(nodes[0], 1).unwrap();

        let orphaned = circuit.detach_node(nodes[1]).unwrap();
        assert_eq!(orphaned.len(), 1);
        assert_eq!(circuit.other_plug(a_out, 0), None);

        let report = circuit.refresh(nodes[0]);
        assert_eq!(report.visited, vec![nodes[0]]);
        assert!(report.is_clean());
    }

    #[test]
    fn despawn_prunes_and_notifies_survivors() {
        let mut circuit = offline_circuit();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let b = add_probe(&mut circuit, "b");
        wire_out_in(&mut circuit, src, b);
        circuit.enable_all();
        circuit.drain_events();

        circuit.despawn(src).unwrap();
        assert_eq!(circuit.graph().connection_count(), 0);
        assert_eq!(probe(&circuit, b).last_input, Signal::OFF);
        let events = circuit.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            CircuitEvent::ConnectionPruned { survivor: Some(n), .. } if *n == b
        )));
    }

    #[test]
    fn prune_notifies_upstream_survivors_too() {
        let mut circuit = offline_circuit();
        let nodes = chain(&mut circuit, 2);
        circuit.enable_all();
        let before = probe(&circuit, nodes[0]).refreshes;

        circuit.despawn(nodes[1]).unwrap();
        assert_eq!(probe(&circuit, nodes[0]).refreshes, before + 1);
    }

    // =======================================================================
    // Components
    // =======================================================================

    #[test]
    fn with_component_checks_kind() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        let label = circuit
            .with_component::<Probe, _>(a, |_, ctx| ctx.label().to_string())
            .unwrap();
        assert_eq!(label, "a");
        assert!(matches!(
            circuit.with_component::<Constant, _>(a, |_, _| ()),
            Err(CircuitError::KindMismatch(_))
        ));
        assert!(circuit.component(a).is_some());
    }

    #[test]
    fn refresh_requested_from_with_component_runs_after_check_in() {
        let mut circuit = offline_circuit();
        let a = add_probe(&mut circuit, "a");
        let b = add_probe(&mut circuit, "b");
        wire_out_in(&mut circuit, a, b);
        circuit.enable_all();
        let (a_before, b_before) = (probe(&circuit, a).refreshes, probe(&circuit, b).refreshes);
        let waves = circuit.engine().waves_started();

        circuit
            .with_component::<Probe, _>(a, |_, ctx| {
                let me = ctx.node();
                ctx.refresh(me);
                ctx.refresh(me);
            })
            .unwrap();

        // Duplicate requests collapse into one wave, and a's own hook ran.
        assert_eq!(circuit.engine().waves_started(), waves + 1);
        assert_eq!(probe(&circuit, a).refreshes, a_before + 1);
        assert_eq!(probe(&circuit, b).refreshes, b_before + 1);
    }

    // =======================================================================
    // Replication
    // =======================================================================

    /// Publishes its single gate as a full-power output.
    #[derive(Debug)]
    struct Latch {
        gate: voltaic_authority::AuthorityGate<bool>,
    }

    impl Component for Latch {
        fn kind(&self) -> &str {
            "latch"
        }

        fn layout(&self) -> &'static [crate::plug::PlugSpec] {
            SOURCE
        }

        fn read_output(&self, _plug: usize, _ctx: &crate::context::ReadContext<'_>) -> Signal {
            Signal::from_bool(*self.gate.value())
        }

        fn replicated_gates(&self) -> Vec<GateId> {
            vec![self.gate.id()]
        }

        fn replicated_mut(&mut self, gate: GateId) -> Option<&mut dyn voltaic_authority::Replicated> {
            (gate == self.gate.id()).then_some(&mut self.gate as &mut dyn voltaic_authority::Replicated)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn sync_drops_writes_from_non_authority() {
        use voltaic_authority::{GateWrite, LoopbackSession};

        let session = LoopbackSession::new(ParticipantId(0));
        let mut host = Circuit::new(session.join(ParticipantId(0)));
        let mut rogue = session.join(ParticipantId(1));
        let latch = host
            .add(
                "latch",
                Latch {
                    gate: voltaic_authority::AuthorityGate::new(GateId(1), false),
                },
            )
            .unwrap();
        host.enable(latch).unwrap();

        // Straight onto the transport, around the gate's own check.
        rogue.broadcast(GateWrite {
            gate: GateId(1),
            origin: ParticipantId(1),
            sequence: 0,
            payload: bitcode::serialize(&true).unwrap(),
        });
        assert_eq!(host.sync(), 0);
        assert_eq!(host.read_output_at(latch, 0), Signal::OFF);

        // The same write from the authority goes through.
        session.assign(GateId(1), ParticipantId(1));
        rogue.broadcast(GateWrite {
            gate: GateId(1),
            origin: ParticipantId(1),
            sequence: 0,
            payload: bitcode::serialize(&true).unwrap(),
        });
        assert_eq!(host.sync(), 1);
        assert_eq!(host.read_output_at(latch, 0).power, 1.0);
    }

    #[test]
    fn config_sizes_event_log() {
        let config = CircuitConfig {
            event_capacity: 4,
            ..CircuitConfig::default()
        };
        let circuit = Circuit::with_config(SessionLink::offline(ParticipantId(0)), config);
        assert_eq!(circuit.events().capacity(), 4);
        assert_eq!(circuit.local(), ParticipantId(0));
    }
}
