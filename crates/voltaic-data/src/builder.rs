//! Turns parsed scene data into a live [`Circuit`].

use std::collections::BTreeMap;

use voltaic_authority::{GateId, SessionTransport};
use voltaic_core::{Circuit, Component, NodeId, Payload, PlugId};
use voltaic_gates::{Breaker, ColorMixer, Lamp, LogicGate, PasswordLock, Source, Switch};

use crate::loader::SceneError;
use crate::schema::{ComponentData, SceneData};

/// A built scene and its name table.
#[derive(Debug)]
pub struct BuiltScene {
    pub circuit: Circuit,
    pub nodes: BTreeMap<String, NodeId>,
}

impl BuiltScene {
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name).copied()
    }
}

/// Instantiate the behavior a node entry describes.
pub fn component_from_data(data: &ComponentData) -> Box<dyn Component> {
    match data {
        ComponentData::Switch { gate, on } => Box::new(Switch::with_position(GateId(*gate), *on)),
        ComponentData::Source { power, color } => match color {
            Some(rgb) => Box::new(Source::with_payload(*power, Payload::Color(*rgb))),
            None => Box::new(Source::new(*power)),
        },
        ComponentData::Logic { op } => Box::new(LogicGate::new(*op)),
        ComponentData::Breaker {
            gate,
            power_to_break,
        } => Box::new(Breaker::new(GateId(*gate), *power_to_break)),
        ComponentData::Lamp { threshold } => match threshold {
            Some(t) => Box::new(Lamp::with_threshold(*t)),
            None => Box::new(Lamp::new()),
        },
        ComponentData::ColorMixer => Box::new(ColorMixer::new()),
        ComponentData::PasswordLock {
            gate,
            target,
            tolerance,
        } => Box::new(PasswordLock::new(GateId(*gate), *target, *tolerance)),
    }
}

/// Build the scene for one participant.
///
/// Nodes are added in file order, then wired, then the ones marked
/// `enabled` are enabled in file order.
pub fn build_scene(
    data: &SceneData,
    session: impl SessionTransport + 'static,
) -> Result<BuiltScene, SceneError> {
    let config = data.config.clone().unwrap_or_default();
    let mut circuit = Circuit::with_config(session, config);
    let mut nodes = BTreeMap::new();

    for entry in &data.nodes {
        if nodes.contains_key(&entry.name) {
            return Err(SceneError::DuplicateName {
                name: entry.name.clone(),
            });
        }
        let node = circuit.add_component(entry.name.clone(), component_from_data(&entry.component))?;
        nodes.insert(entry.name.clone(), node);
    }

    for wire in &data.wires {
        let from = resolve_plug(&circuit, &nodes, &wire.from)?;
        let to = resolve_plug(&circuit, &nodes, &wire.to)?;
        circuit.wire(from, to, wire.kind)?;
    }

    for entry in data.nodes.iter().filter(|n| n.enabled) {
        circuit.enable(nodes[&entry.name])?;
    }

    tracing::debug!(
        nodes = nodes.len(),
        wires = data.wires.len(),
        participant = %circuit.local(),
        "scene built"
    );
    Ok(BuiltScene { circuit, nodes })
}

/// Resolve `"node.plug"`, where the plug is a label or a layout index.
fn resolve_plug(
    circuit: &Circuit,
    nodes: &BTreeMap<String, NodeId>,
    reference: &str,
) -> Result<PlugId, SceneError> {
    let (node_name, plug) = reference
        .rsplit_once('.')
        .ok_or_else(|| SceneError::MalformedRef {
            reference: reference.to_string(),
        })?;
    let node = *nodes
        .get(node_name)
        .ok_or_else(|| SceneError::UnresolvedNode {
            reference: reference.to_string(),
        })?;
    circuit
        .plug_named(node, plug)
        .ok()
        .or_else(|| {
            let index = plug.parse::<usize>().ok()?;
            circuit.plug(node, index).ok()
        })
        .ok_or_else(|| SceneError::UnresolvedPlug {
            reference: reference.to_string(),
        })
}
