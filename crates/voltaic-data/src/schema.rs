//! On-disk scene structs.

use serde::Deserialize;
use voltaic_core::{CircuitConfig, ConnectionKind};
use voltaic_gates::LogicOp;

/// A whole scene file.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneData {
    /// Engine settings; omitted fields keep their defaults.
    #[serde(default)]
    pub config: Option<CircuitConfig>,
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub wires: Vec<WireData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneNode {
    /// Unique within the scene; wires refer to it.
    pub name: String,
    pub component: ComponentData,
    /// Enable once the scene is wired.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Behavior of one node. Gate ids must match on every participant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentData {
    Switch {
        gate: u32,
        #[serde(default)]
        on: bool,
    },
    Source {
        power: f32,
        #[serde(default)]
        color: Option<[f32; 3]>,
    },
    Logic {
        op: LogicOp,
    },
    Breaker {
        gate: u32,
        power_to_break: f32,
    },
    Lamp {
        #[serde(default)]
        threshold: Option<f32>,
    },
    ColorMixer,
    PasswordLock {
        gate: u32,
        target: [f32; 3],
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },
}

fn default_tolerance() -> f32 {
    0.05
}

/// A connection between two `"node.plug"` references, in either order.
/// The plug part is a label or a layout index.
#[derive(Debug, Clone, Deserialize)]
pub struct WireData {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub kind: ConnectionKind,
}
