use serde::{Deserialize, Serialize};

/// Engine tuning. Every field has a default, so partial config sections in
/// scene files are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Catch panics raised by a component hook and treat them as that node's
    /// failure instead of unwinding through the wave.
    pub contain_panics: bool,
    /// Capacity of the event ring buffer.
    pub event_capacity: usize,
    /// Log a warning the first time a read meets an orphaned connection.
    pub warn_on_orphans: bool,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            contain_panics: true,
            event_capacity: 256,
            warn_on_orphans: true,
        }
    }
}
