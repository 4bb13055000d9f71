//! Push-notify / pull-recompute propagation over cyclic graphs.
//!
//! A wave starts at one node and walks Output -> Input edges depth-first in
//! insertion order. Each node is processed at most once per wave: its
//! `last_epoch_visited` is stamped with the wave's epoch before its hook runs,
//! so a loop in the wiring ends the walk instead of recursing forever.
//!
//! Values are never pushed. A visited node's hook pulls whatever it needs
//! through its context, so visiting a node before one of its feeders is
//! self-correcting for lazily computed outputs. A component that caches a
//! derived value inside its hook can observe a value one wave stale in
//! diamond-shaped wiring; that lag is kept as-is.
//!
//! A hook that asks for another refresh does not start a second wave. The
//! requested node joins the wave already running, under the same epoch, so
//! every node's hook runs at most once per top-level trigger.

use std::panic::{self, AssertUnwindSafe};

use crate::circuit::Circuit;
use crate::context::RefreshContext;
use crate::event::CircuitEvent;
use crate::id::{Epoch, NodeId};

// ---------------------------------------------------------------------------
// PropagationEngine
// ---------------------------------------------------------------------------

/// Owns the epoch counter for one scene. No global state.
#[derive(Debug, Default)]
pub struct PropagationEngine {
    current: Epoch,
    /// 1 while a wave is running, 0 otherwise.
    depth: usize,
    /// Nodes hooks asked to refresh, not yet taken into a wave.
    scheduled: Vec<NodeId>,
}

impl PropagationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the epoch for a new wave. The only mutator of the counter.
    pub fn next_epoch(&mut self) -> Epoch {
        self.current = Epoch(self.current.0 + 1);
        self.current
    }

    /// The most recently allocated epoch.
    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Number of waves started so far.
    pub fn waves_started(&self) -> u64 {
        self.current.0
    }

    /// Waves in flight right now.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn schedule(&mut self, node: NodeId) {
        if !self.scheduled.contains(&node) {
            self.scheduled.push(node);
        }
    }

    pub(crate) fn take_scheduled(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.scheduled)
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// WaveReport
// ---------------------------------------------------------------------------

/// A hook that failed during a wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    pub node: NodeId,
    pub message: String,
}

/// What one call to [`Circuit::refresh`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveReport {
    pub epoch: Epoch,
    pub origin: NodeId,
    /// Every node stamped with this epoch, in visit order.
    pub visited: Vec<NodeId>,
    /// Visited nodes whose hook did not run (disabled, or checked out).
    pub skipped: Vec<NodeId>,
    pub failures: Vec<NodeFailure>,
}

impl WaveReport {
    fn new(epoch: Epoch, origin: NodeId) -> Self {
        Self {
            epoch,
            origin,
            visited: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn was_visited(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum HookOutcome {
    Ran,
    Skipped,
    Failed(String),
}

// ---------------------------------------------------------------------------
// The wave
// ---------------------------------------------------------------------------

impl Circuit {
    /// Run one propagation wave from `start`.
    ///
    /// Always returns normally: hook failures are contained per node and
    /// reported. Hooks request further refreshes through
    /// [`RefreshContext::refresh`]; those join this wave.
    pub fn refresh(&mut self, start: NodeId) -> WaveReport {
        debug_assert_eq!(self.engine.depth(), 0, "refresh started inside a wave");
        let epoch = self.engine.next_epoch();
        self.engine.enter();
        let mut report = WaveReport::new(epoch, start);

        // Explicit stack; children pushed in reverse keep recursive pre-order.
        let mut pending = vec![start];
        while let Some(node) = pending.pop() {
            let Some(data) = self.graph.node_mut(node) else {
                continue;
            };
            if data.last_epoch_visited == epoch {
                continue;
            }
            data.last_epoch_visited = epoch;
            let enabled = data.enabled;
            report.visited.push(node);
            tracing::trace!(?node, %epoch, enabled, "visit");

            if enabled {
                match self.run_hook(node, epoch) {
                    HookOutcome::Ran => {}
                    HookOutcome::Skipped => report.skipped.push(node),
                    HookOutcome::Failed(message) => {
                        self.record_failure(node, epoch, &message);
                        report.failures.push(NodeFailure { node, message });
                    }
                }
            } else {
                report.skipped.push(node);
            }

            pending.extend(self.graph.downstream(node).into_iter().rev());
            // Requests made by the hook go ahead of its fan-out.
            pending.extend(self.engine.take_scheduled().into_iter().rev());
        }

        self.engine.leave();
        tracing::debug!(
            origin = ?start,
            %epoch,
            visited = report.visited.len(),
            failures = report.failures.len(),
            "wave complete"
        );
        self.events.push(CircuitEvent::WaveCompleted {
            epoch,
            origin: start,
            visited: report.visited.len(),
        });
        report
    }

    /// Check the component out, run its hook, check it back in.
    fn run_hook(&mut self, node: NodeId, epoch: Epoch) -> HookOutcome {
        let Some(slot) = self.components.get_mut(node) else {
            return HookOutcome::Skipped;
        };
        let Some(mut component) = slot.take() else {
            tracing::trace!(?node, %epoch, "hook already running; skipped");
            return HookOutcome::Skipped;
        };

        let contain = self.config().contain_panics;
        let outcome = {
            let mut ctx = RefreshContext {
                circuit: self,
                node,
                epoch,
            };
            if contain {
                match panic::catch_unwind(AssertUnwindSafe(|| component.on_refresh(&mut ctx))) {
                    Ok(Ok(())) => HookOutcome::Ran,
                    Ok(Err(e)) => HookOutcome::Failed(e.to_string()),
                    Err(payload) => HookOutcome::Failed(panic_message(payload.as_ref())),
                }
            } else {
                match component.on_refresh(&mut ctx) {
                    Ok(()) => HookOutcome::Ran,
                    Err(e) => HookOutcome::Failed(e.to_string()),
                }
            }
        };

        // The hook may have despawned its own node.
        if let Some(slot) = self.components.get_mut(node) {
            *slot = Some(component);
        }
        outcome
    }

    fn record_failure(&mut self, node: NodeId, epoch: Epoch, message: &str) {
        let label = self.graph.node(node).map_or("", |n| n.label.as_str());
        tracing::warn!(?node, label, %epoch, error = message, "component hook failed; wave continues");
        self.events.push(CircuitEvent::NodeFailed {
            node,
            epoch,
            message: message.to_string(),
        });
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
