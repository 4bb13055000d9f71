//! An overload breaker with a replicated tripped latch.

use std::any::Any;

use voltaic_authority::{AuthorityError, AuthorityGate, GateId, Replicated, SessionTransport};
use voltaic_core::{
    Combine, Component, ComponentError, PlugSpec, ReadContext, RefreshContext, Signal,
};

const LAYOUT: &[PlugSpec] = &[
    PlugSpec::input("in").combine(Combine::Sum),
    PlugSpec::output("out"),
];

/// Sums every connection on its input and passes the total through until
/// the total reaches `power_to_break`. The authority then latches the
/// breaker tripped; it stays open until reset, even after the load drops.
#[derive(Debug)]
pub struct Breaker {
    power_to_break: f32,
    tripped: AuthorityGate<bool>,
}

impl Breaker {
    pub fn new(gate: GateId, power_to_break: f32) -> Self {
        Self {
            power_to_break,
            tripped: AuthorityGate::new(gate, false),
        }
    }

    pub fn power_to_break(&self) -> f32 {
        self.power_to_break
    }

    pub fn is_tripped(&self) -> bool {
        *self.tripped.value()
    }

    fn overloaded(&self, load: Signal) -> bool {
        load.power >= self.power_to_break
    }

    /// Close the breaker again. Authority only.
    pub fn reset(&self, session: &mut dyn SessionTransport) -> Result<(), AuthorityError> {
        self.tripped.set(session, false)
    }
}

impl Component for Breaker {
    fn kind(&self) -> &str {
        "breaker"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, ctx: &ReadContext<'_>) -> Signal {
        if self.is_tripped() {
            return Signal::OFF;
        }
        let load = ctx.input(0);
        if self.overloaded(load) { Signal::OFF } else { load }
    }

    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        let load = ctx.input(0);
        if self.is_tripped() || !self.overloaded(load) {
            return Ok(());
        }
        // Replicas without authority wait for the host's write.
        if ctx.has_authority(self.tripped.id()) {
            tracing::debug!(node = ?ctx.node(), load = load.power, "breaker tripped");
            self.tripped.set(ctx.session(), true)?;
        }
        Ok(())
    }

    fn replicated_gates(&self) -> Vec<GateId> {
        vec![self.tripped.id()]
    }

    fn replicated_mut(&mut self, gate: GateId) -> Option<&mut dyn Replicated> {
        if gate == self.tripped.id() {
            Some(&mut self.tripped)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
