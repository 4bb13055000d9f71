//! A door that opens for one color.

use std::any::Any;

use voltaic_authority::{AuthorityGate, GateId, Replicated};
use voltaic_core::{Component, ComponentError, PlugSpec, ReadContext, RefreshContext, Signal};

const LAYOUT: &[PlugSpec] = &[PlugSpec::input("color"), PlugSpec::output("open")];

/// Compares the RGB payload on its input with a target color. The first
/// participant whose replica sees a match claims the `unlocked` gate and
/// opens it; the lock then stays open.
#[derive(Debug)]
pub struct PasswordLock {
    target: [f32; 3],
    tolerance: f32,
    unlocked: AuthorityGate<bool>,
}

impl PasswordLock {
    pub fn new(gate: GateId, target: [f32; 3], tolerance: f32) -> Self {
        Self {
            target,
            tolerance,
            unlocked: AuthorityGate::new(gate, false),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        *self.unlocked.value()
    }

    /// Every channel within `tolerance` of the target.
    pub fn matches(&self, signal: Signal) -> bool {
        let Some(rgb) = signal.payload.and_then(|p| p.as_color()) else {
            return false;
        };
        rgb.iter()
            .zip(self.target)
            .all(|(c, t)| (c - t).abs() <= self.tolerance)
    }
}

impl Component for PasswordLock {
    fn kind(&self) -> &str {
        "password_lock"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, _ctx: &ReadContext<'_>) -> Signal {
        Signal::from_bool(self.is_unlocked())
    }

    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        if self.is_unlocked() || !self.matches(ctx.input(0)) {
            return Ok(());
        }
        if self.unlocked.try_claim(ctx.session()) {
            tracing::debug!(node = ?ctx.node(), "password accepted");
            self.unlocked.set(ctx.session(), true)?;
        }
        Ok(())
    }

    fn replicated_gates(&self) -> Vec<GateId> {
        vec![self.unlocked.id()]
    }

    fn replicated_mut(&mut self, gate: GateId) -> Option<&mut dyn Replicated> {
        if gate == self.unlocked.id() {
            Some(&mut self.unlocked)
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

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_authority::{LoopbackSession, ParticipantId};
    use voltaic_core::test_utils::*;
    use voltaic_core::{Circuit, NodeId};

    use crate::mixer::ColorMixer;

    const GATE: GateId = GateId(40);

    /// Three constants into a mixer into a lock.
    fn build(circuit: &mut Circuit, rgb: [f32; 3]) -> NodeId {
        let mixer = circuit.add("mixer", ColorMixer::new()).unwrap();
        for (channel, power) in ["r", "g", "b"].into_iter().zip(rgb) {
            let src = circuit.add(channel, Constant::new(power)).unwrap();
            let out = circuit.plug_named(src, "out").unwrap();
            let inp = circuit.plug_named(mixer, channel).unwrap();
            circuit.wire(out, inp, Default::default()).unwrap();
        }
        let lock = circuit
            .add("lock", PasswordLock::new(GATE, [1.0, 0.0, 0.5], 0.05))
            .unwrap();
        let out = circuit.plug_named(mixer, "out").unwrap();
        let inp = circuit.plug_named(lock, "color").unwrap();
        circuit.wire(out, inp, Default::default()).unwrap();
        lock
    }

    #[test]
    fn matching_color_unlocks() {
        let mut circuit = Circuit::offline();
        let lock = build(&mut circuit, [1.0, 0.02, 0.5]);
        circuit.enable_all();
        assert_eq!(circuit.read_output_at(lock, 1), Signal::OFF);

        assert_eq!(circuit.sync(), 1);
        assert!(circuit.component_as::<PasswordLock>(lock).unwrap().is_unlocked());
        assert_eq!(circuit.read_output_at(lock, 1).power, 1.0);
    }

    #[test]
    fn wrong_color_stays_locked() {
        let mut circuit = Circuit::offline();
        let lock = build(&mut circuit, [1.0, 0.2, 0.5]);
        circuit.enable_all();
        assert_eq!(circuit.sync(), 0);
        assert!(!circuit.component_as::<PasswordLock>(lock).unwrap().is_unlocked());
    }

    #[test]
    fn first_refresher_claims_the_gate() {
        let session = LoopbackSession::new(ParticipantId(0));
        let mut client = Circuit::new(session.join(ParticipantId(7)));
        let mut host = Circuit::new(session.join(ParticipantId(0)));
        let client_lock = build(&mut client, [1.0, 0.0, 0.5]);
        let host_lock = build(&mut host, [1.0, 0.0, 0.5]);

        client.enable_all();
        assert_eq!(session.authority_of(GATE), Some(ParticipantId(7)));
        host.enable_all();

        client.sync();
        host.sync();
        assert!(client.component_as::<PasswordLock>(client_lock).unwrap().is_unlocked());
        assert!(host.component_as::<PasswordLock>(host_lock).unwrap().is_unlocked());
        assert!(!host.session().has_authority(GATE));
    }
}
