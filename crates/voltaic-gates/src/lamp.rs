//! A light that remembers whether it is lit.

use std::any::Any;

use voltaic_core::{
    CircuitEvent, Component, ComponentError, PlugSpec, ReadContext, RefreshContext, Signal,
};

const LAYOUT: &[PlugSpec] = &[PlugSpec::input("in"), PlugSpec::output("lit")];

/// Lights when its input reaches `threshold`.
///
/// The lit state is computed in the refresh hook and cached; the `lit`
/// output reports the cached value. A wave that reaches a downstream node
/// before this lamp therefore sees last wave's state.
#[derive(Debug, Clone)]
pub struct Lamp {
    threshold: f32,
    lit: bool,
    color: Option<[f32; 3]>,
}

impl Default for Lamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Lamp {
    /// Lights on any power.
    pub fn new() -> Self {
        Self::with_threshold(f32::MIN_POSITIVE)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            lit: false,
            color: None,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Color carried by the last input, if any.
    pub fn color(&self) -> Option<[f32; 3]> {
        self.color
    }
}

impl Component for Lamp {
    fn kind(&self) -> &str {
        "lamp"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, _ctx: &ReadContext<'_>) -> Signal {
        Signal::from_bool(self.lit)
    }

    fn on_refresh(&mut self, ctx: &mut RefreshContext<'_>) -> Result<(), ComponentError> {
        let input = ctx.input(0);
        self.color = input.payload.and_then(|p| p.as_color());
        let lit = input.power >= self.threshold;
        if lit != self.lit {
            self.lit = lit;
            ctx.emit(CircuitEvent::OutputChanged {
                node: ctx.node(),
                powered: lit,
            });
        }
        Ok(())
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
    use voltaic_core::Circuit;
    use voltaic_core::test_utils::*;

    #[test]
    fn lights_and_reports_once() {
        let mut circuit = Circuit::offline();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let lamp = circuit.add("lamp", Lamp::new()).unwrap();
        wire_out_in(&mut circuit, src, lamp);
        circuit.enable_all();

        assert!(circuit.component_as::<Lamp>(lamp).unwrap().is_lit());
        circuit.refresh(src);
        let changes: Vec<_> = circuit
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CircuitEvent::OutputChanged { .. }))
            .collect();
        assert_eq!(
            changes,
            vec![CircuitEvent::OutputChanged {
                node: lamp,
                powered: true
            }]
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut circuit = Circuit::offline();
        let src = circuit.add("src", Constant::new(0.5)).unwrap();
        let dim = circuit.add("dim", Lamp::with_threshold(0.5)).unwrap();
        let bright = circuit.add("bright", Lamp::with_threshold(0.6)).unwrap();
        wire_out_in(&mut circuit, src, dim);
        wire_out_in(&mut circuit, src, bright);
        circuit.enable_all();

        assert!(circuit.component_as::<Lamp>(dim).unwrap().is_lit());
        assert!(!circuit.component_as::<Lamp>(bright).unwrap().is_lit());
    }

    #[test]
    fn output_reports_cached_state() {
        let mut circuit = Circuit::offline();
        let src = circuit.add("src", Constant::new(1.0)).unwrap();
        let lamp = circuit.add("lamp", Lamp::new()).unwrap();
        wire_out_in(&mut circuit, src, lamp);
        // Not enabled: no hook has run, so the cached state is still off.
        assert_eq!(circuit.read_output_at(lamp, 1), Signal::OFF);
        circuit.enable(lamp).unwrap();
        assert_eq!(circuit.read_output_at(lamp, 1).power, 1.0);
    }
}
