//! Constant power supply.

use std::any::Any;

use voltaic_core::{Component, Payload, PlugSpec, ReadContext, Signal};

const LAYOUT: &[PlugSpec] = &[PlugSpec::output("out")];

/// Always outputs the same signal: a battery, a generator, a color emitter.
#[derive(Debug, Clone)]
pub struct Source {
    signal: Signal,
}

impl Source {
    pub fn new(power: f32) -> Self {
        Self {
            signal: Signal::new(power),
        }
    }

    pub fn with_payload(power: f32, payload: Payload) -> Self {
        Self {
            signal: Signal::new(power).with_payload(payload),
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }
}

impl Component for Source {
    fn kind(&self) -> &str {
        "source"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, _ctx: &ReadContext<'_>) -> Signal {
        self.signal
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
