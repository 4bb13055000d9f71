//! Three power channels combined into one RGB payload.

use std::any::Any;

use voltaic_core::{Component, Payload, PlugSpec, ReadContext, Signal};

const LAYOUT: &[PlugSpec] = &[
    PlugSpec::input("r"),
    PlugSpec::input("g"),
    PlugSpec::input("b"),
    PlugSpec::output("out"),
];

/// Each input's power, clamped to `0..=1`, becomes one color channel. The
/// output power is the brightest channel.
#[derive(Debug, Clone, Default)]
pub struct ColorMixer;

impl ColorMixer {
    pub fn new() -> Self {
        Self
    }

    /// The color a set of channel powers mixes to.
    pub fn mix(channels: [f32; 3]) -> Signal {
        let rgb = channels.map(|c| c.clamp(0.0, 1.0));
        let power = rgb.iter().copied().fold(0.0, f32::max);
        if power > 0.0 {
            Signal::new(power).with_payload(Payload::Color(rgb))
        } else {
            Signal::OFF
        }
    }
}

impl Component for ColorMixer {
    fn kind(&self) -> &str {
        "color_mixer"
    }

    fn layout(&self) -> &'static [PlugSpec] {
        LAYOUT
    }

    fn read_output(&self, _plug: usize, ctx: &ReadContext<'_>) -> Signal {
        Self::mix([ctx.input(0).power, ctx.input(1).power, ctx.input(2).power])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
