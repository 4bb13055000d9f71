//! The value carried on a wire, and fan-in combination policies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Typed data riding on a signal. Opaque to the engine; the producing and
/// consuming components agree on its shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Bool(bool),
    Int(i64),
    Scalar(f32),
    /// Three channels, e.g. an RGB color password.
    Color([f32; 3]),
}

impl Payload {
    pub fn as_color(&self) -> Option<[f32; 3]> {
        match self {
            Payload::Color(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A power level plus an optional payload. Copied, never shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub power: f32,
    pub payload: Option<Payload>,
}

impl Signal {
    /// No power, no payload. What a broken or absent wire reads as.
    pub const OFF: Signal = Signal {
        power: 0.0,
        payload: None,
    };

    pub fn new(power: f32) -> Self {
        Self {
            power,
            payload: None,
        }
    }

    /// Full power (1.0) when `on`, otherwise [`Signal::OFF`].
    pub fn from_bool(on: bool) -> Self {
        if on { Self::new(1.0) } else { Self::OFF }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_powered(&self) -> bool {
        self.power > 0.0
    }
}

// ---------------------------------------------------------------------------
// Combine
// ---------------------------------------------------------------------------

/// How an input plug reduces its fan-in to one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combine {
    /// Strongest connection wins; ties go to the earliest connection.
    #[default]
    MaxPower,
    /// Powers are added; the payload comes from the first powered connection.
    Sum,
    /// First powered connection, else [`Signal::OFF`].
    AnyPowered,
}

impl Combine {
    /// Reduce signals given in connection order. No signals reads as `OFF`.
    pub fn reduce<I>(self, signals: I) -> Signal
    where
        I: IntoIterator<Item = Signal>,
    {
        let mut signals = signals.into_iter();
        match self {
            Combine::MaxPower => {
                let Some(first) = signals.next() else {
                    return Signal::OFF;
                };
                signals.fold(first, |best, s| if s.power > best.power { s } else { best })
            }
            Combine::Sum => {
                let mut out = Signal::OFF;
                for s in signals {
                    out.power += s.power;
                    if out.payload.is_none() && s.is_powered() {
                        out.payload = s.payload;
                    }
                }
                out
            }
            Combine::AnyPowered => signals.find(Signal::is_powered).unwrap_or(Signal::OFF),
        }
    }
}
