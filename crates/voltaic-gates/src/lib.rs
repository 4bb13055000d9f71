//! Concrete circuit behaviors for the Voltaic engine.
//!
//! Every type here implements [`voltaic_core::Component`]; the engine knows
//! nothing about them. Behaviors that hold shared, externally visible state
//! (a switch position, a tripped breaker, an unlocked door) keep it in an
//! [`AuthorityGate`](voltaic_authority::AuthorityGate), so only the
//! authoritative participant originates changes and every replica reacts to
//! the same delivered writes.
//!
//! # Key Types
//!
//! - [`Switch`] -- gate-backed actuator with one output.
//! - [`Source`] -- constant power supply.
//! - [`LogicGate`] -- boolean gate over one fan-in input.
//! - [`Breaker`] -- summing input that trips and latches when overloaded.
//! - [`Lamp`] -- caches its lit state and reports changes as events.
//! - [`ColorMixer`] / [`PasswordLock`] -- RGB payload producer and checker.

pub mod breaker;
pub mod lamp;
pub mod lock;
pub mod logic;
pub mod mixer;
pub mod source;
pub mod switch;

pub use breaker::Breaker;
pub use lamp::Lamp;
pub use lock::PasswordLock;
pub use logic::{LogicGate, LogicOp};
pub use mixer::ColorMixer;
pub use source::Source;
pub use switch::{Switch, set_switch};

use voltaic_authority::AuthorityError;
use voltaic_core::CircuitError;

/// Errors raised when a host actuates a behavior.
#[derive(Debug, thiserror::Error)]
pub enum ActuateError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error(transparent)]
    Authority(#[from] AuthorityError),
}
