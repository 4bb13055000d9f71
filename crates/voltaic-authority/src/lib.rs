//! Single-writer replicated values for the Voltaic circuit engine.
//!
//! A distributed session has exactly one participant allowed to originate a
//! write to any given shared value. [`AuthorityGate`] wraps such a value:
//! the authority broadcasts writes through a [`SessionTransport`], and every
//! participant (the writer included) observes the change only once the write
//! is delivered back to it. Observers never special-case "I am the
//! authority"; single-player and networked code paths are identical.
//!
//! # Key Types
//!
//! - [`AuthorityGate`] -- a replicated value with channel listeners.
//! - [`SessionTransport`] -- the consumed interface of the session layer:
//!   authority lookup, reliable broadcast, participant identity.
//! - [`LoopbackSession`] / [`SessionLink`] -- an in-process, reliable, FIFO
//!   session used for single-player and for tests.

pub mod gate;
pub mod session;

use serde::{Deserialize, Serialize};

pub use gate::{AuthorityError, AuthorityGate, Change, GateListener, ListenerId, Replicated};
pub use session::{GateWrite, LoopbackSession, SessionLink, SessionTransport};

/// Identifies a participant in a session. Stable for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u32);

/// Identifies a replicated gate. Assigned by level data, identical on every
/// participant's replica of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GateId(pub u32);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "participant#{}", self.0)
    }
}

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gate#{}", self.0)
    }
}
