//! [`AuthorityGate`]: a value only the authority may write, observed by all.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::session::{GateWrite, SessionTransport};
use crate::{GateId, ParticipantId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by gate writes and deliveries.
#[derive(Debug, thiserror::Error)]
pub enum AuthorityError {
    /// A participant without authority tried to write.
    #[error("{caller} is not the authority for {gate} (owner: {owner:?})")]
    NotAuthority {
        gate: GateId,
        caller: ParticipantId,
        owner: Option<ParticipantId>,
    },
    /// A write was routed to the wrong gate.
    #[error("write for {write} delivered to {gate}")]
    Misrouted { gate: GateId, write: GateId },
    /// The value could not be encoded for broadcast.
    #[error("encode failed for {gate}: {detail}")]
    Encode { gate: GateId, detail: String },
    /// A delivered payload could not be decoded.
    #[error("decode failed for {gate}: {detail}")]
    Decode { gate: GateId, detail: String },
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A delivered change, observed by every listener exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

/// Identifies a listener on one gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Receiving end of a gate subscription. Dropping it unsubscribes lazily.
#[derive(Debug)]
pub struct GateListener<T> {
    id: ListenerId,
    gate: GateId,
    rx: Receiver<Change<T>>,
}

impl<T> GateListener<T> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn gate(&self) -> GateId {
        self.gate
    }

    /// Next pending change, if any.
    pub fn try_next(&self) -> Option<Change<T>> {
        self.rx.try_recv().ok()
    }

    /// All pending changes, oldest first.
    pub fn drain(&self) -> Vec<Change<T>> {
        self.rx.try_iter().collect()
    }

    /// `true` once the gate has dropped this subscription.
    pub fn is_detached(&self) -> bool {
        self.rx.is_empty() && matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[derive(Debug)]
struct Subscriber<T> {
    id: ListenerId,
    tx: Sender<Change<T>>,
}

// ---------------------------------------------------------------------------
// AuthorityGate
// ---------------------------------------------------------------------------

/// A replicated value with a single writer.
///
/// `set` never touches the local value: it checks authority and broadcasts.
/// The value is swapped in [`apply`](AuthorityGate::apply) when the write is
/// delivered, so readers see either the old or the new value, and the writer
/// observes its own write through the same listeners as everyone else.
///
/// Writes equal to the current value are delivered but are not changes: they
/// notify nobody.
#[derive(Debug)]
pub struct AuthorityGate<T> {
    id: GateId,
    value: T,
    last_sequence: Option<u64>,
    subscribers: Vec<Subscriber<T>>,
    next_listener: u64,
}

impl<T> AuthorityGate<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned,
{
    pub fn new(id: GateId, initial: T) -> Self {
        Self {
            id,
            value: initial,
            last_sequence: None,
            subscribers: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    /// The last value delivered to this replica.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Whether the local participant of `link` may write this gate.
    pub fn is_authority(&self, link: &dyn SessionTransport) -> bool {
        link.has_authority(self.id)
    }

    /// Bind this gate to the local participant if nobody owns it yet.
    pub fn try_claim(&self, link: &mut dyn SessionTransport) -> bool {
        link.try_claim(self.id)
    }

    /// Broadcast `new` if the local participant is the authority.
    ///
    /// A rejected write is logged and leaves every replica untouched.
    pub fn set(&self, link: &mut dyn SessionTransport, new: T) -> Result<(), AuthorityError> {
        let caller = link.local();
        if !link.has_authority(self.id) {
            let owner = link.authority_of(self.id);
            tracing::warn!(gate = %self.id, %caller, ?owner, "rejected non-authoritative write");
            return Err(AuthorityError::NotAuthority {
                gate: self.id,
                caller,
                owner,
            });
        }
        let payload = bitcode::serialize(&new).map_err(|e| AuthorityError::Encode {
            gate: self.id,
            detail: e.to_string(),
        })?;
        link.broadcast(GateWrite {
            gate: self.id,
            origin: caller,
            sequence: 0,
            payload,
        });
        Ok(())
    }

    /// Register a channel listener. Every later change is queued on it once.
    pub fn subscribe(&mut self) -> GateListener<T> {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(Subscriber { id, tx });
        GateListener {
            id,
            gate: self.id,
            rx,
        }
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Drop every listener.
    pub fn unsubscribe_all(&mut self) {
        self.subscribers.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver a broadcast write to this replica.
    ///
    /// Returns `Ok(true)` if the value changed (listeners were notified),
    /// `Ok(false)` for equal values and stale or duplicate sequences.
    pub fn apply(&mut self, write: &GateWrite) -> Result<bool, AuthorityError> {
        if write.gate != self.id {
            return Err(AuthorityError::Misrouted {
                gate: self.id,
                write: write.gate,
            });
        }
        if self.last_sequence.is_some_and(|seen| write.sequence <= seen) {
            tracing::trace!(gate = %self.id, sequence = write.sequence, "stale write ignored");
            return Ok(false);
        }
        let new: T = bitcode::deserialize(&write.payload).map_err(|e| AuthorityError::Decode {
            gate: self.id,
            detail: e.to_string(),
        })?;
        self.last_sequence = Some(write.sequence);
        if new == self.value {
            return Ok(false);
        }
        let old = std::mem::replace(&mut self.value, new);
        let change = Change {
            old,
            new: self.value.clone(),
        };
        // Dropped listeners unsubscribe here.
        self.subscribers
            .retain(|s| s.tx.send(change.clone()).is_ok());
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Type-erased delivery
// ---------------------------------------------------------------------------

/// Object-safe view of a gate, used to route writes without knowing `T`.
pub trait Replicated {
    fn gate_id(&self) -> GateId;
    fn apply_write(&mut self, write: &GateWrite) -> Result<bool, AuthorityError>;
}

impl<T> Replicated for AuthorityGate<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned,
{
    fn gate_id(&self) -> GateId {
        self.id
    }

    fn apply_write(&mut self, write: &GateWrite) -> Result<bool, AuthorityError> {
        self.apply(write)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
