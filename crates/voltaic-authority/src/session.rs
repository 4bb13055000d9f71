//! Session transport: authority lookup and reliable broadcast of gate writes.
//!
//! The real network layer lives outside this workspace. [`SessionTransport`]
//! is the boundary it must satisfy; [`LoopbackSession`] is an in-process
//! implementation where every participant's inbox is a channel.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::{GateId, ParticipantId};

// ---------------------------------------------------------------------------
// Wire message
// ---------------------------------------------------------------------------

/// An accepted write, fanned out to every participant (the writer included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateWrite {
    pub gate: GateId,
    /// The participant that originated the write.
    pub origin: ParticipantId,
    /// Session-wide broadcast order. Used to drop duplicate or stale deliveries.
    pub sequence: u64,
    /// The new value, encoded with `bitcode`.
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Transport contract
// ---------------------------------------------------------------------------

/// What the engine needs from the distributed-session layer.
pub trait SessionTransport: std::fmt::Debug {
    /// The participant this transport speaks for.
    fn local(&self) -> ParticipantId;

    /// Who currently holds authority for `gate`, if anyone.
    fn authority_of(&self, gate: GateId) -> Option<ParticipantId>;

    /// Bind an unassigned gate to the local participant. Returns `true` if the
    /// local participant holds authority afterwards.
    fn try_claim(&mut self, gate: GateId) -> bool;

    /// Reliably deliver `write` to every participant, including the local one.
    /// The transport assigns `write.sequence`.
    fn broadcast(&mut self, write: GateWrite);

    /// Drain writes delivered to the local participant, in broadcast order.
    fn poll(&mut self) -> Vec<GateWrite>;

    /// Whether the local participant holds authority for `gate`.
    fn has_authority(&self, gate: GateId) -> bool {
        self.authority_of(gate) == Some(self.local())
    }
}

// ---------------------------------------------------------------------------
// Loopback session
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Hub {
    host: ParticipantId,
    owners: BTreeMap<GateId, ParticipantId>,
    inboxes: BTreeMap<ParticipantId, Sender<GateWrite>>,
    next_sequence: u64,
}

/// An in-process session. Cloning yields another handle to the same session.
///
/// Gates without an explicit owner are authoritative on the host until some
/// participant claims them.
#[derive(Debug, Clone)]
pub struct LoopbackSession {
    hub: Rc<RefCell<Hub>>,
}

impl LoopbackSession {
    /// Create a session whose host is `host`. The host still has to [`join`](Self::join).
    pub fn new(host: ParticipantId) -> Self {
        Self {
            hub: Rc::new(RefCell::new(Hub {
                host,
                owners: BTreeMap::new(),
                inboxes: BTreeMap::new(),
                next_sequence: 0,
            })),
        }
    }

    /// The session host.
    pub fn host(&self) -> ParticipantId {
        self.hub.borrow().host
    }

    /// Join `participant`, returning its transport. Re-joining replaces the
    /// previous inbox; writes queued on the old one are lost.
    pub fn join(&self, participant: ParticipantId) -> SessionLink {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.hub.borrow_mut().inboxes.insert(participant, tx);
        tracing::debug!(%participant, "joined loopback session");
        SessionLink {
            local: participant,
            hub: Rc::clone(&self.hub),
            inbox: rx,
        }
    }

    /// Explicitly assign authority for `gate`.
    pub fn assign(&self, gate: GateId, participant: ParticipantId) {
        self.hub.borrow_mut().owners.insert(gate, participant);
    }

    /// Current authority for `gate`.
    pub fn authority_of(&self, gate: GateId) -> Option<ParticipantId> {
        let hub = self.hub.borrow();
        Some(hub.owners.get(&gate).copied().unwrap_or(hub.host))
    }

    /// Participants currently joined, in id order.
    pub fn participants(&self) -> Vec<ParticipantId> {
        self.hub.borrow().inboxes.keys().copied().collect()
    }
}

/// One participant's end of a [`LoopbackSession`].
#[derive(Debug)]
pub struct SessionLink {
    local: ParticipantId,
    hub: Rc<RefCell<Hub>>,
    inbox: Receiver<GateWrite>,
}

impl SessionLink {
    /// A single-player session where `participant` is host and sole member.
    pub fn offline(participant: ParticipantId) -> Self {
        LoopbackSession::new(participant).join(participant)
    }

    /// A handle to the session this link belongs to.
    pub fn session(&self) -> LoopbackSession {
        LoopbackSession {
            hub: Rc::clone(&self.hub),
        }
    }

    /// Number of writes waiting in this participant's inbox.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

impl SessionTransport for SessionLink {
    fn local(&self) -> ParticipantId {
        self.local
    }

    fn authority_of(&self, gate: GateId) -> Option<ParticipantId> {
        let hub = self.hub.borrow();
        Some(hub.owners.get(&gate).copied().unwrap_or(hub.host))
    }

    fn try_claim(&mut self, gate: GateId) -> bool {
        let mut hub = self.hub.borrow_mut();
        let owner = *hub.owners.entry(gate).or_insert(self.local);
        owner == self.local
    }

    fn broadcast(&mut self, mut write: GateWrite) {
        let mut hub = self.hub.borrow_mut();
        write.sequence = hub.next_sequence;
        hub.next_sequence += 1;
        // Drop inboxes whose link is gone.
        hub.inboxes.retain(|participant, tx| match tx.send(write.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(%participant, "participant left; dropping inbox");
                false
            }
        });
    }

    fn poll(&mut self) -> Vec<GateWrite> {
        self.inbox.try_iter().collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
