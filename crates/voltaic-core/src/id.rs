use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a node (circuit component) in the circuit graph.
    pub struct NodeId;

    /// Identifies a plug (input or output terminal) owned by one node.
    pub struct PlugId;

    /// Identifies a connection between an output plug and an input plug.
    pub struct ConnectionId;
}

/// Identifies one propagation wave. Zero means "never visited".
///
/// 64 bits cannot realistically wrap within a session, so a stale epoch is
/// never mistaken for the current one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Epoch(pub u64);

impl Epoch {
    pub const NEVER: Epoch = Epoch(0);
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_default_is_never() {
        assert_eq!(Epoch::default(), Epoch::NEVER);
    }

    #[test]
    fn epochs_order_by_value() {
        assert!(Epoch(1) < Epoch(2));
        assert_eq!(Epoch(7).to_string(), "epoch#7");
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut sm = slotmap::SlotMap::<NodeId, ()>::with_key();
        let a = sm.insert(());
        let mut map = HashMap::new();
        map.insert(a, "switch");
        assert_eq!(map[&a], "switch");
    }
}
