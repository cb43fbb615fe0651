//! Opaque ID newtypes for netlist entities.
//!
//! Each ID is a thin `u32` wrapper created by [`Arena::alloc`](crate::arena::Arena::alloc)
//! and used for O(1) lookup. IDs are `Ord`: the mapper's determinism rules
//! require every result-affecting traversal to run in sorted ID order, and
//! the raw allocation index is the canonical order.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a single-bit signal within a module.
    SignalId
);

define_id!(
    /// Opaque, copyable ID for a cell within a module.
    CellId
);

define_id!(
    /// Opaque, copyable ID for a port on a module.
    PortId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn id_roundtrip() {
        let id = SignalId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_equality() {
        let a = CellId::from_raw(7);
        let b = CellId::from_raw(7);
        let c = CellId::from_raw(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_ordering_follows_raw_index() {
        let mut set = BTreeSet::new();
        set.insert(SignalId::from_raw(9));
        set.insert(SignalId::from_raw(2));
        set.insert(SignalId::from_raw(5));
        let order: Vec<u32> = set.iter().map(|id| id.as_raw()).collect();
        assert_eq!(order, vec![2, 5, 9]);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(SignalId::from_raw(1));
        set.insert(SignalId::from_raw(2));
        set.insert(SignalId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = PortId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: PortId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
