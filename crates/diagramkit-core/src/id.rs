//! Identity allocation for diagram entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for shapes, containers and connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source of entity identifiers.
///
/// Implementations must never return the same id twice for the lifetime of
/// the diagram that owns them.
pub trait IdSource: fmt::Debug {
    /// Issue the next identifier.
    fn next_id(&mut self) -> EntityId;
}

/// Deterministic counter-backed ids: the n-th id is `Uuid::from_u128(n)`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    /// Start counting at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start counting at `first`.
    pub fn starting_at(first: u128) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> EntityId {
        let id = EntityId(Uuid::from_u128(self.next));
        self.next += 1;
        id
    }
}

/// Random (v4) UUIDs.
#[derive(Debug, Clone, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> EntityId {
        EntityId(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids_are_deterministic() {
        let mut a = SequentialIds::new();
        let mut b = SequentialIds::new();
        for _ in 0..10 {
            assert_eq!(a.next_id(), b.next_id());
        }
    }

    #[test]
    fn test_sequential_ids_are_unique() {
        let mut ids = SequentialIds::new();
        let seen: HashSet<_> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_starting_at() {
        let mut ids = SequentialIds::starting_at(42);
        assert_eq!(ids.next_id().as_uuid(), Uuid::from_u128(42));
        assert_eq!(ids.next_id().as_uuid(), Uuid::from_u128(43));
    }

    #[test]
    fn test_random_ids_differ() {
        let mut ids = RandomIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
