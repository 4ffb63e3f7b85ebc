//! Commitment Registry
//!
//! Identity -> latest [`Commitment`]. At most one live commitment per identity;
//! `put` overwrites. Engines receive the store as an explicit handle.

use std::fmt;

use dashmap::DashMap;

use crate::commitment::Commitment;
use crate::error::{CommitmentError, CommitmentResult};

/// Storage backend for live commitments
///
/// Implementations must allow concurrent reads and serialize writes per key
/// without serializing unrelated keys.
pub trait CommitmentStore: Send + Sync + fmt::Debug {
    /// Store `commitment` under `identity`, returning the entry it replaced
    fn put(&self, identity: &str, commitment: Commitment) -> Option<Commitment>;

    fn get(&self, identity: &str) -> Option<Commitment>;

    fn remove(&self, identity: &str) -> Option<Commitment>;

    /// Like `get`, but a miss is `UnknownIdentity`
    fn require(&self, identity: &str) -> CommitmentResult<Commitment> {
        self.get(identity)
            .ok_or_else(|| CommitmentError::UnknownIdentity(identity.to_string()))
    }

    fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }
}

/// In-memory registry on a sharded concurrent map
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: DashMap<String, Commitment>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CommitmentStore for InMemoryRegistry {
    fn put(&self, identity: &str, commitment: Commitment) -> Option<Commitment> {
        self.entries.insert(identity.to_string(), commitment)
    }

    fn get(&self, identity: &str) -> Option<Commitment> {
        self.entries.get(identity).map(|entry| *entry.value())
    }

    fn remove(&self, identity: &str) -> Option<Commitment> {
        self.entries.remove(identity).map(|(_, commitment)| commitment)
    }

    fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }
}
