//! In-memory node store.
//!
//! [`MemStore`] maps node commitments to their serialized bodies. It is the
//! reference implementation of the [`NodeResolver`] trait, fed by the flush
//! callback: flushing a tree into the store makes every flushed subtree
//! resolvable on demand. Intended for tests, development and as a model for
//! database-backed stores; it performs no persistence of its own.
//!
//! All access goes through an [`RwLock`], so a store can back several trees
//! at once.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::traits::NodeResolver;
use crate::tree::Node;
use crate::types::CommitmentBytes;

/// A commitment-addressed store of serialized nodes.
#[derive(Debug, Default)]
pub struct MemStore {
    nodes: RwLock<BTreeMap<CommitmentBytes, Vec<u8>>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serialized node under its commitment.
    pub fn insert(&self, commitment: CommitmentBytes, serialized: Vec<u8>) {
        self.nodes
            .write()
            .expect("store lock poisoned")
            .insert(commitment, serialized);
    }

    /// Stores a flushed node. Pass this from a flush callback:
    ///
    /// ```ignore
    /// root.flush(&mut |node| store.collect(node));
    /// ```
    ///
    /// Nodes without a serialized form are ignored.
    pub fn collect(&self, node: &Node) {
        let Some(commitment) = node.commitment() else {
            return;
        };
        if let Ok(serialized) = node.serialize_committed() {
            self.insert(commitment.to_bytes(), serialized);
        }
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("store lock poisoned").len()
    }

    /// Whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NodeResolver for MemStore {
    type Error = String;

    fn resolve(&self, commitment: &CommitmentBytes) -> Result<Vec<u8>, Self::Error> {
        self.nodes
            .read()
            .expect("store lock poisoned")
            .get(commitment)
            .cloned()
            .ok_or_else(|| format!("no node stored for commitment {}", hex::encode(commitment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_returns_stored_bytes() {
        let store = MemStore::new();
        assert!(store.is_empty());

        let commitment = [7u8; 32];
        store.insert(commitment, vec![1, 2, 3]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(&commitment).unwrap(), vec![1, 2, 3]);

        let missing = [8u8; 32];
        assert!(store.resolve(&missing).is_err());
    }
}
