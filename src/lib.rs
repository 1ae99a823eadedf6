//! An authenticated key-value store in which every internal digest is a
//! vector commitment over the node's children instead of a hash of
//! concatenated child hashes, yielding drastically smaller membership and
//! absence proofs than hash-based tries.
//!
//! Keys are 32 bytes: a 31-byte *stem* selecting a leaf and a one-byte
//! *suffix* selecting a slot inside it. The crate provides:
//!
//! - the stateful tree ([`Node`], [`InternalNode`], [`LeafNode`]) with
//!   insertion, lookup, deletion, lazy commitment caching and post-order
//!   flushing;
//! - the stateless tree ([`StatelessNode`]) operating under partial
//!   knowledge, resolving absent subtrees on demand through a
//!   [`NodeResolver`] and re-committing incrementally via copy-on-write
//!   snapshots;
//! - proof element extraction ([`ProofElements`]) and the multipoint proof
//!   glue ([`VerkleProof`]);
//! - the node wire format ([`parse_stateless_node`]) and an in-memory
//!   commitment-addressed store ([`MemStore`]).
//!
//! Group and scalar arithmetic comes from `banderwagon`; the polynomial
//! commitment argument from `ipa-multipoint`. Trees are single-threaded:
//! callers serialize access, and even reads may mutate (commitment caches,
//! resolution on demand).

pub mod committer;
pub mod config;
pub mod constants;
pub mod errors;
pub mod mem_store;
pub mod proof;
pub mod serialization;
pub mod stateless;
pub mod traits;
pub mod tree;
pub mod types;

pub use config::{config, leaf_to_comms, stem_to_fr, to_fr, TreeConfig};
pub use errors::VerkleError;
pub use mem_store::MemStore;
pub use proof::{ProofElements, ProofError, VerkleProof};
pub use serialization::parse_stateless_node;
pub use stateless::{ExtStatus, StatelessNode, StemInfo, SuffixValues};
pub use traits::NodeResolver;
pub use tree::{compute_commitment_from_scratch, HashedNode, InternalNode, LeafNode, Node};
pub use types::{
    empty_leaf_values, offset2key, stem_of, suffix_of, CommitmentBytes, Key, LeafValues, Stem,
};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// End-to-end workflow: build a tree, prove some keys, flush it into a
    /// store, reconstruct a stateless view from the root's serialization and
    /// read through the resolver.
    #[test]
    fn basic_integration_test() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(42);

        let mut root = Node::new();
        let mut kvs: Vec<(Key, Vec<u8>)> = Vec::new();
        for _ in 0..100 {
            let key: Key = rng.gen();
            let value = rng.gen::<[u8; 32]>().to_vec();
            root.insert(&key, value.clone())?;
            kvs.push((key, value));
        }
        let root_commitment = root.commit();

        // Prove a handful of keys and verify against the root.
        let queried: Vec<Key> = kvs.iter().take(10).map(|(key, _)| *key).collect();
        let (proof, elements) = VerkleProof::create(&mut root, &queried)?;
        proof.check(&elements, &root_commitment)?;

        // Persist the tree: the flush callback owns storage.
        let store = MemStore::new();
        let root_serialized = root.serialize()?;
        root.flush(&mut |node| store.collect(node));
        assert!(!store.is_empty());

        // A stateless view of the same tree, resolving on demand.
        let mut stateless =
            parse_stateless_node(&root_serialized, 0, &root_commitment.to_bytes())?;
        assert_eq!(stateless.commitment(), root_commitment);

        for (key, value) in kvs.iter().take(10) {
            assert_eq!(stateless.get(key, &store)?.as_deref(), Some(&value[..]));
        }

        // Write through the stateless tree and re-commit incrementally.
        let key: Key = rng.gen();
        stateless.insert(&key, vec![0xee; 32], &store)?;
        let updated = stateless.commit();
        assert_ne!(updated, root_commitment);
        assert_eq!(stateless.get(&key, &store)?, Some(vec![0xee; 32]));

        Ok(())
    }
}
