//! Width-256 branching nodes.

use ark_ff::Zero;
use banderwagon::{Element, Fr};

use crate::config::{config, to_fr};
use crate::constants::NODE_WIDTH;
use crate::errors::VerkleError;
use crate::tree::leaf::LeafNode;
use crate::tree::{HashedNode, Node};
use crate::types::{empty_leaf_values, offset2key, stem_of, suffix_of, Key, Stem};

/// An internal node: 256 child slots plus a cached commitment and its
/// scalar image. The caches are cleared on every mutation and rebuilt
/// lazily by [`InternalNode::commit`].
#[derive(Clone, Debug)]
pub struct InternalNode {
    children: Vec<Node>,
    depth: u8,
    commitment: Option<Element>,
    hash: Option<Fr>,
}

impl Default for InternalNode {
    fn default() -> Self {
        Self::new(0)
    }
}

impl InternalNode {
    /// Creates an internal node with all-empty children at the given depth
    /// (in stem bytes).
    pub fn new(depth: u8) -> Self {
        Self {
            children: (0..NODE_WIDTH).map(|_| Node::Empty).collect(),
            depth,
            commitment: None,
            hash: None,
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> &mut Node {
        &mut self.children[index]
    }

    /// The cached commitment, if [`InternalNode::commit`] ran since the last
    /// mutation.
    pub fn commitment(&self) -> Option<Element> {
        self.commitment
    }

    fn clear_caches(&mut self) {
        self.commitment = None;
        self.hash = None;
    }

    fn new_leaf_for(key: &Key, value: Vec<u8>, depth: u8) -> Node {
        let mut values = empty_leaf_values();
        values[suffix_of(key) as usize] = Some(value);
        Node::Leaf(Box::new(LeafNode::new(stem_of(key), values, depth)))
    }

    /// Inserts or updates the value at `key`.
    pub fn insert(&mut self, key: &Key, value: Vec<u8>) -> Result<(), VerkleError> {
        self.clear_caches();
        let nchild = offset2key(key, self.depth) as usize;

        let child = std::mem::replace(&mut self.children[nchild], Node::Empty);
        let (child, result) = match child {
            Node::Empty => (Self::new_leaf_for(key, value, self.depth + 1), Ok(())),
            Node::Hashed(hashed) => (Node::Hashed(hashed), Err(VerkleError::InsertIntoHash)),
            Node::Leaf(mut leaf) if *leaf.stem() == stem_of(key) => {
                leaf.update_slot(suffix_of(key), value);
                (Node::Leaf(leaf), Ok(()))
            }
            Node::Leaf(leaf) => {
                // Two stems now share this slot: split with an intermediate
                // branch at the next stem byte, one branch per diverging
                // byte.
                let (branch, result) = self.split_leaf(leaf, key, value);
                (Node::Internal(Box::new(branch)), result)
            }
            Node::Internal(mut inner) => {
                let result = inner.insert(key, value);
                (Node::Internal(inner), result)
            }
            Node::Stateless(node) => (
                Node::Stateless(node),
                Err(VerkleError::StatelessAndStatefulMix),
            ),
        };
        self.children[nchild] = child;
        result
    }

    fn split_leaf(
        &self,
        mut old_leaf: Box<LeafNode>,
        key: &Key,
        value: Vec<u8>,
    ) -> (InternalNode, Result<(), VerkleError>) {
        let mut branch = InternalNode::new(self.depth + 1);
        let next_existing = offset2key(old_leaf.stem(), branch.depth) as usize;
        old_leaf.set_depth(branch.depth + 1);
        branch.children[next_existing] = Node::Leaf(old_leaf);

        let next_inserted = offset2key(key, branch.depth) as usize;
        let result = if next_inserted != next_existing {
            // The next byte differs, so the new leaf lands in its final slot.
            branch.children[next_inserted] = Self::new_leaf_for(key, value, branch.depth + 1);
            Ok(())
        } else {
            branch.insert(key, value)
        };
        (branch, result)
    }

    /// Inserts a full slot assignment for a stem in one descent.
    pub fn insert_stem(
        &mut self,
        stem: &Stem,
        values: &[Option<Vec<u8>>],
    ) -> Result<(), VerkleError> {
        self.clear_caches();
        let nchild = offset2key(stem, self.depth) as usize;

        let child = std::mem::replace(&mut self.children[nchild], Node::Empty);
        let (child, result) = match child {
            Node::Empty => (
                Node::Leaf(Box::new(LeafNode::new(
                    *stem,
                    values.to_vec(),
                    self.depth + 1,
                ))),
                Ok(()),
            ),
            Node::Hashed(hashed) => (Node::Hashed(hashed), Err(VerkleError::InsertIntoHash)),
            Node::Leaf(mut leaf) if leaf.stem() == stem => {
                leaf.update_multiple_leaves(values);
                (Node::Leaf(leaf), Ok(()))
            }
            Node::Leaf(old_leaf) => {
                let (branch, result) = self.split_leaf_for_stem(old_leaf, stem, values);
                (Node::Internal(Box::new(branch)), result)
            }
            Node::Internal(mut inner) => {
                let result = inner.insert_stem(stem, values);
                (Node::Internal(inner), result)
            }
            Node::Stateless(node) => (
                Node::Stateless(node),
                Err(VerkleError::StatelessAndStatefulMix),
            ),
        };
        self.children[nchild] = child;
        result
    }

    fn split_leaf_for_stem(
        &self,
        mut old_leaf: Box<LeafNode>,
        stem: &Stem,
        values: &[Option<Vec<u8>>],
    ) -> (InternalNode, Result<(), VerkleError>) {
        let mut branch = InternalNode::new(self.depth + 1);
        let next_existing = offset2key(old_leaf.stem(), branch.depth) as usize;
        old_leaf.set_depth(branch.depth + 1);
        branch.children[next_existing] = Node::Leaf(old_leaf);

        let next_inserted = offset2key(stem, branch.depth) as usize;
        let result = if next_inserted != next_existing {
            branch.children[next_inserted] = Node::Leaf(Box::new(LeafNode::new(
                *stem,
                values.to_vec(),
                branch.depth + 1,
            )));
            Ok(())
        } else {
            branch.insert_stem(stem, values)
        };
        (branch, result)
    }

    /// Writes 32 zero bytes at `key`. The slot keeps its leaf marker, which
    /// is what distinguishes a deleted value from one that never existed.
    pub fn delete(&mut self, key: &Key) -> Result<(), VerkleError> {
        self.insert(key, vec![0u8; 32])
    }

    /// Reads the value at `key` without mutating the tree. Fails on opaque
    /// hashed children.
    pub fn get(&self, key: &Key) -> Result<Option<&[u8]>, VerkleError> {
        let nchild = offset2key(key, self.depth) as usize;
        match &self.children[nchild] {
            Node::Empty => Ok(None),
            Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
            Node::Leaf(leaf) => Ok(leaf.get(key)),
            Node::Internal(inner) => inner.get(key),
            Node::Stateless(_) => Err(VerkleError::StatelessAndStatefulMix),
        }
    }

    /// Returns the node's commitment, computing and caching it if a mutation
    /// invalidated the cache. Idempotent.
    pub fn commit(&mut self) -> Element {
        if let Some(commitment) = self.commitment {
            return commitment;
        }

        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        let mut empty_count = 0;
        for (i, child) in self.children.iter_mut().enumerate() {
            match child {
                Node::Empty => empty_count += 1,
                _ => poly[i] = to_fr(&child.commit()),
            }
        }

        let commitment = config().commit_to_poly(&poly, empty_count);
        self.commitment = Some(commitment);
        self.hash = Some(to_fr(&commitment));
        commitment
    }

    /// The scalar image of the node's commitment.
    pub fn hash(&mut self) -> Fr {
        self.commit();
        self.hash.expect("hash is cached by commit")
    }

    /// Ordered insertion. Keys are expected to arrive in ascending order;
    /// whenever a new subtree opens, every subtree to its left is final, so
    /// it is committed, handed to `flush_fn` and replaced by a hashed node.
    pub fn insert_ordered(
        &mut self,
        key: &Key,
        value: Vec<u8>,
        flush_fn: &mut dyn FnMut(&Node),
    ) -> Result<(), VerkleError> {
        self.clear_caches();
        let nchild = offset2key(key, self.depth) as usize;

        let child = std::mem::replace(&mut self.children[nchild], Node::Empty);
        let (child, result) = match child {
            Node::Empty => {
                self.flush_preceding(nchild, flush_fn);
                (Self::new_leaf_for(key, value, self.depth + 1), Ok(()))
            }
            Node::Hashed(hashed) => (Node::Hashed(hashed), Err(VerkleError::InsertIntoHash)),
            Node::Leaf(mut leaf) if *leaf.stem() == stem_of(key) => {
                leaf.update_slot(suffix_of(key), value);
                (Node::Leaf(leaf), Ok(()))
            }
            Node::Leaf(mut old_leaf) => {
                let mut branch = InternalNode::new(self.depth + 1);
                let next_existing = offset2key(old_leaf.stem(), branch.depth) as usize;
                old_leaf.set_depth(branch.depth + 1);

                let next_inserted = offset2key(key, branch.depth) as usize;
                let result = if next_inserted != next_existing {
                    // The displaced leaf is final: flush it and keep only its
                    // commitment.
                    let commitment = old_leaf.commitment();
                    let flushed = Node::Leaf(old_leaf);
                    flush_fn(&flushed);
                    branch.children[next_existing] =
                        Node::Hashed(HashedNode::with_cached(commitment));
                    branch.children[next_inserted] =
                        Self::new_leaf_for(key, value, branch.depth + 1);
                    Ok(())
                } else {
                    branch.children[next_existing] = Node::Leaf(old_leaf);
                    branch.insert_ordered(key, value, flush_fn)
                };
                (Node::Internal(Box::new(branch)), result)
            }
            Node::Internal(mut inner) => {
                let result = inner.insert_ordered(key, value, flush_fn);
                (Node::Internal(inner), result)
            }
            Node::Stateless(node) => (
                Node::Stateless(node),
                Err(VerkleError::StatelessAndStatefulMix),
            ),
        };
        self.children[nchild] = child;
        result
    }

    /// Flushes the closest finished subtree to the left of `nchild` and
    /// replaces it with a hashed node.
    fn flush_preceding(&mut self, nchild: usize, flush_fn: &mut dyn FnMut(&Node)) {
        for i in (0..nchild).rev() {
            let child = &mut self.children[i];
            match child {
                Node::Empty => continue,
                Node::Hashed(_) => break,
                _ => {
                    child.flush(flush_fn);
                    let commitment = child.commit();
                    *child = Node::Hashed(HashedNode::with_cached(commitment));
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::compute_commitment_from_scratch;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn key_from(bytes: &[u8]) -> Key {
        let mut key = [0u8; 32];
        key[..bytes.len()].copy_from_slice(bytes);
        key
    }

    #[test]
    fn empty_tree_commits_to_identity() {
        let mut root = InternalNode::new(0);
        assert_eq!(root.commit(), Element::zero());
        assert!(root.hash().is_zero());
    }

    #[test]
    fn single_insert_is_deterministic_and_idempotent() {
        let key = [0u8; 32];
        let value = vec![1u8; 32];

        let mut root = InternalNode::new(0);
        root.insert(&key, value.clone()).unwrap();
        let r1 = root.commit();
        assert_ne!(r1, Element::zero());

        // Re-inserting the same pair lands on the same root.
        root.insert(&key, value.clone()).unwrap();
        assert_eq!(root.commit(), r1);

        // An independent tree with the same contents agrees.
        let mut other = InternalNode::new(0);
        other.insert(&key, value).unwrap();
        assert_eq!(other.commit(), r1);
    }

    #[test]
    fn shared_prefix_builds_minimal_branch() {
        // Keys share bytes 0..3 and diverge at byte 3, so the branch holds
        // internal nodes at depths 0 through 3 and the leaves sit at depth 4.
        let k1 = key_from(&[1, 2, 3, 4]);
        let k2 = key_from(&[1, 2, 3, 5]);

        let mut root = InternalNode::new(0);
        root.insert(&k1, vec![0xaa; 32]).unwrap();
        root.insert(&k2, vec![0xbb; 32]).unwrap();

        let mut node = &root;
        for depth in 0..3 {
            assert_eq!(node.depth(), depth);
            match &node.children()[offset2key(&k1, depth) as usize] {
                Node::Internal(inner) => node = inner.as_ref(),
                other => panic!("expected an internal node at depth {depth}, got {other:?}"),
            }
        }
        assert_eq!(node.depth(), 3);
        match &node.children()[4] {
            Node::Leaf(leaf) => assert_eq!(leaf.depth(), 4),
            other => panic!("expected a leaf for k1, got {other:?}"),
        }
        match &node.children()[5] {
            Node::Leaf(leaf) => assert_eq!(leaf.depth(), 4),
            other => panic!("expected a leaf for k2, got {other:?}"),
        }

        assert_eq!(root.get(&k1).unwrap(), Some(&[0xaa; 32][..]));
        assert_eq!(root.get(&k2).unwrap(), Some(&[0xbb; 32][..]));
    }

    #[test]
    fn delete_reads_back_as_zeros() {
        let key = key_from(&[9, 9, 9]);
        let mut root = InternalNode::new(0);

        root.insert(&key, vec![0x55; 32]).unwrap();
        let written = root.commit();

        root.delete(&key).unwrap();
        assert_eq!(root.get(&key).unwrap(), Some(&[0u8; 32][..]));

        // Deletion changes the root but does not return it to the
        // never-written state.
        assert_ne!(root.commit(), written);
        let mut never = InternalNode::new(0);
        assert_ne!(root.commit(), never.commit());
    }

    #[test]
    fn never_written_key_reads_as_absent() {
        let mut root = InternalNode::new(0);
        root.insert(&key_from(&[1]), vec![1; 32]).unwrap();
        // Same leaf, different suffix.
        let mut probe = key_from(&[1]);
        probe[31] = 42;
        assert_eq!(root.get(&probe).unwrap(), None);
        // Different stem entirely.
        assert_eq!(root.get(&key_from(&[2])).unwrap(), None);
    }

    #[test]
    fn commitment_matches_from_scratch_recomputation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut root = InternalNode::new(0);
        for _ in 0..100 {
            let key: Key = rng.gen();
            root.insert(&key, rng.gen::<[u8; 32]>().to_vec()).unwrap();
        }
        let committed = root.commit();
        let recomputed =
            compute_commitment_from_scratch(&Node::Internal(Box::new(root.clone())));
        assert_eq!(committed, recomputed);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut kvs: Vec<(Key, Vec<u8>)> = (0..50)
            .map(|_| (rng.gen::<Key>(), rng.gen::<[u8; 32]>().to_vec()))
            .collect();
        // Force a couple of shared-prefix stems into the mix.
        let base: Key = rng.gen();
        for i in 0..4 {
            let mut key = base;
            key[3] = i;
            kvs.push((key, vec![i; 32]));
        }

        let mut forward = InternalNode::new(0);
        for (key, value) in &kvs {
            forward.insert(key, value.clone()).unwrap();
        }

        let mut reversed = InternalNode::new(0);
        for (key, value) in kvs.iter().rev() {
            reversed.insert(key, value.clone()).unwrap();
        }

        assert_eq!(forward.commit(), reversed.commit());
    }

    #[test]
    fn commit_is_idempotent() {
        let mut root = InternalNode::new(0);
        root.insert(&key_from(&[3, 1]), vec![1; 32]).unwrap();
        let first = root.commit();
        assert_eq!(root.commit(), first);
    }

    #[test]
    fn insert_into_hashed_child_fails() {
        let mut root = InternalNode::new(0);
        let key = key_from(&[5]);
        root.insert(&key, vec![1; 32]).unwrap();
        root.commit();

        // Flush the subtree away, leaving only its commitment.
        let mut sink = |_: &Node| {};
        let nchild = offset2key(&key, 0) as usize;
        root.flush_preceding(nchild + 1, &mut sink);
        assert!(matches!(root.children()[nchild], Node::Hashed(_)));

        assert!(matches!(
            root.insert(&key, vec![2; 32]),
            Err(VerkleError::InsertIntoHash)
        ));
        assert!(matches!(root.get(&key), Err(VerkleError::InsertIntoHash)));
    }

    #[test]
    fn insert_stem_matches_slot_inserts() {
        let mut rng = StdRng::seed_from_u64(11);
        let stem: Stem = rng.gen();

        let mut values = empty_leaf_values();
        let mut by_slot = InternalNode::new(0);
        for suffix in [0u8, 17, 128, 255] {
            let value = rng.gen::<[u8; 32]>().to_vec();
            values[suffix as usize] = Some(value.clone());
            let mut key = [0u8; 32];
            key[..31].copy_from_slice(&stem);
            key[31] = suffix;
            by_slot.insert(&key, value).unwrap();
        }

        let mut by_stem = InternalNode::new(0);
        by_stem.insert_stem(&stem, &values).unwrap();

        assert_eq!(by_slot.commit(), by_stem.commit());
    }

    #[test]
    fn ordered_insert_flushes_and_agrees_with_plain_insert() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut kvs: Vec<(Key, Vec<u8>)> = (0..40)
            .map(|_| (rng.gen::<Key>(), rng.gen::<[u8; 32]>().to_vec()))
            .collect();
        kvs.sort();

        let mut plain = InternalNode::new(0);
        for (key, value) in &kvs {
            plain.insert(key, value.clone()).unwrap();
        }

        let mut flushed = 0usize;
        let mut ordered = InternalNode::new(0);
        {
            let mut count = |_: &Node| flushed += 1;
            for (key, value) in &kvs {
                ordered.insert_ordered(key, value.clone(), &mut count).unwrap();
            }
        }

        assert!(flushed > 0, "ordered insertion must flush finished subtrees");
        assert_eq!(ordered.commit(), plain.commit());
    }
}
