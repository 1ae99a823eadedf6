//! Extension-and-suffix leaf nodes.
//!
//! A leaf owns a full stem and 256 value slots. The slots are committed to
//! by two sub-commitments: `C1` covers suffixes 0..128, `C2` covers
//! 128..256, each value contributing two interleaved scalars. The leaf's
//! own commitment aggregates the extension marker, the stem and the scalar
//! images of `C1` and `C2`:
//!
//! ```text
//! C = 1·SRS[0] + stem·SRS[1] + to_fr(C1)·SRS[2] + to_fr(C2)·SRS[3]
//! ```
//!
//! All commitments are maintained incrementally on update, so they are
//! always current and `commit` never recomputes.

use ark_ff::Zero;
use banderwagon::{Element, Fr};

use crate::committer::{update_commitment, update_suffix_commitment};
use crate::config::{config, extension_marker, leaf_to_comms, stem_to_fr, suffix_slot, to_fr};
use crate::constants::{HALF_WIDTH, NODE_WIDTH};
use crate::types::{stem_of, suffix_of, Key, LeafValues, Stem};

/// Polynomial slot of `to_fr(C1)` inside the leaf commitment.
pub(crate) const C1_SLOT: usize = 2;
/// Polynomial slot of `to_fr(C2)` inside the leaf commitment.
pub(crate) const C2_SLOT: usize = 3;

/// A leaf holding every suffix of a single stem.
#[derive(Clone, Debug)]
pub struct LeafNode {
    stem: Stem,
    values: LeafValues,
    c1: Element,
    c2: Element,
    commitment: Element,
    depth: u8,
}

impl LeafNode {
    /// Creates a leaf from a full slot assignment and computes its
    /// commitments.
    pub fn new(stem: Stem, values: LeafValues, depth: u8) -> Self {
        debug_assert_eq!(values.len(), NODE_WIDTH);
        let cfg = config();

        let mut c1_poly = vec![Fr::zero(); NODE_WIDTH];
        let mut c2_poly = vec![Fr::zero(); NODE_WIDTH];
        let (mut c1_empty, mut c2_empty) = (NODE_WIDTH, NODE_WIDTH);
        for (suffix, value) in values.iter().enumerate() {
            if value.is_none() {
                continue;
            }
            let [lo, hi] = leaf_to_comms(value.as_deref());
            let slot = suffix_slot(suffix as u8);
            if suffix < HALF_WIDTH {
                c1_poly[slot] = lo;
                c1_poly[slot + 1] = hi;
                c1_empty -= 2;
            } else {
                c2_poly[slot] = lo;
                c2_poly[slot + 1] = hi;
                c2_empty -= 2;
            }
        }
        let c1 = cfg.commit_to_poly(&c1_poly, c1_empty);
        let c2 = cfg.commit_to_poly(&c2_poly, c2_empty);

        let mut ext_poly = vec![Fr::zero(); NODE_WIDTH];
        ext_poly[0] = extension_marker();
        ext_poly[1] = stem_to_fr(&stem);
        ext_poly[C1_SLOT] = to_fr(&c1);
        ext_poly[C2_SLOT] = to_fr(&c2);
        let commitment = cfg.commit_to_poly(&ext_poly, NODE_WIDTH - 4);

        Self {
            stem,
            values,
            c1,
            c2,
            commitment,
            depth,
        }
    }

    pub fn stem(&self) -> &Stem {
        &self.stem
    }

    pub fn values(&self) -> &LeafValues {
        &self.values
    }

    pub fn commitment(&self) -> Element {
        self.commitment
    }

    pub fn c1(&self) -> Element {
        self.c1
    }

    pub fn c2(&self) -> Element {
        self.c2
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub(crate) fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    /// Returns the value at `key`, or `None` if the key belongs to another
    /// stem or the slot was never written.
    pub fn get(&self, key: &Key) -> Option<&[u8]> {
        if stem_of(key) != self.stem {
            return None;
        }
        self.values[suffix_of(key) as usize].as_deref()
    }

    /// Writes a single slot, moving the covering sub-commitment and the leaf
    /// commitment by the corresponding deltas.
    pub fn update_slot(&mut self, suffix: u8, value: Vec<u8>) {
        let index = suffix as usize;
        let ext_slot = if index < HALF_WIDTH { C1_SLOT } else { C2_SLOT };

        let sub = if index < HALF_WIDTH {
            &mut self.c1
        } else {
            &mut self.c2
        };
        let old_scalar = to_fr(sub);
        update_suffix_commitment(sub, suffix, self.values[index].as_deref(), Some(&value));
        let new_scalar = to_fr(sub);
        update_commitment(&mut self.commitment, ext_slot, &old_scalar, &new_scalar);

        self.values[index] = Some(value);
    }

    /// Applies a batch of slot writes. Sub-commitment deltas for both halves
    /// are accumulated first, and each half touches the leaf commitment at
    /// most once, which keeps the number of group-to-field conversions at
    /// two per updated half.
    pub fn update_multiple_leaves(&mut self, values: &[Option<Vec<u8>>]) {
        debug_assert_eq!(values.len(), NODE_WIDTH);
        let mut old1: Option<Fr> = None;
        let mut old2: Option<Fr> = None;

        for (index, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            if value.is_empty() {
                continue;
            }
            if self.values[index].as_deref() == Some(value.as_slice()) {
                continue;
            }

            let sub = if index < HALF_WIDTH {
                if old1.is_none() {
                    old1 = Some(to_fr(&self.c1));
                }
                &mut self.c1
            } else {
                if old2.is_none() {
                    old2 = Some(to_fr(&self.c2));
                }
                &mut self.c2
            };
            update_suffix_commitment(
                sub,
                index as u8,
                self.values[index].as_deref(),
                Some(value),
            );
            self.values[index] = Some(value.clone());
        }

        if let Some(old) = old1 {
            let new = to_fr(&self.c1);
            update_commitment(&mut self.commitment, C1_SLOT, &old, &new);
        }
        if let Some(old) = old2 {
            let new = to_fr(&self.c2);
            update_commitment(&mut self.commitment, C2_SLOT, &old, &new);
        }
    }

    /// The extension-level polynomial this leaf's commitment opens against.
    pub(crate) fn extension_poly(&self) -> Vec<Fr> {
        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        poly[0] = extension_marker();
        poly[1] = stem_to_fr(&self.stem);
        poly[C1_SLOT] = to_fr(&self.c1);
        poly[C2_SLOT] = to_fr(&self.c2);
        poly
    }

    /// The polynomial committed to by `C1` (half 0) or `C2` (half 1).
    pub(crate) fn suffix_poly(&self, half: usize) -> Vec<Fr> {
        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        for i in 0..HALF_WIDTH {
            let suffix = half * HALF_WIDTH + i;
            let [lo, hi] = leaf_to_comms(self.values[suffix].as_deref());
            poly[2 * i] = lo;
            poly[2 * i + 1] = hi;
        }
        poly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::empty_leaf_values;

    fn key_with(stem: Stem, suffix: u8) -> Key {
        let mut key = [0u8; 32];
        key[..31].copy_from_slice(&stem);
        key[31] = suffix;
        key
    }

    #[test]
    fn full_leaf_covers_both_halves() {
        let stem = [7u8; 31];
        let mut values = empty_leaf_values();
        for i in 0..NODE_WIDTH {
            values[i] = Some(vec![i as u8; 32]);
        }
        let leaf = LeafNode::new(stem, values, 1);

        // C1 and C2 commit to the two halves independently.
        assert_eq!(
            leaf.c1(),
            config().commit_to_poly(&leaf.suffix_poly(0), 0)
        );
        assert_eq!(
            leaf.c2(),
            config().commit_to_poly(&leaf.suffix_poly(1), 0)
        );
        assert_ne!(leaf.c1(), leaf.c2());

        for i in 0..NODE_WIDTH {
            let key = key_with(stem, i as u8);
            assert_eq!(leaf.get(&key), Some(&vec![i as u8; 32][..]));
        }

        // A different stem misses regardless of the suffix.
        let other = key_with([8u8; 31], 0);
        assert_eq!(leaf.get(&other), None);
    }

    #[test]
    fn update_slot_matches_fresh_leaf() {
        let stem = [1u8; 31];
        let mut leaf = LeafNode::new(stem, empty_leaf_values(), 1);
        leaf.update_slot(3, vec![0xaa; 32]);
        leaf.update_slot(200, vec![0xbb; 32]);
        leaf.update_slot(3, vec![0xcc; 32]); // overwrite

        let mut values = empty_leaf_values();
        values[3] = Some(vec![0xcc; 32]);
        values[200] = Some(vec![0xbb; 32]);
        let fresh = LeafNode::new(stem, values, 1);

        assert_eq!(leaf.c1(), fresh.c1());
        assert_eq!(leaf.c2(), fresh.c2());
        assert_eq!(leaf.commitment(), fresh.commitment());
    }

    #[test]
    fn batch_update_matches_fresh_leaf() {
        let stem = [2u8; 31];
        let mut leaf = LeafNode::new(stem, empty_leaf_values(), 1);

        let mut batch = empty_leaf_values();
        batch[0] = Some(vec![1; 32]);
        batch[127] = Some(vec![2; 32]);
        batch[128] = Some(vec![3; 32]);
        batch[255] = Some(vec![4; 32]);
        leaf.update_multiple_leaves(&batch);

        let fresh = LeafNode::new(stem, batch, 1);
        assert_eq!(leaf.commitment(), fresh.commitment());
    }

    #[test]
    fn written_zero_differs_from_absent() {
        let stem = [3u8; 31];
        let empty = LeafNode::new(stem, empty_leaf_values(), 1);

        let mut values = empty_leaf_values();
        values[0] = Some(vec![0; 32]);
        let zeroed = LeafNode::new(stem, values, 1);

        assert_ne!(empty.commitment(), zeroed.commitment());
        assert_ne!(empty.c1(), zeroed.c1());
    }
}
