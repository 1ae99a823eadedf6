//! Key, stem and commitment types shared across the tree.

use crate::constants::{KEY_SIZE, NODE_WIDTH, STEM_SIZE};

/// A full 32-byte tree key: a 31-byte stem followed by a one-byte suffix.
pub type Key = [u8; KEY_SIZE];

/// The first 31 bytes of a key. A stem uniquely identifies a leaf node.
pub type Stem = [u8; STEM_SIZE];

/// Compressed serialized form of a group element.
pub type CommitmentBytes = [u8; 32];

/// A full set of leaf slot values, indexed by suffix. `None` marks a slot
/// that was never written, which is distinct from a slot holding zeros.
pub type LeafValues = Vec<Option<Vec<u8>>>;

/// Returns a `LeafValues` with every slot absent.
pub fn empty_leaf_values() -> LeafValues {
    vec![None; NODE_WIDTH]
}

/// Returns the stem of a key.
#[inline]
pub fn stem_of(key: &Key) -> Stem {
    key[..STEM_SIZE].try_into().expect("key holds a full stem")
}

/// Returns the suffix of a key, i.e. the slot index inside the leaf.
#[inline]
pub fn suffix_of(key: &Key) -> u8 {
    key[KEY_SIZE - 1]
}

/// Extracts the byte of `stem` that selects the child at the given depth.
/// Works on both stems and full keys.
#[inline]
pub fn offset2key(stem: &[u8], depth: u8) -> u8 {
    stem[depth as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_decomposition() {
        let mut key = [0u8; KEY_SIZE];
        key[0] = 0xab;
        key[30] = 0xcd;
        key[31] = 0xef;

        let stem = stem_of(&key);
        assert_eq!(stem.len(), STEM_SIZE);
        assert_eq!(stem[0], 0xab);
        assert_eq!(stem[30], 0xcd);
        assert_eq!(suffix_of(&key), 0xef);

        assert_eq!(offset2key(&key, 0), 0xab);
        assert_eq!(offset2key(&stem, 30), 0xcd);
    }
}
