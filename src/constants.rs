//! Constants fixing the shape of the verkle tree.

/// Number of children of an internal node. Always a power of two.
pub const NODE_WIDTH: usize = 256;
/// Number of bytes in a full tree key.
pub const KEY_SIZE: usize = 32;
/// Number of bytes in a stem, i.e. the part of the key that selects a leaf.
/// The last key byte selects the slot inside the leaf.
pub const STEM_SIZE: usize = KEY_SIZE - 1;
/// Conventional size of a leaf value. Shorter values are padded with trailing
/// zeros during serialization.
pub const LEAF_VALUE_SIZE: usize = 32;
/// Number of suffixes covered by each of the two leaf sub-commitments.
pub const HALF_WIDTH: usize = NODE_WIDTH / 2;

/// Threshold for switching to multi-exponentiation when committing to a
/// polynomial. The number refers to non-empty entries in the polynomial.
pub const MULTI_EXP_THRESHOLD: usize = 110;

/// Number of bytes in the presence bitlist of a serialized node.
pub const BITLIST_SIZE: usize = NODE_WIDTH / 8;

/// Serialization tag of an internal node.
pub const INTERNAL_NODE_TYPE: u8 = 1;
/// Serialization tag of a leaf node.
pub const LEAF_NODE_TYPE: u8 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_sizes_are_consistent() {
        assert_eq!(STEM_SIZE + 1, KEY_SIZE);
        assert_eq!(HALF_WIDTH * 2, NODE_WIDTH);
        assert_eq!(BITLIST_SIZE * 8, NODE_WIDTH);
        assert_ne!(INTERNAL_NODE_TYPE, LEAF_NODE_TYPE);
    }
}
