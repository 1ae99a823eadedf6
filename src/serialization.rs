//! Byte layout of serialized nodes.
//!
//! Two framed formats, distinguished by a one-byte tag:
//!
//! ```text
//! internal: [INTERNAL_NODE_TYPE] [bitlist; 32] [commitment; 32] ...
//! leaf:     [LEAF_NODE_TYPE] [stem; 31] [bitlist; 32] [value; 32] ...
//! ```
//!
//! The bitlist marks which of the 256 slots are present; payloads follow in
//! ascending slot order. Internal nodes carry the compressed commitments of
//! their non-empty children; leaves carry their written values, padded with
//! trailing zeros to 32 bytes. Parsing yields a [`StatelessNode`] whose
//! unresolved map holds the child commitments.

use std::collections::BTreeMap;

use banderwagon::Element;

use crate::constants::{
    BITLIST_SIZE, INTERNAL_NODE_TYPE, LEAF_NODE_TYPE, LEAF_VALUE_SIZE, NODE_WIDTH, STEM_SIZE,
};
use crate::errors::VerkleError;
use crate::stateless::{StatelessNode, SuffixValues};
use crate::tree::leaf::LeafNode;
use crate::tree::{InternalNode, Node};
use crate::types::{CommitmentBytes, Stem};

const INTERNAL_BODY_OFFSET: usize = 1 + BITLIST_SIZE;
const LEAF_BODY_OFFSET: usize = 1 + STEM_SIZE + BITLIST_SIZE;

#[inline]
fn set_bit(bitlist: &mut [u8], index: usize) {
    bitlist[index / 8] |= 1 << (index % 8);
}

#[inline]
fn bit_set(bitlist: &[u8], index: usize) -> bool {
    bitlist[index / 8] & (1 << (index % 8)) != 0
}

impl Node {
    /// Serializes the node, committing the subtree first so every child
    /// commitment is current.
    pub fn serialize(&mut self) -> Result<Vec<u8>, VerkleError> {
        self.commit();
        self.serialize_committed()
    }

    /// Serializes an already-committed node. This is the form flush
    /// callbacks use, since they receive borrows of committed nodes.
    ///
    /// # Panics
    ///
    /// Panics if a reachable commitment cache is uninitialized; call
    /// [`Node::serialize`] or commit the tree first.
    pub fn serialize_committed(&self) -> Result<Vec<u8>, VerkleError> {
        match self {
            Node::Empty | Node::Hashed(_) => Err(VerkleError::ParseError(
                "only internal, leaf and stateless nodes have a serialized form".into(),
            )),
            Node::Internal(internal) => Ok(serialize_internal(internal)),
            Node::Leaf(leaf) => Ok(serialize_leaf(leaf)),
            Node::Stateless(node) => serialize_stateless(node),
        }
    }
}

fn serialize_internal(internal: &InternalNode) -> Vec<u8> {
    let mut bitlist = [0u8; BITLIST_SIZE];
    let mut children = Vec::with_capacity(NODE_WIDTH * 32);
    for (i, child) in internal.children().iter().enumerate() {
        if matches!(child, Node::Empty) {
            continue;
        }
        set_bit(&mut bitlist, i);
        let commitment = child
            .commitment()
            .expect("serializing an uncommitted internal node");
        children.extend_from_slice(&commitment.to_bytes());
    }

    let mut out = Vec::with_capacity(INTERNAL_BODY_OFFSET + children.len());
    out.push(INTERNAL_NODE_TYPE);
    out.extend_from_slice(&bitlist);
    out.extend_from_slice(&children);
    out
}

fn serialize_leaf(leaf: &LeafNode) -> Vec<u8> {
    let mut bitlist = [0u8; BITLIST_SIZE];
    let mut values = Vec::with_capacity(NODE_WIDTH * LEAF_VALUE_SIZE);
    for (i, value) in leaf.values().iter().enumerate() {
        let Some(value) = value else { continue };
        set_bit(&mut bitlist, i);
        values.extend_from_slice(value);
        // pad shorter values with trailing zeros
        values.resize(values.len() + (LEAF_VALUE_SIZE - value.len()), 0);
    }

    let mut out = Vec::with_capacity(LEAF_BODY_OFFSET + values.len());
    out.push(LEAF_NODE_TYPE);
    out.extend_from_slice(leaf.stem());
    out.extend_from_slice(&bitlist);
    out.extend_from_slice(&values);
    out
}

fn serialize_stateless(node: &StatelessNode) -> Result<Vec<u8>, VerkleError> {
    if let Some(values) = node.values() {
        // A leaf with unloaded slots cannot be serialized without
        // overwriting the unknown data.
        if values.len() != NODE_WIDTH {
            return Err(VerkleError::NotSupportedInStateless);
        }
        let mut bitlist = [0u8; BITLIST_SIZE];
        let mut payload = Vec::with_capacity(NODE_WIDTH * LEAF_VALUE_SIZE);
        for (suffix, value) in values {
            let Some(value) = value else { continue };
            set_bit(&mut bitlist, *suffix as usize);
            payload.extend_from_slice(value);
            payload.resize(payload.len() + (LEAF_VALUE_SIZE - value.len()), 0);
        }
        let mut out = Vec::with_capacity(LEAF_BODY_OFFSET + payload.len());
        out.push(LEAF_NODE_TYPE);
        out.extend_from_slice(node.stem().expect("leaf mode has a stem"));
        out.extend_from_slice(&bitlist);
        out.extend_from_slice(&payload);
        return Ok(out);
    }

    let mut bitlist = [0u8; BITLIST_SIZE];
    let mut children = Vec::with_capacity(NODE_WIDTH * 32);
    for i in 0..NODE_WIDTH {
        let index = i as u8;
        if let Some(child) = node.children().get(&index) {
            if matches!(child, Node::Empty) {
                continue;
            }
            set_bit(&mut bitlist, i);
            let commitment = child
                .commitment()
                .expect("serializing an uncommitted stateless child");
            children.extend_from_slice(&commitment.to_bytes());
        } else if let Some(bytes) = node.unresolved().get(&index) {
            set_bit(&mut bitlist, i);
            children.extend_from_slice(bytes);
        }
    }

    let mut out = Vec::with_capacity(INTERNAL_BODY_OFFSET + children.len());
    out.push(INTERNAL_NODE_TYPE);
    out.extend_from_slice(&bitlist);
    out.extend_from_slice(&children);
    Ok(out)
}

/// Parses a serialized node into a stateless node at the given depth,
/// committing to `commitment`. Children of a parsed internal node start
/// unresolved and are inflated on demand.
pub fn parse_stateless_node(
    serialized: &[u8],
    depth: u8,
    commitment: &CommitmentBytes,
) -> Result<StatelessNode, VerkleError> {
    let point = Element::from_bytes(commitment)
        .ok_or_else(|| VerkleError::ParseError("invalid node commitment".into()))?;

    match serialized.first() {
        Some(&INTERNAL_NODE_TYPE) => parse_internal(serialized, depth, point),
        Some(&LEAF_NODE_TYPE) => parse_leaf(serialized, depth, point),
        Some(tag) => Err(VerkleError::ParseError(format!("unknown node type {tag}"))),
        None => Err(VerkleError::ParseError("empty serialized node".into())),
    }
}

fn parse_internal(
    serialized: &[u8],
    depth: u8,
    commitment: Element,
) -> Result<StatelessNode, VerkleError> {
    if serialized.len() < INTERNAL_BODY_OFFSET {
        return Err(VerkleError::ParseError(
            "internal node below minimum length".into(),
        ));
    }
    let bitlist = &serialized[1..INTERNAL_BODY_OFFSET];
    let body = &serialized[INTERNAL_BODY_OFFSET..];

    let present = (0..NODE_WIDTH).filter(|i| bit_set(bitlist, *i)).count();
    if body.len() != present * 32 {
        return Err(VerkleError::ParseError(format!(
            "internal node carries {} bytes for {present} children",
            body.len()
        )));
    }

    let mut unresolved = BTreeMap::new();
    let mut offset = 0;
    for i in 0..NODE_WIDTH {
        if !bit_set(bitlist, i) {
            continue;
        }
        let bytes: CommitmentBytes = body[offset..offset + 32]
            .try_into()
            .expect("slice is 32 bytes");
        unresolved.insert(i as u8, bytes);
        offset += 32;
    }

    Ok(StatelessNode::from_parsed_internal(depth, commitment, unresolved))
}

fn parse_leaf(
    serialized: &[u8],
    depth: u8,
    commitment: Element,
) -> Result<StatelessNode, VerkleError> {
    if serialized.len() < LEAF_BODY_OFFSET {
        return Err(VerkleError::ParseError("leaf node below minimum length".into()));
    }
    let stem: Stem = serialized[1..1 + STEM_SIZE]
        .try_into()
        .expect("slice is a stem");
    let bitlist = &serialized[1 + STEM_SIZE..LEAF_BODY_OFFSET];
    let body = &serialized[LEAF_BODY_OFFSET..];

    let present = (0..NODE_WIDTH).filter(|i| bit_set(bitlist, *i)).count();
    if body.len() != present * LEAF_VALUE_SIZE {
        return Err(VerkleError::ParseError(format!(
            "leaf node carries {} bytes for {present} values",
            body.len()
        )));
    }

    // A serialized leaf is complete: every slot is known, either with its
    // value or as never written.
    let mut values: SuffixValues = BTreeMap::new();
    let mut offset = 0;
    for i in 0..NODE_WIDTH {
        if bit_set(bitlist, i) {
            values.insert(i as u8, Some(body[offset..offset + LEAF_VALUE_SIZE].to_vec()));
            offset += LEAF_VALUE_SIZE;
        } else {
            values.insert(i as u8, None);
        }
    }

    // Rebuild the sub-commitments so later updates can move them
    // incrementally.
    let full_values: Vec<Option<Vec<u8>>> =
        (0..NODE_WIDTH).map(|i| values[&(i as u8)].clone()).collect();
    let rebuilt = LeafNode::new(stem, full_values, depth);
    debug_assert_eq!(
        rebuilt.commitment(),
        commitment,
        "leaf commitment diverges from its serialized contents"
    );

    Ok(StatelessNode::from_parsed_leaf(
        depth,
        commitment,
        stem,
        values,
        rebuilt.c1(),
        rebuilt.c2(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::to_fr;
    use crate::types::{empty_leaf_values, Key};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn leaf_roundtrip_preserves_commitment() {
        let mut values = empty_leaf_values();
        values[0] = Some(vec![1; 32]);
        values[130] = Some(vec![2; 32]);
        values[255] = Some(vec![3; 16]); // short value, padded on the wire
        let leaf = LeafNode::new([5u8; 31], values, 1);
        let mut node = Node::Leaf(Box::new(leaf));

        let commitment = node.commit();
        let serialized = node.serialize().unwrap();
        let parsed = parse_stateless_node(&serialized, 1, &commitment.to_bytes()).unwrap();

        assert!(parsed.is_leaf());
        assert_eq!(parsed.commitment(), commitment);
        assert_eq!(parsed.stem(), Some(&[5u8; 31]));
        let values = parsed.values().unwrap();
        assert_eq!(values.get(&0), Some(&Some(vec![1; 32])));
        let mut padded = vec![3; 16];
        padded.resize(32, 0);
        assert_eq!(values.get(&255), Some(&Some(padded)));
        assert_eq!(values.get(&7), Some(&None));
    }

    #[test]
    fn internal_roundtrip_preserves_commitment() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut root = InternalNode::new(0);
        for _ in 0..20 {
            let key: Key = rng.gen();
            root.insert(&key, rng.gen::<[u8; 32]>().to_vec()).unwrap();
        }
        let mut node = Node::Internal(Box::new(root));
        let commitment = node.commit();

        let serialized = node.serialize().unwrap();
        let parsed = parse_stateless_node(&serialized, 0, &commitment.to_bytes()).unwrap();

        assert!(!parsed.is_leaf());
        assert_eq!(parsed.commitment(), commitment);
        assert_eq!(to_fr(&parsed.commitment()), to_fr(&commitment));
        // Every non-empty child shows up as an unresolved commitment.
        let Node::Internal(root) = node else { unreachable!() };
        let expected = root
            .children()
            .iter()
            .filter(|child| !matches!(child, Node::Empty))
            .count();
        assert_eq!(parsed.unresolved().len(), expected);
    }

    #[test]
    fn stateless_roundtrip_preserves_layout() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut root = InternalNode::new(0);
        for _ in 0..10 {
            let key: Key = rng.gen();
            root.insert(&key, rng.gen::<[u8; 32]>().to_vec()).unwrap();
        }
        let mut node = Node::Internal(Box::new(root));
        let commitment = node.commit();
        let serialized = node.serialize().unwrap();

        // Parse, then serialize the parsed node again: the unresolved
        // entries reproduce the child commitments byte for byte.
        let parsed = parse_stateless_node(&serialized, 0, &commitment.to_bytes()).unwrap();
        let mut parsed_node = Node::Stateless(Box::new(parsed));
        assert_eq!(parsed_node.serialize().unwrap(), serialized);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(
            parse_stateless_node(&[], 0, &Element::zero().to_bytes()),
            Err(VerkleError::ParseError(_))
        ));
        assert!(matches!(
            parse_stateless_node(&[9u8; 40], 0, &Element::zero().to_bytes()),
            Err(VerkleError::ParseError(_))
        ));
        // Truncated internal body.
        let mut serialized = vec![INTERNAL_NODE_TYPE];
        serialized.extend_from_slice(&[0xffu8; BITLIST_SIZE]);
        serialized.extend_from_slice(&[0u8; 17]);
        assert!(matches!(
            parse_stateless_node(&serialized, 0, &Element::zero().to_bytes()),
            Err(VerkleError::ParseError(_))
        ));
    }
}
