//! The node taxonomy and the operations shared by every node kind.
//!
//! A node is exactly one of five variants:
//!
//! - [`Node::Empty`]: an absent subtree, committing to the group identity;
//! - [`Node::Hashed`]: a subtree known only by its commitment, which can
//!   neither be read from nor inserted into until it is resolved;
//! - [`Node::Internal`]: a width-256 branching node;
//! - [`Node::Leaf`]: a 256-slot extension-and-suffix leaf;
//! - [`Node::Stateless`]: a node with partial knowledge of its subtree,
//!   see [`crate::stateless`].
//!
//! Keeping the taxonomy a closed enum makes the "stateless and stateful
//! nodes must not mix" rule an exhaustive-match concern instead of a
//! runtime-only one.

pub mod internal;
pub mod leaf;

use ark_ff::Zero;
use banderwagon::{Element, Fr};

use crate::config::{config, to_fr};
use crate::constants::NODE_WIDTH;
use crate::errors::VerkleError;
use crate::stateless::StatelessNode;
use crate::types::{stem_of, suffix_of, CommitmentBytes, Key};

pub use internal::InternalNode;
pub use leaf::LeafNode;

/// A subtree known only by its commitment. Holds the serialized form and
/// lazily caches the decoded group element.
#[derive(Clone, Debug)]
pub struct HashedNode {
    commitment: CommitmentBytes,
    cached: Option<Element>,
}

impl HashedNode {
    /// Wraps serialized commitment bytes.
    pub fn new(commitment: CommitmentBytes) -> Self {
        Self {
            commitment,
            cached: None,
        }
    }

    /// Wraps an already-decoded commitment.
    pub fn with_cached(point: Element) -> Self {
        Self {
            commitment: point.to_bytes(),
            cached: Some(point),
        }
    }

    /// The serialized commitment.
    pub fn commitment_bytes(&self) -> &CommitmentBytes {
        &self.commitment
    }

    /// Decodes the commitment, returning `None` for bytes that are not a
    /// valid group element.
    pub fn element(&self) -> Option<Element> {
        self.cached.or_else(|| Element::from_bytes(&self.commitment))
    }

    /// Decodes the commitment and caches the result.
    ///
    /// # Panics
    ///
    /// Panics if the stored bytes are not a valid group element; hashed
    /// nodes are only ever built from commitments the tree produced.
    pub(crate) fn element_cached(&mut self) -> Element {
        if let Some(point) = self.cached {
            return point;
        }
        let point = Element::from_bytes(&self.commitment)
            .expect("hashed node carries an invalid commitment");
        self.cached = Some(point);
        point
    }
}

/// A tree node.
#[derive(Clone, Debug)]
pub enum Node {
    /// An absent subtree.
    Empty,
    /// A subtree summarized by its commitment.
    Hashed(HashedNode),
    /// A branching node.
    Internal(Box<InternalNode>),
    /// An extension-and-suffix leaf.
    Leaf(Box<LeafNode>),
    /// A node with partial knowledge of its subtree.
    Stateless(Box<StatelessNode>),
}

impl Default for Node {
    fn default() -> Self {
        Node::Empty
    }
}

impl Node {
    /// Creates the root of a new stateful tree.
    pub fn new() -> Self {
        Node::Internal(Box::new(InternalNode::new(0)))
    }

    /// Inserts or updates the value at `key`.
    pub fn insert(&mut self, key: &Key, value: Vec<u8>) -> Result<(), VerkleError> {
        match self {
            Node::Internal(internal) => internal.insert(key, value),
            Node::Leaf(leaf) if *leaf.stem() == stem_of(key) => {
                leaf.update_slot(suffix_of(key), value);
                Ok(())
            }
            Node::Leaf(_) => Err(VerkleError::InsertIntoOtherStem),
            Node::Stateless(_) => Err(VerkleError::StatelessAndStatefulMix),
            Node::Empty | Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
        }
    }

    /// Ordered insertion with incremental flushing; keys must arrive in
    /// ascending order. Unavailable on stateless trees.
    pub fn insert_ordered(
        &mut self,
        key: &Key,
        value: Vec<u8>,
        flush_fn: &mut dyn FnMut(&Node),
    ) -> Result<(), VerkleError> {
        match self {
            Node::Internal(internal) => internal.insert_ordered(key, value, flush_fn),
            Node::Leaf(leaf) if *leaf.stem() == stem_of(key) => {
                leaf.update_slot(suffix_of(key), value);
                Ok(())
            }
            Node::Leaf(_) => Err(VerkleError::InsertIntoOtherStem),
            Node::Stateless(_) => Err(VerkleError::NotSupportedInStateless),
            Node::Empty | Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
        }
    }

    /// Writes 32 zero bytes at `key`.
    pub fn delete(&mut self, key: &Key) -> Result<(), VerkleError> {
        self.insert(key, vec![0u8; 32])
    }

    /// Reads the value at `key`.
    pub fn get(&self, key: &Key) -> Result<Option<&[u8]>, VerkleError> {
        match self {
            Node::Empty => Ok(None),
            Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
            Node::Internal(internal) => internal.get(key),
            Node::Leaf(leaf) => Ok(leaf.get(key)),
            Node::Stateless(_) => Err(VerkleError::StatelessAndStatefulMix),
        }
    }

    /// Returns the node's commitment, computing it if needed. Idempotent.
    pub fn commit(&mut self) -> Element {
        match self {
            Node::Empty => Element::zero(),
            Node::Hashed(hashed) => hashed.element_cached(),
            Node::Internal(internal) => internal.commit(),
            Node::Leaf(leaf) => leaf.commitment(),
            Node::Stateless(node) => node.commit(),
        }
    }

    /// Returns the cached commitment without computing anything. `None` for
    /// an internal node whose cache was invalidated by a mutation, or for a
    /// hashed node with undecodable bytes.
    pub fn commitment(&self) -> Option<Element> {
        match self {
            Node::Empty => Some(Element::zero()),
            Node::Hashed(hashed) => hashed.element(),
            Node::Internal(internal) => internal.commitment(),
            Node::Leaf(leaf) => Some(leaf.commitment()),
            Node::Stateless(node) => Some(node.commitment()),
        }
    }

    /// The scalar image of the node's commitment.
    pub fn hash(&mut self) -> Fr {
        to_fr(&self.commit())
    }

    /// Hands the subtree to `flush_fn` in post-order: children first, the
    /// node itself last. Stateful internal children are replaced by hashed
    /// nodes once flushed; stateless subtrees are flushed only when they are
    /// entirely resolved, leaves always.
    pub fn flush(&mut self, flush_fn: &mut dyn FnMut(&Node)) {
        match self {
            Node::Internal(internal) => {
                internal.commit();
                for i in 0..NODE_WIDTH {
                    let child = internal.child_mut(i);
                    if matches!(child, Node::Empty | Node::Hashed(_)) {
                        continue;
                    }
                    child.flush(flush_fn);
                    let commitment = child.commit();
                    *child = Node::Hashed(HashedNode::with_cached(commitment));
                }
            }
            Node::Leaf(_) => {}
            Node::Stateless(node) => {
                node.commit();
                node.flush_children(flush_fn);
            }
            Node::Empty | Node::Hashed(_) => return,
        }
        flush_fn(self);
    }

    /// Renders the subtree as a Graphviz digraph, for debugging.
    pub fn to_dot(&mut self) -> String {
        format!("digraph verkle {{\n{}}}\n", self.dot_subtree("", ""))
    }

    pub(crate) fn dot_subtree(&mut self, parent: &str, path: &str) -> String {
        let commitment = self.commit();
        let mut out = String::new();
        match self {
            Node::Empty => {}
            Node::Hashed(_) => {
                let me = format!("hashed{path}");
                out += &format!("{me} [label=\"H: {}\"]\n", hex::encode(commitment.to_bytes()));
                if !parent.is_empty() {
                    out += &format!("{parent} -> {me}\n");
                }
            }
            Node::Leaf(leaf) => {
                let me = format!("leaf{path}");
                out += &format!(
                    "{me} [label=\"L: {}\\nC: {}\\nC1: {}\\nC2: {}\"]\n",
                    hex::encode(leaf.stem()),
                    hex::encode(commitment.to_bytes()),
                    hex::encode(leaf.c1().to_bytes()),
                    hex::encode(leaf.c2().to_bytes()),
                );
                if !parent.is_empty() {
                    out += &format!("{parent} -> {me}\n");
                }
                for (suffix, value) in leaf.values().iter().enumerate() {
                    if let Some(value) = value {
                        out += &format!(
                            "val{path}{suffix:02x} [label=\"{}\"]\n{me} -> val{path}{suffix:02x}\n",
                            hex::encode(value)
                        );
                    }
                }
            }
            Node::Internal(internal) => {
                let me = format!("internal{path}");
                out += &format!("{me} [label=\"I: {}\"]\n", hex::encode(commitment.to_bytes()));
                if !parent.is_empty() {
                    out += &format!("{parent} -> {me}\n");
                }
                for i in 0..NODE_WIDTH {
                    let child_path = format!("{path}{i:02x}");
                    out += &internal.child_mut(i).dot_subtree(&me, &child_path);
                }
            }
            Node::Stateless(node) => {
                out += &node.dot_subtree(parent, path);
            }
        }
        out
    }
}

/// Recomputes a node's commitment bottom-up, ignoring every cache. Intended
/// for consistency checks against the incrementally-maintained values.
pub fn compute_commitment_from_scratch(node: &Node) -> Element {
    match node {
        Node::Empty => Element::zero(),
        Node::Hashed(hashed) => hashed
            .element()
            .expect("hashed node carries an invalid commitment"),
        Node::Leaf(leaf) => {
            LeafNode::new(*leaf.stem(), leaf.values().clone(), leaf.depth()).commitment()
        }
        Node::Internal(internal) => {
            let mut poly = vec![Fr::zero(); NODE_WIDTH];
            let mut empty_count = 0;
            for (i, child) in internal.children().iter().enumerate() {
                match child {
                    Node::Empty => empty_count += 1,
                    _ => poly[i] = to_fr(&compute_commitment_from_scratch(child)),
                }
            }
            config().commit_to_poly(&poly, empty_count)
        }
        Node::Stateless(node) => node.compute_commitment_from_scratch(),
    }
}
