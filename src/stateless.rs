//! Stateless nodes: tree execution under partial knowledge.
//!
//! A stateless node plays one of two roles. In internal mode it holds a mix
//! of resolved children and `unresolved` entries that carry only a child's
//! commitment; any path reaching an unresolved slot first inflates it
//! through a caller-supplied [`NodeResolver`]. In leaf mode it holds a
//! sparse suffix-to-value map for a single stem, where a `None` value
//! records a proven absence.
//!
//! Mutations never touch the node's commitment directly. Instead, the
//! commitment of a child is snapshotted into a copy-on-write map right
//! before its first mutation in a batch, and [`StatelessNode::commit`]
//! folds the accumulated differences into the node commitment in one
//! polynomial commitment, then clears the snapshots. A failed resolve or
//! insert therefore leaves the cached commitments consistent with the
//! children.

use std::collections::BTreeMap;

use ark_ff::Zero;
use banderwagon::{Element, Fr};

use crate::committer::{update_commitment, update_suffix_commitment};
use crate::config::{config, extension_marker, stem_to_fr, to_fr};
use crate::constants::{HALF_WIDTH, NODE_WIDTH};
use crate::errors::VerkleError;
use crate::serialization::parse_stateless_node;
use crate::traits::NodeResolver;
use crate::tree::leaf::{LeafNode, C1_SLOT, C2_SLOT};
use crate::tree::{HashedNode, Node};
use crate::types::{
    empty_leaf_values, offset2key, stem_of, suffix_of, CommitmentBytes, Key, Stem,
};

/// Sparse suffix-to-value map of a leaf-mode stateless node. A `None` value
/// marks a suffix proven absent, which is distinct from a suffix the proof
/// says nothing about (missing from the map).
pub type SuffixValues = BTreeMap<u8, Option<Vec<u8>>>;

/// Kind of extension proof a stem carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtStatus {
    /// Nothing lives in this slot; the child must be treated as empty.
    AbsentEmpty,
    /// A different stem occupies the slot, proving this stem absent.
    AbsentOther,
    /// The stem is present with values.
    Present,
}

/// Description of one stem in a received proof, consumed by
/// [`StatelessNode::insert_stem`] during tree reconstruction.
#[derive(Clone, Debug)]
pub struct StemInfo {
    /// The stem being placed.
    pub stem: Stem,
    /// The kind of extension found at the stem's slot.
    pub ext_status: ExtStatus,
    /// Whether the commitment stream carries the leaf's `C1`.
    pub has_c1: bool,
    /// Whether the commitment stream carries the leaf's `C2`.
    pub has_c2: bool,
    /// The proven suffix values.
    pub values: SuffixValues,
}

/// A node whose subtree may be only partially known.
#[derive(Clone, Debug)]
pub struct StatelessNode {
    /// Resolved children, internal mode only.
    children: BTreeMap<u8, Node>,
    /// Commitments of children whose bodies are absent. An index never
    /// appears both here and in `children`.
    unresolved: BTreeMap<u8, CommitmentBytes>,
    /// Suffix values, leaf mode only.
    values: Option<SuffixValues>,
    /// The stem, leaf mode only.
    stem: Option<Stem>,
    depth: u8,
    /// Saved child commitments, keyed by child index: the value each child
    /// committed to before the first mutation of the current batch.
    cow: BTreeMap<u8, Element>,
    commitment: Element,
    c1: Option<Element>,
    c2: Option<Element>,
}

impl StatelessNode {
    /// Creates an empty internal-mode node. Its commitment starts at the
    /// group identity, so an empty tree commits to the identity.
    pub fn new(depth: u8) -> Self {
        Self {
            children: BTreeMap::new(),
            unresolved: BTreeMap::new(),
            values: None,
            stem: None,
            depth,
            cow: BTreeMap::new(),
            commitment: Element::zero(),
            c1: None,
            c2: None,
        }
    }

    /// Creates an internal-mode node carrying a known commitment, as found
    /// in a received proof.
    pub fn with_commitment(commitment: Element, depth: u8) -> Self {
        Self {
            commitment,
            ..Self::new(depth)
        }
    }

    pub(crate) fn from_parsed_internal(
        depth: u8,
        commitment: Element,
        unresolved: BTreeMap<u8, CommitmentBytes>,
    ) -> Self {
        Self {
            unresolved,
            ..Self::with_commitment(commitment, depth)
        }
    }

    pub(crate) fn from_parsed_leaf(
        depth: u8,
        commitment: Element,
        stem: Stem,
        values: SuffixValues,
        c1: Element,
        c2: Element,
    ) -> Self {
        Self {
            values: Some(values),
            stem: Some(stem),
            c1: Some(c1),
            c2: Some(c2),
            ..Self::with_commitment(commitment, depth)
        }
    }

    /// Whether this node acts as a leaf.
    pub fn is_leaf(&self) -> bool {
        self.values.is_some()
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub(crate) fn set_depth(&mut self, depth: u8) {
        self.depth = depth;
    }

    /// The node's current commitment. Only [`StatelessNode::commit`] moves
    /// it, so it reflects the state as of the last commit.
    pub fn commitment(&self) -> Element {
        self.commitment
    }

    /// The scalar image of the node's commitment.
    pub fn hash(&self) -> Fr {
        to_fr(&self.commitment)
    }

    pub fn stem(&self) -> Option<&Stem> {
        self.stem.as_ref()
    }

    pub fn values(&self) -> Option<&SuffixValues> {
        self.values.as_ref()
    }

    pub fn c1(&self) -> Option<Element> {
        self.c1
    }

    pub fn c2(&self) -> Option<Element> {
        self.c2
    }

    pub fn children(&self) -> &BTreeMap<u8, Node> {
        &self.children
    }

    pub fn unresolved(&self) -> &BTreeMap<u8, CommitmentBytes> {
        &self.unresolved
    }

    /// Installs a child node. Only stateless children may enter a stateless
    /// tree this way.
    pub fn set_child(&mut self, index: usize, node: Node) -> Result<(), VerkleError> {
        if index >= NODE_WIDTH {
            return Err(VerkleError::ChildIndexOutOfRange(index));
        }
        match node {
            Node::Stateless(_) => {
                self.children.insert(index as u8, node);
                Ok(())
            }
            _ => Err(VerkleError::StatelessAndStatefulMix),
        }
    }

    /// Snapshots the commitment of child `index` unless the current batch
    /// already did: first touch wins. Missing and empty children snapshot
    /// the group identity, so their first commitment is counted in full.
    fn cow_child(&mut self, index: u8) {
        if self.values.is_some() || self.cow.contains_key(&index) {
            return;
        }
        let snapshot = match self.children.get_mut(&index) {
            None | Some(Node::Empty) => Element::zero(),
            Some(child) => child.commit(),
        };
        self.cow.insert(index, snapshot);
    }

    /// Inflates the child at `index` from its commitment, through the
    /// resolver. The unresolved entry survives a resolver failure, so a
    /// failed descent leaves the subtree in its unresolved state.
    fn inflate<R: NodeResolver>(
        &mut self,
        index: u8,
        stem_prefix: &[u8],
        resolver: &R,
    ) -> Result<(), VerkleError> {
        let commitment = match (self.unresolved.get(&index), self.children.get(&index)) {
            (Some(bytes), _) => *bytes,
            (None, Some(Node::Hashed(hashed))) => *hashed.commitment_bytes(),
            _ => return Ok(()),
        };
        let serialized = resolver
            .resolve(&commitment)
            .map_err(|err| VerkleError::ResolverFailed {
                stem_prefix: hex::encode(stem_prefix),
                reason: format!("{err:?}"),
            })?;
        let node = parse_stateless_node(&serialized, self.depth + 1, &commitment)?;
        self.unresolved.remove(&index);
        self.children.insert(index, Node::Stateless(Box::new(node)));
        Ok(())
    }

    /// Inserts or updates the value at `key`, resolving placeholders on the
    /// way down.
    pub fn insert<R: NodeResolver>(
        &mut self,
        key: &Key,
        value: Vec<u8>,
        resolver: &R,
    ) -> Result<(), VerkleError> {
        let mut values = empty_leaf_values();
        values[suffix_of(key) as usize] = Some(value);
        self.insert_at_stem(&stem_of(key), &values, resolver)
    }

    /// Writes 32 zero bytes at `key`, preserving the leaf marker: a deleted
    /// value stays distinguishable from one that never existed.
    pub fn delete<R: NodeResolver>(&mut self, key: &Key, resolver: &R) -> Result<(), VerkleError> {
        self.insert(key, vec![0u8; 32], resolver)
    }

    /// Inserts a full slot assignment for a stem.
    pub fn insert_at_stem<R: NodeResolver>(
        &mut self,
        stem: &Stem,
        values: &[Option<Vec<u8>>],
        resolver: &R,
    ) -> Result<(), VerkleError> {
        debug_assert_eq!(values.len(), NODE_WIDTH);

        if self.values.is_some() {
            self.update_multiple_leaves(values);
            return Ok(());
        }

        let nchild = offset2key(stem, self.depth);
        let prefix = &stem[..=self.depth as usize];

        let vacant = matches!(self.children.get(&nchild), None | Some(Node::Empty));
        if vacant {
            if self.unresolved.contains_key(&nchild) {
                self.inflate(nchild, prefix, resolver)?;
            } else {
                // A brand new subtree. The snapshot is the identity, so the
                // fresh leaf's commitment is counted in full at commit time.
                self.cow.entry(nchild).or_insert_with(Element::zero);
                let leaf = LeafNode::new(*stem, values.to_vec(), self.depth + 1);
                self.children.insert(nchild, Node::Leaf(Box::new(leaf)));
                return Ok(());
            }
        }

        // A child installed by proof reconstruction may still be opaque.
        if matches!(self.children.get(&nchild), Some(Node::Hashed(_))) {
            self.inflate(nchild, prefix, resolver)?;
        }

        self.cow_child(nchild);

        let child = self
            .children
            .get_mut(&nchild)
            .expect("child resolved above");
        match child {
            Node::Internal(inner) => {
                inner.insert_stem(stem, values)?;
                inner.commit();
                Ok(())
            }
            Node::Stateless(node) => node.insert_at_stem(stem, values, resolver),
            Node::Leaf(leaf) if leaf.stem() == stem => {
                leaf.update_multiple_leaves(values);
                Ok(())
            }
            Node::Leaf(_) => {
                let Node::Leaf(mut old_leaf) = std::mem::take(child) else {
                    unreachable!("matched a leaf")
                };
                // Two stems now share the slot: push the old leaf one level
                // down under a new intermediate node. The intermediate
                // starts from the identity commitment and snapshots the
                // moved leaf's slot at the identity, so the leaf's
                // contribution is not subtracted from itself.
                let mut branch = StatelessNode::new(old_leaf.depth());
                let moved = offset2key(old_leaf.stem(), branch.depth);
                branch.cow.insert(moved, Element::zero());
                old_leaf.set_depth(branch.depth + 1);
                branch.children.insert(moved, Node::Leaf(old_leaf));

                let result = branch.insert_at_stem(stem, values, resolver);
                *child = Node::Stateless(Box::new(branch));
                result
            }
            Node::Empty | Node::Hashed(_) => Err(VerkleError::NotSupportedInStateless),
        }
    }

    /// Batch slot update for a leaf-mode node, with the same delta algebra
    /// as [`LeafNode::update_multiple_leaves`]: both sub-commitments settle
    /// before the node commitment is touched.
    fn update_multiple_leaves(&mut self, values: &[Option<Vec<u8>>]) {
        let mut old1: Option<Fr> = None;
        let mut old2: Option<Fr> = None;

        for (index, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            if value.is_empty() {
                continue;
            }
            let suffix = index as u8;
            let current = self
                .values
                .as_ref()
                .and_then(|map| map.get(&suffix))
                .cloned()
                .flatten();
            if current.as_deref() == Some(value.as_slice()) {
                continue;
            }

            let sub = if index < HALF_WIDTH {
                let c1 = self
                    .c1
                    .as_mut()
                    .expect("leaf carries its first sub-commitment");
                if old1.is_none() {
                    old1 = Some(to_fr(c1));
                }
                c1
            } else {
                let c2 = self
                    .c2
                    .as_mut()
                    .expect("leaf carries its second sub-commitment");
                if old2.is_none() {
                    old2 = Some(to_fr(c2));
                }
                c2
            };
            update_suffix_commitment(sub, suffix, current.as_deref(), Some(value));

            self.values
                .as_mut()
                .expect("node is in leaf mode")
                .insert(suffix, Some(value.clone()));
        }

        if let Some(old) = old1 {
            let new = to_fr(self.c1.as_ref().expect("updated above"));
            update_commitment(&mut self.commitment, C1_SLOT, &old, &new);
        }
        if let Some(old) = old2 {
            let new = to_fr(self.c2.as_ref().expect("updated above"));
            update_commitment(&mut self.commitment, C2_SLOT, &old, &new);
        }
    }

    /// Reads the value at `key`, resolving placeholders on the way down.
    /// Returns `None` for keys outside the known subtrees.
    pub fn get<R: NodeResolver>(
        &mut self,
        key: &Key,
        resolver: &R,
    ) -> Result<Option<Vec<u8>>, VerkleError> {
        if let Some(values) = &self.values {
            if self.stem == Some(stem_of(key)) {
                return Ok(values.get(&suffix_of(key)).cloned().flatten());
            }
            return Ok(None);
        }

        let nchild = offset2key(key, self.depth);
        if !self.children.contains_key(&nchild) {
            if !self.unresolved.contains_key(&nchild) {
                return Ok(None);
            }
            let prefix = &key[..=self.depth as usize];
            self.inflate(nchild, prefix, resolver)?;
        }

        match self.children.get_mut(&nchild).expect("child resolved above") {
            Node::Empty => Ok(None),
            Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
            Node::Leaf(leaf) => Ok(leaf.get(key).map(<[u8]>::to_vec)),
            Node::Internal(inner) => Ok(inner.get(key)?.map(<[u8]>::to_vec)),
            Node::Stateless(node) => node.get(key, resolver),
        }
    }

    /// Folds the copy-on-write snapshots into the node commitment: one
    /// difference polynomial, one commitment, then the snapshots are
    /// cleared. A no-op when nothing was touched since the last commit.
    ///
    /// Leaf-mode nodes maintain their commitment incrementally on every
    /// update, so for them this simply returns the cached point.
    pub fn commit(&mut self) -> Element {
        if self.values.is_some() || self.cow.is_empty() {
            return self.commitment;
        }

        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        let mut empty_count = NODE_WIDTH;
        let cow = std::mem::take(&mut self.cow);
        for (index, snapshot) in cow {
            empty_count -= 1;
            let pre = to_fr(&snapshot);
            let post = match self.children.get_mut(&index) {
                Some(child) => to_fr(&child.commit()),
                None => Fr::zero(),
            };
            poly[index as usize] = post - pre;
        }

        self.commitment += config().commit_to_poly(&poly, empty_count);
        self.commitment
    }

    /// Places a stem described by a received proof, consuming commitments
    /// from `comms` as children are materialized. Returns the unconsumed
    /// tail of the stream.
    pub fn insert_stem<'a>(
        &mut self,
        path: &[u8],
        stem_info: &StemInfo,
        mut comms: &'a [Element],
    ) -> Result<&'a [Element], VerkleError> {
        if path.is_empty() {
            return Err(VerkleError::ParseError("empty path in stem placement".into()));
        }

        // One path byte left: this level receives the stem itself.
        if path.len() == 1 {
            match stem_info.ext_status {
                ExtStatus::AbsentEmpty => {
                    // The proof shows nothing lives here. The slot must act
                    // as empty, not as an opaque commitment.
                    self.children.insert(path[0], Node::Empty);
                }
                ExtStatus::AbsentOther => {
                    let (comm, rest) = split_comms(comms)?;
                    self.children
                        .insert(path[0], Node::Hashed(HashedNode::with_cached(*comm)));
                    comms = rest;
                }
                ExtStatus::Present => {
                    let (comm, rest) = split_comms(comms)?;
                    comms = rest;
                    let mut child = StatelessNode::with_commitment(*comm, self.depth + 1);
                    if stem_info.has_c1 {
                        let (c1, rest) = split_comms(comms)?;
                        child.c1 = Some(*c1);
                        comms = rest;
                    }
                    if stem_info.has_c2 {
                        let (c2, rest) = split_comms(comms)?;
                        child.c2 = Some(*c2);
                        comms = rest;
                    }
                    child.values = Some(stem_info.values.clone());
                    child.stem = Some(stem_info.stem);
                    self.children.insert(path[0], Node::Stateless(Box::new(child)));
                }
            }
            return Ok(comms);
        }

        // Materialize the next level if missing, then recurse.
        if !self.children.contains_key(&path[0]) {
            let (comm, rest) = split_comms(comms)?;
            comms = rest;
            let child = StatelessNode::with_commitment(*comm, self.depth + 1);
            self.children.insert(path[0], Node::Stateless(Box::new(child)));
        }

        match self.children.get_mut(&path[0]) {
            Some(Node::Stateless(child)) => child.insert_stem(&path[1..], stem_info, comms),
            _ => Err(VerkleError::StatelessAndStatefulMix),
        }
    }

    /// Writes a value into a reconstructed tree. An empty slot on the path
    /// is a proof of absence: writing a non-empty value there means the
    /// proof did not authorize the key.
    pub fn insert_value(&mut self, key: &Key, value: Option<Vec<u8>>) -> Result<(), VerkleError> {
        if let Some(values) = &mut self.values {
            if self.stem != Some(stem_of(key)) {
                return Err(VerkleError::InsertIntoOtherStem);
            }
            values.insert(suffix_of(key), value);
            return Ok(());
        }

        let nchild = offset2key(key, self.depth);
        match self.children.get_mut(&nchild) {
            None | Some(Node::Empty) => {
                if value.as_ref().is_some_and(|v| !v.is_empty()) {
                    return Err(VerkleError::InsertIntoOtherStem);
                }
                Ok(())
            }
            Some(Node::Stateless(child)) => child.insert_value(key, value),
            Some(_) => Err(VerkleError::StatelessAndStatefulMix),
        }
    }

    /// Whether every subtree below this node is fully known: no unresolved
    /// entries, no opaque children, and leaf modes with all slots loaded.
    pub fn fully_resolved(&self) -> bool {
        if let Some(values) = &self.values {
            return values.len() == NODE_WIDTH;
        }
        self.unresolved.is_empty()
            && self.children.values().all(|child| match child {
                Node::Stateless(node) => node.fully_resolved(),
                Node::Hashed(_) => false,
                _ => true,
            })
    }

    /// Flushes resolved children. Partially known subtrees are skipped:
    /// flushing them would persist an incomplete picture.
    pub(crate) fn flush_children(&mut self, flush_fn: &mut dyn FnMut(&Node)) {
        if self.values.is_some() {
            return;
        }
        for child in self.children.values_mut() {
            match child {
                Node::Empty | Node::Hashed(_) => continue,
                Node::Leaf(_) => flush_fn(child),
                Node::Internal(_) => child.flush(flush_fn),
                Node::Stateless(_) => {
                    let (resolved, leaf_mode) = match child {
                        Node::Stateless(node) => (node.fully_resolved(), node.is_leaf()),
                        _ => unreachable!("matched a stateless node"),
                    };
                    if !resolved {
                        continue;
                    }
                    if leaf_mode {
                        flush_fn(child);
                    } else {
                        child.flush(flush_fn);
                    }
                }
            }
        }
    }

    /// Recomputes the commitment bottom-up, ignoring the cached point and
    /// the copy-on-write machinery. Unresolved children contribute the
    /// scalar image of their stored commitment.
    pub(crate) fn compute_commitment_from_scratch(&self) -> Element {
        if self.values.is_some() {
            let mut poly = vec![Fr::zero(); NODE_WIDTH];
            poly[0] = extension_marker();
            poly[1] = stem_to_fr(self.stem.as_ref().expect("leaf mode has a stem"));
            poly[C1_SLOT] = self.c1.as_ref().map(to_fr).unwrap_or_else(Fr::zero);
            poly[C2_SLOT] = self.c2.as_ref().map(to_fr).unwrap_or_else(Fr::zero);
            return config().commit_to_poly(&poly, NODE_WIDTH - 4);
        }

        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        let mut empty_count = NODE_WIDTH;
        for (index, child) in &self.children {
            if matches!(child, Node::Empty) {
                continue;
            }
            poly[*index as usize] = to_fr(&crate::tree::compute_commitment_from_scratch(child));
            empty_count -= 1;
        }
        for (index, bytes) in &self.unresolved {
            poly[*index as usize] = to_fr(
                &Element::from_bytes(bytes).expect("unresolved entry holds a valid commitment"),
            );
            empty_count -= 1;
        }
        config().commit_to_poly(&poly, empty_count)
    }

    pub(crate) fn dot_subtree(&mut self, parent: &str, path: &str) -> String {
        self.commit();
        let mut out = String::new();
        if self.is_leaf() {
            let me = format!("sleaf{path}");
            let c1 = self.c1.map(|c| hex::encode(c.to_bytes())).unwrap_or_default();
            let c2 = self.c2.map(|c| hex::encode(c.to_bytes())).unwrap_or_default();
            out += &format!(
                "{me} [label=\"L: {}\\nC: {}\\nC1: {c1}\\nC2: {c2}\"]\n",
                self.stem.as_ref().map(hex::encode).unwrap_or_default(),
                hex::encode(self.commitment.to_bytes()),
            );
            if !parent.is_empty() {
                out += &format!("{parent} -> {me}\n");
            }
        } else {
            let me = format!("sinternal{path}");
            out += &format!(
                "{me} [label=\"I: {}\"]\n",
                hex::encode(self.commitment.to_bytes())
            );
            if !parent.is_empty() {
                out += &format!("{parent} -> {me}\n");
            }
            let indices: Vec<u8> = self.children.keys().copied().collect();
            for index in indices {
                let child_path = format!("{path}{index:02x}");
                if let Some(child) = self.children.get_mut(&index) {
                    out += &child.dot_subtree(&me, &child_path);
                }
            }
        }
        out
    }
}

fn split_comms(comms: &[Element]) -> Result<(&Element, &[Element]), VerkleError> {
    comms
        .split_first()
        .ok_or_else(|| VerkleError::ParseError("commitment stream exhausted".into()))
}
