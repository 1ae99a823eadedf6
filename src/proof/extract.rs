//! The extraction walks producing [`ProofElements`].
//!
//! Two walks exist, matching the two tree flavors:
//!
//! - the **key-driven** walk over a stateful tree opens exactly the slots a
//!   set of queried keys traverses, and records the opened polynomials for
//!   the prover;
//! - the **structure-driven** walk over a stateless tree opens everything
//!   the tree contains (a reconstructed tree holds exactly the
//!   proof-relevant paths) and serves verification only.

use ark_ff::Zero;
use banderwagon::Fr;

use crate::config::{extension_marker, leaf_to_comms, stem_to_fr, to_fr};
use crate::constants::{HALF_WIDTH, NODE_WIDTH};
use crate::errors::VerkleError;
use crate::proof::ProofElements;
use crate::stateless::StatelessNode;
use crate::tree::leaf::{C1_SLOT, C2_SLOT};
use crate::tree::{InternalNode, LeafNode, Node};
use crate::types::{offset2key, stem_of, suffix_of, Key};

/// Splits sorted keys into runs sharing the child byte at `depth`.
fn group_by_child(keys: &[Key], depth: u8) -> Vec<(u8, &[Key])> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < keys.len() {
        let byte = offset2key(&keys[start], depth);
        let mut end = start + 1;
        while end < keys.len() && offset2key(&keys[end], depth) == byte {
            end += 1;
        }
        groups.push((byte, &keys[start..end]));
        start = end;
    }
    groups
}

impl Node {
    /// Key-driven extraction entry point. The tree must be committed and
    /// `keys` sorted.
    pub(crate) fn proof_items(
        &self,
        keys: &[Key],
        path: &[u8],
        elements: &mut ProofElements,
    ) -> Result<(), VerkleError> {
        match self {
            // Absence at this point was already proven by the parent's
            // zero opening.
            Node::Empty => Ok(()),
            Node::Hashed(_) => Err(VerkleError::InsertIntoHash),
            Node::Internal(internal) => internal.proof_items(keys, path, elements),
            Node::Leaf(leaf) => {
                leaf.proof_items(keys, path, elements);
                Ok(())
            }
            Node::Stateless(_) => Err(VerkleError::StatelessAndStatefulMix),
        }
    }
}

impl InternalNode {
    fn proof_items(
        &self,
        keys: &[Key],
        path: &[u8],
        elements: &mut ProofElements,
    ) -> Result<(), VerkleError> {
        let commitment = self
            .commitment()
            .expect("proof extraction requires a committed tree");

        // The polynomial this node's commitment opens against.
        let mut fi = vec![Fr::zero(); NODE_WIDTH];
        for (i, child) in self.children().iter().enumerate() {
            if !matches!(child, Node::Empty) {
                fi[i] = to_fr(
                    &child
                        .commitment()
                        .expect("proof extraction requires a committed tree"),
                );
            }
        }

        let groups = group_by_child(keys, self.depth());

        // All openings at this level first, then the recursions, each in
        // ascending child order.
        for (index, _) in &groups {
            elements.cis.push(commitment);
            elements.zis.push(*index);
            elements.yis.push(fi[*index as usize]);
            elements.fis.push(fi.clone());
            let mut child_path = path.to_vec();
            child_path.push(*index);
            elements.by_path.insert(child_path, commitment);
        }

        for (index, group) in groups {
            let mut child_path = path.to_vec();
            child_path.push(index);
            self.children()[index as usize].proof_items(group, &child_path, elements)?;
        }
        Ok(())
    }
}

impl LeafNode {
    fn proof_items(&self, keys: &[Key], path: &[u8], elements: &mut ProofElements) {
        let commitment = self.commitment();
        let ext_poly = self.extension_poly();

        // Extension-level openings, in fixed order: marker, stem, then the
        // touched sub-commitments.
        elements.cis.push(commitment);
        elements.zis.push(0);
        elements.yis.push(extension_marker());
        elements.fis.push(ext_poly.clone());

        elements.cis.push(commitment);
        elements.zis.push(1);
        elements.yis.push(stem_to_fr(self.stem()));
        elements.fis.push(ext_poly.clone());

        // Queried suffixes belonging to this stem. Keys carrying another
        // stem are proven absent by the stem opening above alone.
        let mut suffixes: Vec<u8> = keys
            .iter()
            .filter(|key| stem_of(key) == *self.stem())
            .map(suffix_of)
            .collect();
        suffixes.sort_unstable();
        suffixes.dedup();

        let has_c1 = suffixes.iter().any(|s| (*s as usize) < HALF_WIDTH);
        let has_c2 = suffixes.iter().any(|s| (*s as usize) >= HALF_WIDTH);
        if has_c1 {
            elements.cis.push(commitment);
            elements.zis.push(C1_SLOT as u8);
            elements.yis.push(to_fr(&self.c1()));
            elements.fis.push(ext_poly.clone());
        }
        if has_c2 {
            elements.cis.push(commitment);
            elements.zis.push(C2_SLOT as u8);
            elements.yis.push(to_fr(&self.c2()));
            elements.fis.push(ext_poly.clone());
        }
        elements.by_path.insert(path.to_vec(), commitment);

        for suffix in suffixes {
            let (sub, half) = if (suffix as usize) < HALF_WIDTH {
                (self.c1(), 0)
            } else {
                (self.c2(), 1)
            };
            let sub_poly = self.suffix_poly(half);

            // An absent value opens to the zero pair: no leaf marker was
            // ever added, which is exactly what distinguishes it from a
            // deleted (zero-valued) slot.
            let [lo, hi] = leaf_to_comms(self.values()[suffix as usize].as_deref());
            let lo_z = suffix.wrapping_mul(2);
            elements.cis.push(sub);
            elements.zis.push(lo_z);
            elements.yis.push(lo);
            elements.fis.push(sub_poly.clone());
            elements.cis.push(sub);
            elements.zis.push(lo_z.wrapping_add(1));
            elements.yis.push(hi);
            elements.fis.push(sub_poly);

            let mut slot_path = path.to_vec();
            slot_path.push(2 + suffix / HALF_WIDTH as u8);
            elements.by_path.insert(slot_path, sub);
        }
    }
}

impl StatelessNode {
    /// Structure-driven extraction: emits the openings for everything this
    /// tree knows. The result carries no polynomials, so it can verify a
    /// proof but not produce one.
    pub fn get_proof_items(&self) -> Result<ProofElements, VerkleError> {
        let mut elements = ProofElements::default();
        self.proof_items(&[], &mut elements)?;
        Ok(elements)
    }

    fn proof_items(&self, path: &[u8], elements: &mut ProofElements) -> Result<(), VerkleError> {
        let commitment = self.commitment();

        if let Some(values) = self.values() {
            // Leaf mode. Extension-level openings first, fixed order.
            elements.cis.push(commitment);
            elements.zis.push(0);
            elements.yis.push(extension_marker());

            elements.cis.push(commitment);
            elements.zis.push(1);
            elements
                .yis
                .push(stem_to_fr(self.stem().expect("leaf mode has a stem")));

            let has_c1 = values.keys().any(|s| (*s as usize) < HALF_WIDTH);
            let has_c2 = values.keys().any(|s| (*s as usize) >= HALF_WIDTH);
            if has_c1 {
                elements.cis.push(commitment);
                elements.zis.push(C1_SLOT as u8);
                elements
                    .yis
                    .push(self.c1().as_ref().map(to_fr).unwrap_or_else(Fr::zero));
            }
            if has_c2 {
                elements.cis.push(commitment);
                elements.zis.push(C2_SLOT as u8);
                elements
                    .yis
                    .push(self.c2().as_ref().map(to_fr).unwrap_or_else(Fr::zero));
            }
            elements.by_path.insert(path.to_vec(), commitment);

            for (suffix, value) in values {
                let sub = if (*suffix as usize) < HALF_WIDTH {
                    self.c1()
                } else {
                    self.c2()
                };
                // The whole suffix subtree is absent: its zero commitment is
                // already part of the extension-level openings.
                let Some(sub) = sub else { continue };

                let [lo, hi] = leaf_to_comms(value.as_deref());
                let lo_z = suffix.wrapping_mul(2);
                elements.cis.push(sub);
                elements.zis.push(lo_z);
                elements.yis.push(lo);
                elements.cis.push(sub);
                elements.zis.push(lo_z.wrapping_add(1));
                elements.yis.push(hi);

                let mut slot_path = path.to_vec();
                slot_path.push(2 + suffix / HALF_WIDTH as u8);
                elements.by_path.insert(slot_path, sub);
            }
            return Ok(());
        }

        // Internal mode: open every known child in ascending order, then
        // recurse. Hashed and empty children are not descended into; their
        // opening at this level is all the verifier needs.
        for (index, child) in self.children() {
            let yi = match child {
                Node::Empty => Fr::zero(),
                _ => to_fr(&child.commitment().ok_or_else(|| {
                    VerkleError::ParseError("invalid commitment on proof path".into())
                })?),
            };
            elements.cis.push(commitment);
            elements.zis.push(*index);
            elements.yis.push(yi);
            let mut child_path = path.to_vec();
            child_path.push(*index);
            elements.by_path.insert(child_path, commitment);
        }

        for (index, child) in self.children() {
            let mut child_path = path.to_vec();
            child_path.push(*index);
            match child {
                Node::Stateless(node) => node.proof_items(&child_path, elements)?,
                Node::Empty | Node::Hashed(_) => {}
                Node::Leaf(_) | Node::Internal(_) => {
                    return Err(VerkleError::StatelessAndStatefulMix)
                }
            }
        }
        Ok(())
    }
}
