//! Proof creation and verification through the multipoint argument.
//!
//! The tree emits openings; the `ipa-multipoint` crate turns them into a
//! single constant-size argument. This module is the glue: it builds the
//! prover queries from extracted [`ProofElements`], drives the transcript,
//! and exposes a serializable proof wrapper.

use banderwagon::{Element, Fr};
use ipa_multipoint::{
    lagrange_basis::{LagrangeBasis, PrecomputedWeights},
    multiproof::{MultiPoint, MultiPointProof, ProverQuery, VerifierQuery},
    transcript::Transcript,
};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::config;
use crate::constants::NODE_WIDTH;
use crate::proof::{ProofElements, ProofError};
use crate::tree::Node;
use crate::types::Key;

/// Barycentric weights for the evaluation domain, shared by every proof.
pub static PRECOMPUTED_WEIGHTS: Lazy<PrecomputedWeights> =
    Lazy::new(|| PrecomputedWeights::new(NODE_WIDTH));

/// Domain separator for proof transcripts.
const TRANSCRIPT_LABEL: &[u8] = b"vt";

/// A multipoint argument over the openings of a tree walk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerkleProof {
    /// The aggregated polynomial commitment proof.
    #[serde(serialize_with = "serialize_multipoint_proof")]
    #[serde(deserialize_with = "deserialize_multipoint_proof")]
    pub proof: MultiPointProof,
}

fn serialize_multipoint_proof<S>(proof: &MultiPointProof, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let bytes = proof
        .to_bytes()
        .map_err(|e| serde::ser::Error::custom(format!("{e:?}")))?;
    bytes.serialize(serializer)
}

fn deserialize_multipoint_proof<'de, D>(deserializer: D) -> Result<MultiPointProof, D::Error>
where
    D: Deserializer<'de>,
{
    let bytes = Vec::<u8>::deserialize(deserializer)?;
    MultiPointProof::from_bytes(&bytes, NODE_WIDTH)
        .map_err(|e| serde::de::Error::custom(format!("{e:?}")))
}

impl VerkleProof {
    /// Creates a proof for `keys` against a stateful tree. The tree is
    /// committed first; keys are sorted and deduplicated.
    ///
    /// Returns the proof together with the extracted elements, which a
    /// verifier consumes and a stateless reconstruction is built from.
    pub fn create(root: &mut Node, keys: &[Key]) -> Result<(VerkleProof, ProofElements), ProofError> {
        if keys.is_empty() {
            return Err(ProofError::ProveFailed("empty key set".into()));
        }
        let mut keys = keys.to_vec();
        if keys.windows(2).any(|w| w[0] > w[1]) {
            keys.par_sort_unstable();
        }
        keys.dedup();

        root.commit();
        let mut elements = ProofElements::default();
        root.proof_items(&keys, &[], &mut elements)?;

        let queries = prover_queries(&elements)?;
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        let proof = MultiPoint::open(
            config().crs().clone(),
            &PRECOMPUTED_WEIGHTS,
            &mut transcript,
            queries,
        );

        Ok((VerkleProof { proof }, elements))
    }

    /// Verifies the proof against a set of openings and the expected root
    /// commitment. The first opened commitment of a walk is always the
    /// root's.
    pub fn check(
        &self,
        elements: &ProofElements,
        root_commitment: &Element,
    ) -> Result<(), ProofError> {
        if elements.cis.is_empty() {
            return Err(ProofError::VerifyFailed("empty proof elements".into()));
        }
        if elements.cis.first() != Some(root_commitment) {
            return Err(ProofError::VerifyFailed(
                "proof does not open the expected root commitment".into(),
            ));
        }

        let queries: Vec<VerifierQuery> = elements
            .cis
            .iter()
            .zip(&elements.zis)
            .zip(&elements.yis)
            .map(|((commitment, point), result)| VerifierQuery {
                commitment: *commitment,
                point: Fr::from(*point as u128),
                result: *result,
            })
            .collect();

        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        if self
            .proof
            .check(config().crs(), &PRECOMPUTED_WEIGHTS, &queries, &mut transcript)
        {
            Ok(())
        } else {
            Err(ProofError::VerifyFailed(
                "multipoint proof check failed".into(),
            ))
        }
    }
}

fn prover_queries(elements: &ProofElements) -> Result<Vec<ProverQuery>, ProofError> {
    if elements.fis.len() != elements.cis.len() {
        return Err(ProofError::ProveFailed(
            "proof elements lack the opened polynomials".into(),
        ));
    }
    Ok(elements
        .cis
        .iter()
        .zip(&elements.zis)
        .zip(&elements.yis)
        .zip(&elements.fis)
        .map(|(((commitment, point), result), poly)| ProverQuery {
            commitment: *commitment,
            poly: LagrangeBasis::new(poly.clone()),
            point: *point as usize,
            result: *result,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{stem_of, suffix_of};
    use ark_ff::Zero;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn sample_tree(rng: &mut StdRng, n: usize) -> (Node, Vec<Key>) {
        let mut root = Node::new();
        let mut keys = Vec::with_capacity(n);
        for _ in 0..n {
            let key: Key = rng.gen();
            root.insert(&key, rng.gen::<[u8; 32]>().to_vec()).unwrap();
            keys.push(key);
        }
        (root, keys)
    }

    #[test]
    fn proof_roundtrip_for_present_and_absent_keys() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut root, mut keys) = sample_tree(&mut rng, 50);
        // Query some keys that are not in the tree as well.
        keys.push(rng.gen());
        keys.push(rng.gen());

        let (proof, elements) = VerkleProof::create(&mut root, &keys).unwrap();
        let root_commitment = root.commit();
        proof.check(&elements, &root_commitment).unwrap();

        // A proof does not verify against a different root.
        let mut other = Node::new();
        other.insert(&rng.gen(), vec![1; 32]).unwrap();
        let other_commitment = other.commit();
        assert!(proof.check(&elements, &other_commitment).is_err());
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mut root, keys) = sample_tree(&mut rng, 30);

        let (_, first) = VerkleProof::create(&mut root, &keys).unwrap();
        let (_, second) = VerkleProof::create(&mut root, &keys).unwrap();

        assert_eq!(first.zis, second.zis);
        assert_eq!(first.yis, second.yis);
        let first_cis: Vec<_> = first.cis.iter().map(Element::to_bytes).collect();
        let second_cis: Vec<_> = second.cis.iter().map(Element::to_bytes).collect();
        assert_eq!(first_cis, second_cis);
    }

    #[test]
    fn deleted_and_absent_slots_prove_differently() {
        let mut key: Key = [9u8; 32];
        key[31] = 5;
        let mut absent = key;
        absent[31] = 6;

        let mut root = Node::new();
        root.insert(&key, vec![0x77; 32]).unwrap();
        root.delete(&key).unwrap();
        root.commit();

        let mut deleted_elements = ProofElements::default();
        root.proof_items(&[key], &[], &mut deleted_elements).unwrap();
        let mut absent_elements = ProofElements::default();
        root.proof_items(&[absent], &[], &mut absent_elements)
            .unwrap();

        // Suffix openings are the last two emissions of a leaf walk. The
        // deleted slot answers with the leaf marker in its low half; the
        // never-written slot answers with the zero pair.
        let deleted_lo = deleted_elements.yis[deleted_elements.yis.len() - 2];
        assert!(!deleted_lo.is_zero());
        assert!(deleted_elements.yis.last().unwrap().is_zero());

        let absent_lo = absent_elements.yis[absent_elements.yis.len() - 2];
        assert!(absent_lo.is_zero());
        assert!(absent_elements.yis.last().unwrap().is_zero());

        assert_ne!(deleted_elements.yis, absent_elements.yis);
        // Both walks open the same leaf commitment, with the marker
        // distinguishing the answers.
        assert_eq!(stem_of(&key), stem_of(&absent));
        assert_ne!(suffix_of(&key), suffix_of(&absent));
    }

    #[test]
    fn proof_serde_roundtrip() {
        let mut rng = StdRng::seed_from_u64(3);
        let (mut root, keys) = sample_tree(&mut rng, 10);
        let (proof, elements) = VerkleProof::create(&mut root, &keys).unwrap();

        let encoded = serde_json::to_string(&proof).unwrap();
        let decoded: VerkleProof = serde_json::from_str(&encoded).unwrap();

        let root_commitment = root.commit();
        decoded.check(&elements, &root_commitment).unwrap();
    }

    #[test]
    fn stateful_extraction_rejects_opaque_nodes() {
        let mut root = Node::new();
        let key: Key = [1u8; 32];
        root.insert(&key, vec![1; 32]).unwrap();
        root.commit();
        let mut store = |_: &Node| {};
        root.flush(&mut store);

        // After a flush the root was replaced by the callback view; the
        // flushed tree itself only retains hashed children, which cannot be
        // walked for a proof.
        let mut elements = ProofElements::default();
        assert!(root.proof_items(&[key], &[], &mut elements).is_err());
    }
}
