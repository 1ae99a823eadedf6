//! Process-wide tree configuration: the commitment basis and the scalar
//! conversions used throughout the tree.
//!
//! The configuration is immutable after initialization and shared by every
//! tree in the process through a lazily-initialized static, so the expensive
//! basis setup happens exactly once.

use ark_ff::{One, PrimeField, Zero};
use banderwagon::{multi_scalar_mul, Element, Fr};
use ipa_multipoint::crs::CRS;
use once_cell::sync::Lazy;

use crate::constants::{HALF_WIDTH, LEAF_VALUE_SIZE, MULTI_EXP_THRESHOLD, NODE_WIDTH};
use crate::types::Stem;

/// Global shared configuration, initialized on first use.
static CONFIG: Lazy<TreeConfig> = Lazy::new(TreeConfig::new);

/// Returns the process-wide tree configuration.
pub fn config() -> &'static TreeConfig {
    &CONFIG
}

/// Tree-wide commitment parameters: the SRS basis points and the polynomial
/// commitment helper built on them.
#[derive(Debug)]
pub struct TreeConfig {
    crs: CRS,
}

impl TreeConfig {
    fn new() -> Self {
        Self {
            crs: CRS::default(),
        }
    }

    /// The SRS basis points. The leaf sub-commitment layout interleaves the
    /// low and high halves of 128 values, so every index used by the tree
    /// stays below [`NODE_WIDTH`].
    pub fn srs(&self) -> &[Element] {
        &self.crs.G
    }

    /// The full commitment scheme parameters, for the proving layer.
    pub(crate) fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Commits to a width-256 polynomial given in evaluation form.
    ///
    /// `empty_count` is the number of entries known to be empty; when the
    /// number of non-empty entries reaches [`MULTI_EXP_THRESHOLD`], a full
    /// multi-exponentiation beats summing individual scalar products.
    pub fn commit_to_poly(&self, poly: &[Fr], empty_count: usize) -> Element {
        debug_assert_eq!(poly.len(), NODE_WIDTH);

        if NODE_WIDTH - empty_count >= MULTI_EXP_THRESHOLD {
            multi_scalar_mul(&self.crs.G, poly)
        } else {
            let mut commitment = Element::zero();
            for (i, scalar) in poly.iter().enumerate() {
                if !scalar.is_zero() {
                    commitment += self.crs.G[i] * *scalar;
                }
            }
            commitment
        }
    }
}

/// Canonical scalar image of a group element, used as the "hash" of a
/// commitment everywhere in the tree. Deterministic, and maps the group
/// identity to the zero scalar.
#[inline]
pub fn to_fr(point: &Element) -> Fr {
    point.map_to_scalar_field()
}

/// Interprets a stem as a scalar, via little-endian reduction.
#[inline]
pub fn stem_to_fr(stem: &Stem) -> Fr {
    Fr::from_le_bytes_mod_order(stem)
}

/// Splits a leaf value into the two scalars committed to by the leaf
/// sub-commitments.
///
/// A present value contributes its low 16 bytes plus the leaf marker bit
/// `2^128` as the first scalar, and its high bytes as the second. The marker
/// distinguishes a slot that was written (even with all-zero bytes) from a
/// slot that never was; an absent value yields `(0, 0)`.
///
/// # Panics
///
/// Panics if the value is longer than [`LEAF_VALUE_SIZE`] bytes.
pub fn leaf_to_comms(value: Option<&[u8]>) -> [Fr; 2] {
    let Some(value) = value else {
        return [Fr::zero(), Fr::zero()];
    };
    if value.is_empty() {
        return [Fr::zero(), Fr::zero()];
    }
    assert!(
        value.len() <= LEAF_VALUE_SIZE,
        "leaf values are at most {LEAF_VALUE_SIZE} bytes"
    );

    let mut lo_with_marker = [0u8; 17];
    let lo_end = value.len().min(16);
    lo_with_marker[..lo_end].copy_from_slice(&value[..lo_end]);
    lo_with_marker[16] = 1; // the 2^128 leaf marker

    let lo = Fr::from_le_bytes_mod_order(&lo_with_marker);
    let hi = if value.len() > 16 {
        Fr::from_le_bytes_mod_order(&value[16..])
    } else {
        Fr::zero()
    };
    [lo, hi]
}

/// The scalar placed at polynomial slot 0 of every leaf commitment.
#[inline]
pub fn extension_marker() -> Fr {
    Fr::one()
}

/// Index of the low-half scalar of `suffix` inside a sub-commitment
/// polynomial. The high-half scalar sits right after it.
#[inline]
pub(crate) fn suffix_slot(suffix: u8) -> usize {
    2 * (suffix as usize % HALF_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_serialize::CanonicalSerialize;

    fn fr_to_le_bytes(fr: Fr) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        fr.serialize_compressed(&mut bytes[..])
            .expect("failed to serialize scalar");
        bytes
    }

    /// The group-to-field map must stay consistent with the reference
    /// implementations, or every commitment in existence changes.
    #[test]
    fn consistent_group_to_field() {
        let expected = "d1e7de2aaea9603d5bc6c208d319596376556ecd8336671ba7670c2139772d14";
        let generator = Element::prime_subgroup_generator();
        assert_eq!(hex::encode(fr_to_le_bytes(to_fr(&generator))), expected);
    }

    #[test]
    fn identity_maps_to_zero_scalar() {
        assert!(to_fr(&Element::zero()).is_zero());
    }

    #[test]
    fn leaf_to_comms_marker_bit() {
        // A written all-zero value differs from an absent value only in the
        // marker bit of the low half.
        let zeros = [0u8; 32];
        let [lo, hi] = leaf_to_comms(Some(&zeros));
        let mut marker_only = [0u8; 17];
        marker_only[16] = 1;
        assert_eq!(lo, Fr::from_le_bytes_mod_order(&marker_only));
        assert!(hi.is_zero());

        let [lo, hi] = leaf_to_comms(None);
        assert!(lo.is_zero() && hi.is_zero());
    }

    #[test]
    fn leaf_to_comms_halves() {
        let mut value = [0u8; 32];
        value[0] = 0x11;
        value[16] = 0x22;
        let [lo, hi] = leaf_to_comms(Some(&value));

        let mut lo_expected = [0u8; 17];
        lo_expected[0] = 0x11;
        lo_expected[16] = 1;
        assert_eq!(lo, Fr::from_le_bytes_mod_order(&lo_expected));
        assert_eq!(hi, Fr::from_le_bytes_mod_order(&value[16..]));

        // Short values live entirely in the low half.
        let short = [0x33u8; 10];
        let [_, hi] = leaf_to_comms(Some(&short));
        assert!(hi.is_zero());
    }

    #[test]
    fn commit_to_poly_msm_matches_direct_sum() {
        let cfg = config();
        let mut poly = vec![Fr::zero(); NODE_WIDTH];
        for (i, entry) in poly.iter_mut().enumerate().take(150) {
            *entry = Fr::from((i + 1) as u64);
        }
        // Force both code paths over the same polynomial by lying about the
        // empty count, and check they agree.
        let dense = cfg.commit_to_poly(&poly, 0);
        let sparse = cfg.commit_to_poly(&poly, NODE_WIDTH - 1);
        assert_eq!(dense, sparse);
    }

    #[test]
    fn empty_poly_commits_to_identity() {
        let poly = vec![Fr::zero(); NODE_WIDTH];
        assert_eq!(
            config().commit_to_poly(&poly, NODE_WIDTH),
            Element::zero()
        );
    }
}
