//! Incremental commitment update algebra.
//!
//! A vector commitment is `C = Σ f_i · SRS[i]`. When a single entry changes
//! from `old` to `new`, the commitment moves by `(new − old) · SRS[i]`; this
//! module applies exactly that delta. It is the only way cached commitments
//! are ever mutated; full recomputation is reserved for uninitialized
//! caches.

use banderwagon::{Element, Fr};

use crate::config::{config, leaf_to_comms, suffix_slot};

/// Applies a single-entry delta to a commitment: the entry at polynomial
/// slot `index` moved from the scalar `old` to `new`.
pub fn update_commitment(commitment: &mut Element, index: usize, old: &Fr, new: &Fr) {
    let delta = *new - *old;
    *commitment += config().srs()[index] * delta;
}

/// Applies a value change at `suffix` to the covering leaf sub-commitment.
///
/// The value splits into two scalars occupying adjacent basis slots, so a
/// single slot write moves the sub-commitment by two deltas.
pub fn update_suffix_commitment(
    sub_commitment: &mut Element,
    suffix: u8,
    old_value: Option<&[u8]>,
    new_value: Option<&[u8]>,
) {
    let srs = config().srs();
    let old = leaf_to_comms(old_value);
    let new = leaf_to_comms(new_value);
    let slot = suffix_slot(suffix);

    *sub_commitment += srs[slot] * (new[0] - old[0]);
    *sub_commitment += srs[slot + 1] * (new[1] - old[1]);
}
