//! Proof element extraction and the glue to the polynomial commitment
//! prover.
//!
//! The tree side of a proof is a sequence of openings `(C_i, z_i, y_i)`:
//! commitment `C_i`, evaluated at the domain point `z_i`, claims the value
//! `y_i`. The extraction walk also records, per path, which commitment was
//! opened there, and, when walking a stateful tree, the opened
//! polynomials themselves, which the prover needs. The emission order is
//! part of the contract: verifiers assume this exact interleaving.

pub mod extract;
pub mod prover;

use banderwagon::{Element, Fr};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::errors::VerkleError;

pub use prover::VerkleProof;

/// Error type for proof creation and verification.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Proof creation failed.
    #[error("prove failed: {0}")]
    ProveFailed(String),
    /// Proof verification failed.
    #[error("verify failed: {0}")]
    VerifyFailed(String),
    /// A tree operation failed during extraction.
    #[error(transparent)]
    Tree(#[from] VerkleError),
}

/// The openings collected along the queried paths of a tree.
#[derive(Clone, Debug, Default)]
pub struct ProofElements {
    /// Commitments opened, in emission order.
    pub cis: Vec<Element>,
    /// Evaluation points: byte indices into the parent polynomial.
    pub zis: Vec<u8>,
    /// Claimed evaluations.
    pub yis: Vec<Fr>,
    /// The opened polynomials, parallel to `cis`. Filled only when
    /// extracting from a stateful tree; a stateless tree knows the openings
    /// but not the polynomials behind them, so its extraction leaves this
    /// empty and can only serve verification.
    pub fis: Vec<Vec<Fr>>,
    /// Which commitment was opened at each byte path.
    pub by_path: FxHashMap<Vec<u8>, Element>,
}
