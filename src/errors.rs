//! Error type for tree operations.

use thiserror::Error;

/// All failures the tree core can report. Errors bubble up unchanged; the
/// core never retries, and copy-on-write snapshots guarantee that a failed
/// deep operation leaves commitment caches consistent with the children.
#[derive(Debug, Error)]
pub enum VerkleError {
    /// A mutation or lookup reached an opaque hashed node that was not
    /// resolved first.
    #[error("trying to access a hashed node")]
    InsertIntoHash,

    /// A child slot index at or above the node width.
    #[error("child index {0} is higher than the node width")]
    ChildIndexOutOfRange(usize),

    /// A stateless operation found a stateful node in a forbidden position,
    /// or vice versa.
    #[error("invalid mix of stateless and stateful nodes")]
    StatelessAndStatefulMix,

    /// A value write under a stem the tree does not cover, either because the
    /// leaf holds a different stem or because the proof that built the tree
    /// did not authorize the key.
    #[error("inserting a value under a foreign stem")]
    InsertIntoOtherStem,

    /// The resolver callback failed while inflating an unresolved subtree.
    #[error("resolving node at stem prefix {stem_prefix}: {reason}")]
    ResolverFailed {
        /// Hex-encoded stem prefix of the path being resolved.
        stem_prefix: String,
        /// The resolver's own error, formatted.
        reason: String,
    },

    /// The operation is unavailable on a stateless tree.
    #[error("operation not supported in stateless mode")]
    NotSupportedInStateless,

    /// A serialized node or proof stream could not be decoded.
    #[error("parsing serialized node: {0}")]
    ParseError(String),
}
