//! Callback traits connecting the tree to its storage backend.

use std::fmt::Debug;

use crate::types::CommitmentBytes;

/// Resolves an unresolved subtree from its commitment.
///
/// The returned bytes must be the serialized form of the node committing to
/// `commitment`, as produced by [`crate::Node::serialize`]. Implementations
/// must be pure with respect to a given backing store: resolving the same
/// commitment twice yields the same bytes.
pub trait NodeResolver {
    /// The resolver's own error type.
    type Error: Debug;

    /// Fetches the serialized node with the given commitment.
    fn resolve(&self, commitment: &CommitmentBytes) -> Result<Vec<u8>, Self::Error>;
}
