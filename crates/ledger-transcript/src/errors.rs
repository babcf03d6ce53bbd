//! Errors for transcript construction.
//!
//! The hash chain itself cannot fail on well-formed input (spec §4.5); the
//! single variant here guards the one caller contract that isn't enforced
//! by the type system — `old_leaves` and `updates` must be parallel.

use thiserror::Error;

/// Errors raised while constructing a transcript.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    /// `old_leaves` and `updates` were not the same length.
    #[error("old_leaves has {old_leaves} entries but updates has {updates}")]
    LeafCountMismatch {
        /// Length of the `updates` slice.
        updates: usize,
        /// Length of the `old_leaves` slice.
        old_leaves: usize,
    },
}
