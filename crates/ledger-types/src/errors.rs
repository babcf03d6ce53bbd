//! Errors surfaced purely from type-level (de)serialization.

use thiserror::Error;

/// Errors from decoding wire-layout records into typed entities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// A byte buffer had the wrong length for the type being decoded.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
}
