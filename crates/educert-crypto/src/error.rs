use educert_core::ErrorKind;
use thiserror::Error;

/// Errors from tree construction, proof generation and key handling.
///
/// Verification never produces these; it returns `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("cannot build a commitment over zero attributes")]
    EmptyTree,

    #[error("disclosure set is empty")]
    EmptyIndexSet,

    #[error("attribute index {index} out of range for {leaf_count} attributes")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("attribute index {index} requested more than once")]
    DuplicateIndex { index: usize },

    #[error("key error: {0}")]
    KeyError(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidRequest
    }
}
