//! # Error Types
//!
//! The stable error taxonomy shared by every EduCert crate, plus the
//! errors raised by the types in this crate.
//!
//! Each higher-level error enum (`CryptoError`, `LedgerError`,
//! `ContractError`, `AppError`) exposes a `kind()` that maps onto
//! [`ErrorKind`]. The kind is what callers branch on; the message is for
//! humans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Caller lacks organizational or attribute-based permission, or a
    /// key/claim mismatch was detected.
    Unauthorized,
    /// Duplicate credential id, issuer name, contact attribute, public key,
    /// or schema version.
    AlreadyExists,
    /// Missing schema, issuer, or credential.
    NotFound,
    /// A cryptographic signature check failed.
    InvalidSignature,
    /// Malformed request parameters (e.g. an empty disclosure set).
    InvalidRequest,
    /// The ledger write committed but a dependent off-ledger projection
    /// failed or diverged.
    SyncGap,
    /// The credential lifecycle does not permit the requested transition.
    InvalidTransition,
    /// A concurrent transaction touched the same keys first.
    Conflict,
    /// Stored data could not be decoded or the store failed.
    Integrity,
}

impl ErrorKind {
    /// Returns the wire code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::SyncGap => "SYNC_GAP",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Conflict => "CONFLICT",
            Self::Integrity => "INTEGRITY",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical ledger values.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A value failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required identifier was empty or whitespace-only.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending field.
        field: &'static str,
    },

    /// An identifier contained characters the ledger key namespace forbids.
    #[error("{field} contains a forbidden character: {value:?}")]
    ForbiddenCharacter {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A string did not parse as the expected format.
    #[error("invalid {field}: {reason}")]
    Malformed {
        /// Name of the offending field.
        field: &'static str,
        /// Why parsing failed.
        reason: String,
    },
}

impl ValidationError {
    /// Validation failures are always client errors.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidRequest
    }
}
