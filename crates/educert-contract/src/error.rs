//! # Contract Errors
//!
//! One enum for every failure a contract operation can report, each
//! carrying a stable [`ErrorKind`] and a human-readable message. Errors
//! from the lower crates convert through `From` so operations can use `?`
//! throughout.

use educert_core::{CanonicalizationError, CredentialId, ErrorKind, ValidationError};
use educert_crypto::CryptoError;
use educert_ledger::LedgerError;
use educert_state::LifecycleError;
use thiserror::Error;

use crate::policy::PolicyDenied;
use crate::projection::ProjectionError;
use crate::records::CodecError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The ledger committed but the off-ledger projection is out of step
    /// with it for this credential.
    #[error("ledger and attribute store out of sync for credential {credential_id}: {reason}")]
    SyncGap {
        credential_id: CredentialId,
        reason: String,
    },

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A concurrent transaction won the race for a key this one read.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded or the store failed.
    #[error("integrity failure: {0}")]
    Integrity(String),
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidSignature(_) => ErrorKind::InvalidSignature,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::SyncGap { .. } => ErrorKind::SyncGap,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Integrity(_) => ErrorKind::Integrity,
        }
    }

    /// Build the variant matching `kind`.
    ///
    /// `SyncGap` needs a credential id and cannot be built here; it maps to
    /// `Integrity`.
    pub(crate) fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::Unauthorized => Self::Unauthorized(message),
            ErrorKind::AlreadyExists => Self::AlreadyExists(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidSignature => Self::InvalidSignature(message),
            ErrorKind::InvalidRequest => Self::InvalidRequest(message),
            ErrorKind::InvalidTransition => Self::InvalidTransition(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::SyncGap | ErrorKind::Integrity => Self::Integrity(message),
        }
    }
}

impl From<LedgerError> for ContractError {
    fn from(err: LedgerError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

impl From<LifecycleError> for ContractError {
    fn from(err: LifecycleError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

impl From<CryptoError> for ContractError {
    fn from(err: CryptoError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for ContractError {
    fn from(err: ValidationError) -> Self {
        Self::from_kind(err.kind(), err.to_string())
    }
}

impl From<CanonicalizationError> for ContractError {
    fn from(err: CanonicalizationError) -> Self {
        Self::Integrity(err.to_string())
    }
}

impl From<CodecError> for ContractError {
    fn from(err: CodecError) -> Self {
        Self::Integrity(err.to_string())
    }
}

impl From<PolicyDenied> for ContractError {
    fn from(err: PolicyDenied) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<ProjectionError> for ContractError {
    fn from(err: ProjectionError) -> Self {
        Self::Integrity(err.to_string())
    }
}
