//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`ContractError`] onto HTTP status codes and a JSON error body
//! with a stable code and a message. Integrity failures are logged and
//! answered with a generic message; a sync gap names the affected
//! credential so operators can repair the projection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use educert_contract::ContractError;
use educert_core::CredentialId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "SYNC_GAP").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Schema, issuer or credential not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed body, header or parameter (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token or caller identity (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The access policy denied the operation (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Duplicate credential, issuer, key or schema (409).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A signature did not verify over the commitment (422).
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The credential lifecycle forbids the operation (409).
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A concurrent write won the race (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Ledger committed, attribute projection did not (500).
    #[error("sync gap for credential {credential_id}: {reason}")]
    SyncGap {
        credential_id: CredentialId,
        reason: String,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::AlreadyExists(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            Self::InvalidSignature(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SIGNATURE"),
            Self::InvalidTransition(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::SyncGap { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SYNC_GAP"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                ("An internal error occurred".to_string(), None)
            }
            Self::SyncGap { credential_id, .. } => {
                tracing::error!(error = %self, "attribute projection out of sync");
                (
                    format!(
                        "credential {credential_id} is on the ledger but its attributes are not retrievable"
                    ),
                    Some(serde_json::json!({ "credentialId": credential_id })),
                )
            }
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Unauthorized(m) => Self::Forbidden(m),
            ContractError::AlreadyExists(m) => Self::AlreadyExists(m),
            ContractError::NotFound(m) => Self::NotFound(m),
            ContractError::InvalidSignature(m) => Self::InvalidSignature(m),
            ContractError::InvalidRequest(m) => Self::BadRequest(m),
            ContractError::SyncGap {
                credential_id,
                reason,
            } => Self::SyncGap {
                credential_id,
                reason,
            },
            ContractError::InvalidTransition(m) => Self::InvalidTransition(m),
            ContractError::Conflict(m) => Self::Conflict(m),
            ContractError::Integrity(m) => Self::Internal(m),
        }
    }
}

impl From<educert_core::ValidationError> for AppError {
    fn from(err: educert_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
