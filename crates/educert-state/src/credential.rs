//! # Credential Lifecycle State Machine
//!
//! Revocation is the only mutation a credential ever sees. The revocation
//! time is supplied by the caller from the ledger transaction clock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use educert_core::{ErrorKind, Timestamp};

// ─── Status ──────────────────────────────────────────────────────────

/// The lifecycle state of a credential id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialStatus {
    /// No record has ever been written under this id.
    NonExistent,
    Issued,
    /// Permanently revoked (terminal).
    Revoked,
}

impl CredentialStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether `self → to` is an edge of the lifecycle graph.
    pub fn can_transition_to(&self, to: CredentialStatus) -> bool {
        matches!(
            (self, to),
            (Self::NonExistent, Self::Issued) | (Self::Issued, Self::Revoked)
        )
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NonExistent => "NON_EXISTENT",
            Self::Issued => "ISSUED",
            Self::Revoked => "REVOKED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// A record already exists under this id.
    #[error("credential already issued (state {state})")]
    AlreadyIssued { state: CredentialStatus },

    #[error("invalid credential transition: {from} -> {to}")]
    InvalidTransition {
        from: CredentialStatus,
        to: CredentialStatus,
    },

    #[error("credential is in terminal state {state}")]
    TerminalState { state: CredentialStatus },

    /// Stored revocation fields contradict each other.
    #[error("inconsistent stored lifecycle: {0}")]
    Inconsistent(String),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyIssued { .. } => ErrorKind::AlreadyExists,
            Self::InvalidTransition { .. } | Self::TerminalState { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::Inconsistent(_) => ErrorKind::Integrity,
        }
    }
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Why and when a credential was revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    pub reason: String,
    pub revoked_at: Timestamp,
}

/// The lifecycle of one existing credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLifecycle {
    status: CredentialStatus,
    revocation: Option<Revocation>,
}

impl CredentialLifecycle {
    /// Issue a credential whose id currently has status `current`.
    pub fn issue(current: CredentialStatus) -> Result<Self, LifecycleError> {
        if current != CredentialStatus::NonExistent {
            return Err(LifecycleError::AlreadyIssued { state: current });
        }
        Ok(Self {
            status: CredentialStatus::Issued,
            revocation: None,
        })
    }

    /// Rebuild from the flat fields stored on a credential record.
    pub fn from_stored(
        revoked: bool,
        reason: Option<String>,
        revoked_at: Option<Timestamp>,
    ) -> Result<Self, LifecycleError> {
        match (revoked, reason, revoked_at) {
            (false, None, None) => Ok(Self {
                status: CredentialStatus::Issued,
                revocation: None,
            }),
            (true, reason, Some(revoked_at)) => Ok(Self {
                status: CredentialStatus::Revoked,
                revocation: Some(Revocation {
                    reason: reason.unwrap_or_default(),
                    revoked_at,
                }),
            }),
            (true, _, None) => Err(LifecycleError::Inconsistent(
                "revoked without a revocation time".to_string(),
            )),
            (false, _, _) => Err(LifecycleError::Inconsistent(
                "revocation details on an unrevoked credential".to_string(),
            )),
        }
    }

    pub fn status(&self) -> CredentialStatus {
        self.status
    }

    pub fn is_revoked(&self) -> bool {
        self.status == CredentialStatus::Revoked
    }

    pub fn revocation(&self) -> Option<&Revocation> {
        self.revocation.as_ref()
    }

    /// Revoke (ISSUED → REVOKED). Repeat revocation is rejected.
    pub fn revoke(
        &mut self,
        reason: impl Into<String>,
        at: Timestamp,
    ) -> Result<&Revocation, LifecycleError> {
        self.require_transition(CredentialStatus::Revoked)?;
        self.status = CredentialStatus::Revoked;
        Ok(self.revocation.insert(Revocation {
            reason: reason.into(),
            revoked_at: at,
        }))
    }

    fn require_transition(&self, to: CredentialStatus) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::TerminalState { state: self.status });
        }
        if !self.status.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
