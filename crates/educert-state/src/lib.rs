//! # educert-state: Credential Lifecycle
//!
//! ```text
//! NonExistent ──issue──▶ Issued ──revoke──▶ Revoked (terminal)
//! ```
//!
//! There is no transition out of `Revoked` and no transition back to
//! `NonExistent`: credentials are never deleted and a revoked credential
//! stays revoked.

pub mod credential;

pub use credential::{CredentialLifecycle, CredentialStatus, LifecycleError, Revocation};
