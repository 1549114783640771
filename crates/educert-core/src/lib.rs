//! # educert-core: Foundational Types for EduCert
//!
//! The leaf of the workspace dependency graph. Every other `educert-*` crate
//! builds on the types defined here; this crate depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `CredentialId`, `SchemaVersion`,
//!    `IssuerName`, `ContactAttribute`, `OrganizationId`, `EncodedPublicKey`.
//!    No bare strings cross crate boundaries where a name can be confused
//!    with a key or a contact attribute.
//!
//! 2. **`CanonicalBytes` for ledger values.** Everything written to the
//!    ledger is RFC 8785 canonical JSON, so the same record always produces
//!    the same bytes.
//!
//! 3. **`LedgerKey` namespaces.** Keys are built only through
//!    [`LedgerKey`] constructors (`SCHEMA_`, `ISSUER_`, `ISSUER_BY_CONTACT_`,
//!    `PUBLICKEY_`, `CRED_`).
//!
//! 4. **UTC-only timestamps** truncated to seconds.
//!
//! 5. **Stable error kinds.** [`ErrorKind`] is the taxonomy every crate maps
//!    its errors onto.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod keys;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::CommitmentHash;
pub use error::{CanonicalizationError, ErrorKind, ValidationError};
pub use identity::{
    ContactAttribute, CredentialId, EncodedPublicKey, IssuerName, OrganizationId, SchemaVersion,
};
pub use keys::{KeyNamespace, LedgerKey};
pub use temporal::Timestamp;
