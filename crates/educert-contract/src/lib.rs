//! # educert-contract: Credential Contract
//!
//! The issuance and revocation logic of EduCert, written against the
//! [`LedgerStore`](educert_ledger::LedgerStore) interface so it runs the
//! same on the in-memory ledger and on any other backend.
//!
//! - **Schema registry**: append-only schema versions, cached in a
//!   [`SchemaCache`].
//! - **Issuer registration**: one profile per name, public key and contact
//!   attribute.
//! - **Issuance and revocation**: signature-checked, ABAC-guarded, one
//!   transaction per operation.
//! - **Queries**: by holder, issuer, or schema version, with per-record
//!   decode failures isolated.
//! - **Selective disclosure**: proofs cut from the off-ledger
//!   [`AttributeStore`] and verified against the on-ledger commitment.
//!
//! ## Crate Policy
//!
//! - Every ledger value goes through the versioned envelope codec in
//!   [`records`].
//! - Policy decisions take an explicit [`CallerContext`]; nothing reads
//!   ambient identity.
//! - Errors carry a stable [`ErrorKind`](educert_core::ErrorKind).

pub mod contract;
pub mod disclosure;
pub mod error;
pub mod policy;
pub mod projection;
pub mod records;
pub mod schema;
pub mod service;

pub use contract::{
    CredentialEntry, CredentialPage, EducertContract, IssueRequest, LedgerEntry, LedgerPage,
    RegisterIssuerRequest, QUERY_PAGE_SIZE,
};
pub use disclosure::{DisclosureVerdict, ProofBundle};
pub use error::ContractError;
pub use policy::{CallerContext, ContactMatch, PolicyConfig, PolicyDenied};
pub use projection::{
    AttributeStore, CredentialAttributes, FileAttributeStore, InMemoryAttributeStore,
    ProjectionError,
};
pub use records::{CredentialRecord, DocType, IssuerProfile, PublicKeyBinding};
pub use schema::{Schema, SchemaCache};
pub use service::CredentialService;
