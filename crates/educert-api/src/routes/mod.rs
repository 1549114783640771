//! # API Route Modules
//!
//! - `schemas`: publish and read attribute schemas.
//! - `issuers`: register and read issuer profiles.
//! - `credentials`: issue, read, revoke and list credentials, and cut
//!   disclosure proofs.
//! - `proofs`: verify disclosure proofs against the ledger.
//! - `ledger`: raw paginated ledger listing for the administrator.

pub mod credentials;
pub mod issuers;
pub mod ledger;
pub mod proofs;
pub mod schemas;
