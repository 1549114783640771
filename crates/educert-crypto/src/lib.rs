//! # educert-crypto: Cryptographic Primitives
//!
//! - **SHA-256** attribute leaf hashing and node hashing.
//! - **Merkle commitments** over schema-ordered attribute values, with
//!   multiproofs for selective disclosure.
//! - **P-256 ECDSA** verification of issuer and holder signatures over a
//!   commitment, plus a key pair for tooling and tests.
//!
//! ## Crate Policy
//!
//! - Depends only on `educert-core` internally.
//! - Verification entry points return `bool` and fold every malformed input
//!   into `false`. They never panic.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   SHA-256 and real P-256 signatures.

pub mod ecdsa;
pub mod error;
pub mod merkle;
pub mod sha256;

pub use ecdsa::{verify as verify_signature, P256KeyPair};
pub use error::CryptoError;
pub use merkle::{verify_multi_proof, MerkleTree, MultiProof};
pub use sha256::{leaf_hash, node_hash};
