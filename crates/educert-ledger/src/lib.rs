//! # educert-ledger: Keyed Ledger Store
//!
//! The contract never talks to a concrete ledger. It opens a
//! [`Transaction`] through a [`LedgerStore`], reads and writes opaque
//! values under [`LedgerKey`](educert_core::LedgerKey)s, runs equality
//! [`Selector`] queries, and commits.
//!
//! ## Guarantees required of an implementation
//!
//! - A transaction's writes become visible atomically on `commit`, or not
//!   at all.
//! - If any key the transaction read was changed by another committed
//!   transaction in the meantime, `commit` fails with
//!   [`LedgerError::Conflict`]. At most one writer per key wins.
//! - `timestamp()` is fixed for the lifetime of the transaction.
//!
//! Selector query results are not part of the read set (no phantom
//! protection), matching CouchDB-backed Fabric peers.
//!
//! [`InMemoryLedger`] implements all of this behind a `parking_lot` lock.

pub mod error;
pub mod memory;
pub mod query;
pub mod store;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use query::{KeyValue, QueryPage, Selector};
pub use store::{LedgerStore, Transaction};
