use educert_core::{LedgerKey, Timestamp};

use crate::error::LedgerError;
use crate::query::{QueryPage, Selector};

/// A ledger that hands out transactions.
pub trait LedgerStore: Send + Sync {
    /// Open a transaction against the current committed state.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, LedgerError>;
}

/// One unit of work against the ledger.
///
/// Dropping a transaction without calling [`Transaction::commit`]
/// discards its writes.
pub trait Transaction {
    /// Read a value. Writes made earlier in the same transaction are
    /// visible.
    fn get(&mut self, key: &LedgerKey) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Stage a write.
    fn put(&mut self, key: &LedgerKey, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Run an equality selector over committed values, in key order.
    ///
    /// `bookmark` is the opaque continuation returned by the previous page.
    fn query_by_selector(
        &mut self,
        selector: &Selector,
        page_size: usize,
        bookmark: Option<&str>,
    ) -> Result<QueryPage, LedgerError>;

    /// Transaction time, identical for every call within the transaction.
    fn timestamp(&self) -> Timestamp;

    /// Validate the read set and apply staged writes atomically.
    fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}
