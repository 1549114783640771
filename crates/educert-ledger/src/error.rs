use educert_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Another transaction committed a change to a key this one read.
    #[error("MVCC conflict on key {key:?}")]
    Conflict { key: String },

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("malformed bookmark {0:?}")]
    InvalidBookmark(String),

    /// The underlying store failed.
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidPageSize | Self::InvalidBookmark(_) => ErrorKind::InvalidRequest,
            Self::Backend(_) => ErrorKind::Integrity,
        }
    }
}
