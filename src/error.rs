use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger and its document store.
///
/// The ledger performs no retries of its own; every error propagates to the
/// caller, and all of them are recoverable by retrying the surrounding
/// operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(String),

    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("store unavailable: {0}")]
    Transport(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &err {
            if matches!(
                inner.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) {
                return LedgerError::TransactionConflict(err.to_string());
            }
        }
        LedgerError::Transport(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Transport(anyhow::Error::new(err))
    }
}
