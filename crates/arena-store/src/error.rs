use arena_core::{RoundId, SeasonId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Season not found: {0}")]
    SeasonNotFound(SeasonId),

    #[error("Round not found: {0}")]
    RoundNotFound(RoundId),

    #[error("Round id space exhausted")]
    RoundIdExhausted,

    #[error("Storage backend error: {0}")]
    Backend(#[from] rocksdb::Error),

    #[error("Missing column family: {0}")]
    MissingColumnFamily(&'static str),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupt record under key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// Not-found errors describe bad input; everything else is a storage fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::SeasonNotFound(_) | StoreError::RoundNotFound(_))
    }
}
