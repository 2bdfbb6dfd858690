use arena_core::ScheduleError;
use arena_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Boundary source unreadable: {0}")]
    Ingest(#[from] csv_async::Error),

    #[error("Boundary source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
