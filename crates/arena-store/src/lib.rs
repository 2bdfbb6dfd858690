//! Persistence for seasons and rounds.
//!
//! The coordinator only talks to [`SeasonStore`] and [`RoundStore`], both
//! implemented by [`StagedTransaction`]. A transaction stages every write and
//! hands them to its [`ScheduleBackend`] in one atomic `apply` on commit.

pub mod config;
pub mod contract;
pub mod error;
pub mod memory;
pub mod rocks;
pub mod transaction;

pub use config::StoreConfig;
pub use contract::{RoundStore, ScheduleBackend, SeasonStore, WriteOp};
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use rocks::RocksBackend;
pub use transaction::StagedTransaction;
