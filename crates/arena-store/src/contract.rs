// STORE CONTRACTS
// What the reconciliation coordinator needs from persistence, and what a
// backend must provide for the staged transaction to sit on top of it.
//
// INVARIANTS:
// 1. `list_by_season` returns rounds ordered by start block, ascending
// 2. `ScheduleBackend::apply` is all-or-nothing: on error no op is visible

use arena_core::{BlockIndex, BlockSpan, Round, RoundId, Season, SeasonId};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub trait SeasonStore {
    fn get(&self, id: SeasonId) -> Result<Season, StoreError>;

    fn set_boundary(
        &mut self,
        id: SeasonId,
        start_block: BlockIndex,
        end_block: BlockIndex,
    ) -> Result<(), StoreError>;
}

pub trait RoundStore {
    fn list_by_season(&self, season_id: SeasonId) -> Result<Vec<Round>, StoreError>;

    fn delete(&mut self, round_id: RoundId) -> Result<(), StoreError>;

    fn insert(
        &mut self,
        season_id: SeasonId,
        round_index: u32,
        span: BlockSpan,
    ) -> Result<Round, StoreError>;
}

/// A single write, staged and later applied atomically with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    PutSeason(Season),
    SetBoundary {
        season_id: SeasonId,
        start_block: BlockIndex,
        end_block: BlockIndex,
    },
    DeleteRound {
        season_id: SeasonId,
        round_id: RoundId,
    },
    InsertRound(Round),
}

/// Committed state plus one atomic write path.
pub trait ScheduleBackend: Send + Sync {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError>;

    /// All seasons, ordered by id.
    fn load_seasons(&self) -> Result<Vec<Season>, StoreError>;

    /// A season's rounds ordered by start block.
    fn load_rounds(&self, season_id: SeasonId) -> Result<Vec<Round>, StoreError>;

    fn round_owner(&self, round_id: RoundId) -> Result<Option<SeasonId>, StoreError>;

    /// First id not yet handed out.
    fn next_round_id(&self) -> Result<RoundId, StoreError>;

    fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError>;
}
