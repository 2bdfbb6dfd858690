use thiserror::Error;

use crate::types::{BlockIndex, SeasonId};

/// Malformed boundaries or a retention decision that would break tiling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Inverted block span: start {start} > end {end}")]
    InvertedSpan { start: BlockIndex, end: BlockIndex },

    #[error("Round interval must be positive, got {0}")]
    NonPositiveInterval(i64),

    #[error("Invalid season id: {0}")]
    InvalidSeasonId(i64),

    #[error("Negative block index: {0}")]
    NegativeBlock(i64),

    #[error(
        "Season {season_id}: new end block {new_end} truncates retained rounds ending at {retained_end}"
    )]
    ShrinkBelowRetained {
        season_id: SeasonId,
        new_end: BlockIndex,
        retained_end: BlockIndex,
    },

    #[error(
        "Season {season_id}: new start block {new_start} does not match retained rounds starting at {retained_start}"
    )]
    RetainedStartMismatch {
        season_id: SeasonId,
        new_start: BlockIndex,
        retained_start: BlockIndex,
    },

    #[error("Tiling violated: {0}")]
    Tiling(String),

    #[error("Duplicate boundary for season {0}")]
    DuplicateSeason(SeasonId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Season not found: {0}")]
    SeasonNotFound(SeasonId),

    #[error("Season {season_id}: cursor {cursor} is outside every existing round")]
    RetentionAmbiguity { season_id: SeasonId, cursor: BlockIndex },
}
