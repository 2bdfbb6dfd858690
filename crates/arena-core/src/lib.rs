//! Arena schedule domain.
//!
//! A season covers an inclusive block range and is split into fixed-length
//! rounds. When a season boundary is corrected, this crate works out how the
//! round partition must change without disturbing rounds a live reader has
//! already seen.

pub mod change;
pub mod diff;
pub mod error;
pub mod partition;
pub mod retention;
pub mod tiling;
pub mod types;

pub use change::{ChangeKind, ChangeRecord};
pub use diff::{resolve_diff, BoundaryDiff, DiffOutcome};
pub use error::{ScheduleError, ValidationError};
pub use partition::{partition, span_count};
pub use retention::{resolve_retention, RetentionOptions, RetentionPlan, RetentionPolicy};
pub use tiling::{verify_season_rounds, verify_tiling};
pub use types::{
    BlockIndex, BlockSpan, BoundaryUpdate, PlannedRound, Round, RoundId, Season,
    SeasonAttributes, SeasonId,
};
