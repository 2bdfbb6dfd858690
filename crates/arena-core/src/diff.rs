// SEASON DIFF RESOLVER
// Compares a stored season boundary against a proposed correction.
//
// Only (start_block, end_block) changes trigger reconciliation. The proposed
// round_interval and attributes ride along on the diff but never cause a pass
// on their own.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::types::{BlockSpan, BoundaryUpdate, Season, SeasonAttributes, SeasonId};

/// A season whose boundary moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryDiff {
    pub season_id: SeasonId,
    pub old_span: BlockSpan,
    pub new_span: BlockSpan,
    pub round_interval: u64,
    pub attributes: SeasonAttributes,
}

impl BoundaryDiff {
    pub fn start_delta(&self) -> i128 {
        i128::from(self.new_span.start) - i128::from(self.old_span.start)
    }

    pub fn end_delta(&self) -> i128 {
        i128::from(self.new_span.end) - i128::from(self.old_span.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Unchanged(SeasonId),
    Changed(BoundaryDiff),
}

impl DiffOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, DiffOutcome::Changed(_))
    }
}

/// Resolve a proposed boundary against the stored season, if any.
pub fn resolve_diff(
    stored: Option<&Season>,
    update: &BoundaryUpdate,
) -> Result<DiffOutcome, ScheduleError> {
    let season = stored.ok_or(ScheduleError::SeasonNotFound(update.season_id))?;

    if season.span() == update.span {
        return Ok(DiffOutcome::Unchanged(season.id));
    }

    Ok(DiffOutcome::Changed(BoundaryDiff {
        season_id: season.id,
        old_span: season.span(),
        new_span: update.span,
        round_interval: update.round_interval,
        attributes: update.attributes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(start: u64, end: u64, interval: u64) -> Season {
        Season {
            id: SeasonId(1),
            start_block: start,
            end_block: end,
            round_interval: interval,
            attributes: SeasonAttributes::default(),
        }
    }

    #[test]
    fn test_unchanged_boundary_is_noop() {
        let stored = season(100, 399, 100);
        let update = BoundaryUpdate::new(SeasonId(1), 100, 399, 100).unwrap();
        assert_eq!(
            resolve_diff(Some(&stored), &update).unwrap(),
            DiffOutcome::Unchanged(SeasonId(1))
        );
    }

    #[test]
    fn test_interval_change_alone_is_noop() {
        let stored = season(100, 399, 100);
        let update = BoundaryUpdate::new(SeasonId(1), 100, 399, 50).unwrap();
        assert!(!resolve_diff(Some(&stored), &update).unwrap().is_changed());
    }

    #[test]
    fn test_end_extension_detected() {
        let stored = season(100, 399, 100);
        let update = BoundaryUpdate::new(SeasonId(1), 100, 499, 100).unwrap();
        match resolve_diff(Some(&stored), &update).unwrap() {
            DiffOutcome::Changed(diff) => {
                assert_eq!(diff.old_span, BlockSpan { start: 100, end: 399 });
                assert_eq!(diff.new_span, BlockSpan { start: 100, end: 499 });
                assert_eq!(diff.start_delta(), 0);
                assert_eq!(diff.end_delta(), 100);
            }
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_season_not_found() {
        let update = BoundaryUpdate::new(SeasonId(9), 0, 10, 5).unwrap();
        assert_eq!(
            resolve_diff(None, &update),
            Err(ScheduleError::SeasonNotFound(SeasonId(9)))
        );
    }
}
