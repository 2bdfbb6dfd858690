// ROUND RETENTION RESOLVER
// Decides, for one season whose boundary moved, which existing rounds survive
// verbatim and which are deleted and regenerated.
//
// INVARIANTS:
// 1. Every existing round ending at or before the cursor round's end is kept
//    with its id, index and span untouched
// 2. Kept spans plus created spans tile the new boundary exactly
// 3. Kept rounds are never truncated: a boundary that would cut into them is
//    rejected, not applied
// 4. Without a usable cursor there is no notion of "already observed", so the
//    whole season is regenerated

use serde::{Deserialize, Serialize};

use crate::change::ChangeRecord;
use crate::diff::BoundaryDiff;
use crate::error::{ScheduleError, ValidationError};
use crate::partition::partition;
use crate::tiling::verify_tiling;
use crate::types::{BlockIndex, BlockSpan, PlannedRound, Round, RoundId, SeasonId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionOptions {
    /// Treat a cursor outside every existing round as a hard failure instead
    /// of falling back to full regeneration.
    pub strict_cursor: bool,
}

/// Which rule produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Season had no rounds yet.
    Fresh,
    /// No cursor supplied: every round replaced.
    FullRegeneration,
    /// Rounds up to the cursor round kept, the rest regenerated.
    CursorRetention { cursor: BlockIndex, cursor_round: RoundId },
    /// Cursor matched no round; full regeneration applied instead.
    AmbiguousCursorFallback { cursor: BlockIndex },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPlan {
    pub season_id: SeasonId,
    pub new_span: BlockSpan,
    pub policy: RetentionPolicy,
    pub kept: Vec<Round>,
    pub deleted: Vec<Round>,
    pub created: Vec<PlannedRound>,
}

impl RetentionPlan {
    /// Kept, then deleted, then created; each group in block order.
    pub fn change_records(&self) -> Vec<ChangeRecord> {
        self.kept
            .iter()
            .map(ChangeRecord::kept)
            .chain(self.deleted.iter().map(ChangeRecord::deleted))
            .chain(self.created.iter().map(ChangeRecord::created))
            .collect()
    }

    /// Cursor that matched no round, if the plan fell back because of one.
    pub fn ambiguity(&self) -> Option<ScheduleError> {
        match self.policy {
            RetentionPolicy::AmbiguousCursorFallback { cursor } => {
                Some(ScheduleError::RetentionAmbiguity {
                    season_id: self.season_id,
                    cursor,
                })
            }
            _ => None,
        }
    }
}

/// Resolve the retention plan for one changed season.
///
/// `existing` are the season's current rounds; they are ordered by start
/// block here regardless of input order.
pub fn resolve_retention(
    existing: &[Round],
    diff: &BoundaryDiff,
    cursor: Option<BlockIndex>,
    options: RetentionOptions,
) -> Result<RetentionPlan, ScheduleError> {
    let mut rounds = existing.to_vec();
    rounds.sort_by_key(|round| (round.start_block, round.end_block));

    if rounds.is_empty() {
        return regenerate(diff, Vec::new(), RetentionPolicy::Fresh);
    }

    let cursor = match cursor {
        Some(cursor) => cursor,
        None => return regenerate(diff, rounds, RetentionPolicy::FullRegeneration),
    };

    let cursor_round = match rounds.iter().find(|round| round.contains_block(cursor)) {
        Some(round) => round.clone(),
        None => {
            if options.strict_cursor {
                return Err(ScheduleError::RetentionAmbiguity {
                    season_id: diff.season_id,
                    cursor,
                });
            }
            return regenerate(
                diff,
                rounds,
                RetentionPolicy::AmbiguousCursorFallback { cursor },
            );
        }
    };

    let (kept, deleted): (Vec<Round>, Vec<Round>) = rounds
        .into_iter()
        .partition(|round| round.end_block <= cursor_round.end_block);

    // Non-empty: the cursor round itself is always kept.
    let retained_start = kept[0].start_block;
    let retained_end = kept
        .iter()
        .map(|round| round.end_block)
        .max()
        .unwrap_or(cursor_round.end_block);

    if retained_end > diff.new_span.end {
        return Err(ValidationError::ShrinkBelowRetained {
            season_id: diff.season_id,
            new_end: diff.new_span.end,
            retained_end,
        }
        .into());
    }
    if retained_start != diff.new_span.start {
        return Err(ValidationError::RetainedStartMismatch {
            season_id: diff.season_id,
            new_start: diff.new_span.start,
            retained_start,
        }
        .into());
    }

    let next_index = kept
        .iter()
        .map(|round| round.round_index + 1)
        .max()
        .unwrap_or(0);
    let created = if retained_end == diff.new_span.end {
        Vec::new()
    } else {
        plan_rounds(
            diff.season_id,
            retained_end + 1,
            diff.new_span.end,
            diff.round_interval,
            next_index,
        )?
    };

    let plan = RetentionPlan {
        season_id: diff.season_id,
        new_span: diff.new_span,
        policy: RetentionPolicy::CursorRetention {
            cursor,
            cursor_round: cursor_round.id,
        },
        kept,
        deleted,
        created,
    };
    check_coverage(&plan)?;
    Ok(plan)
}

fn regenerate(
    diff: &BoundaryDiff,
    deleted: Vec<Round>,
    policy: RetentionPolicy,
) -> Result<RetentionPlan, ScheduleError> {
    let created = plan_rounds(
        diff.season_id,
        diff.new_span.start,
        diff.new_span.end,
        diff.round_interval,
        0,
    )?;
    let plan = RetentionPlan {
        season_id: diff.season_id,
        new_span: diff.new_span,
        policy,
        kept: Vec::new(),
        deleted,
        created,
    };
    check_coverage(&plan)?;
    Ok(plan)
}

fn plan_rounds(
    season_id: SeasonId,
    start: BlockIndex,
    end: BlockIndex,
    interval: u64,
    first_index: u32,
) -> Result<Vec<PlannedRound>, ValidationError> {
    Ok(partition(start, end, interval)?
        .into_iter()
        .zip(first_index..)
        .map(|(span, round_index)| PlannedRound {
            season_id,
            round_index,
            span,
        })
        .collect())
}

fn check_coverage(plan: &RetentionPlan) -> Result<(), ValidationError> {
    let spans: Vec<BlockSpan> = plan
        .kept
        .iter()
        .map(Round::span)
        .chain(plan.created.iter().map(|planned| planned.span))
        .collect();
    verify_tiling(&spans, plan.new_span)
}
