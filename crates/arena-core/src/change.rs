use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{BlockSpan, PlannedRound, Round, RoundId, SeasonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Kept,
    Deleted,
    Created,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Kept => "kept",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Created => "created",
        }
    }
}

/// One round affected by a reconciliation pass.
///
/// Records are identical whether the pass is committed or previewed, so they
/// serve both as the dry-run report and as the audit trail of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeRecord {
    Kept {
        season_id: SeasonId,
        round_id: RoundId,
        round_index: u32,
        span: BlockSpan,
    },
    Deleted {
        season_id: SeasonId,
        round_id: RoundId,
        round_index: u32,
        span: BlockSpan,
    },
    Created {
        season_id: SeasonId,
        round_index: u32,
        span: BlockSpan,
    },
}

impl ChangeRecord {
    pub fn kept(round: &Round) -> Self {
        ChangeRecord::Kept {
            season_id: round.season_id,
            round_id: round.id,
            round_index: round.round_index,
            span: round.span(),
        }
    }

    pub fn deleted(round: &Round) -> Self {
        ChangeRecord::Deleted {
            season_id: round.season_id,
            round_id: round.id,
            round_index: round.round_index,
            span: round.span(),
        }
    }

    pub fn created(planned: &PlannedRound) -> Self {
        ChangeRecord::Created {
            season_id: planned.season_id,
            round_index: planned.round_index,
            span: planned.span,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeRecord::Kept { .. } => ChangeKind::Kept,
            ChangeRecord::Deleted { .. } => ChangeKind::Deleted,
            ChangeRecord::Created { .. } => ChangeKind::Created,
        }
    }

    pub fn season_id(&self) -> SeasonId {
        match self {
            ChangeRecord::Kept { season_id, .. }
            | ChangeRecord::Deleted { season_id, .. }
            | ChangeRecord::Created { season_id, .. } => *season_id,
        }
    }

    pub fn span(&self) -> BlockSpan {
        match self {
            ChangeRecord::Kept { span, .. }
            | ChangeRecord::Deleted { span, .. }
            | ChangeRecord::Created { span, .. } => *span,
        }
    }

    pub fn round_id(&self) -> Option<RoundId> {
        match self {
            ChangeRecord::Kept { round_id, .. } | ChangeRecord::Deleted { round_id, .. } => {
                Some(*round_id)
            }
            ChangeRecord::Created { .. } => None,
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.round_id() {
            Some(id) => write!(
                f,
                "{} season {} round {} [{}]",
                self.kind().as_str(),
                self.season_id(),
                id,
                self.span()
            ),
            None => write!(
                f,
                "{} season {} [{}]",
                self.kind().as_str(),
                self.season_id(),
                self.span()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_change_tag() {
        let record = ChangeRecord::Created {
            season_id: SeasonId(3),
            round_index: 4,
            span: BlockSpan { start: 400, end: 499 },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["change"], "created");
        assert_eq!(json["season_id"], 3);
        assert_eq!(json["span"]["start"], 400);
    }

    #[test]
    fn test_display() {
        let round = Round {
            id: RoundId(12),
            season_id: SeasonId(1),
            round_index: 2,
            start_block: 300,
            end_block: 399,
        };
        assert_eq!(
            ChangeRecord::deleted(&round).to_string(),
            "deleted season 1 round 12 [300-399]"
        );
    }
}
