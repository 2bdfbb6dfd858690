// SCHEDULE DOMAIN TYPES
// Seasons, rounds and the inclusive block spans they cover.
//
// INVARIANTS:
// 1. A BlockSpan always satisfies start <= end (enforced by BlockSpan::new)
// 2. Rounds are never mutated in place: retained verbatim or replaced
// 3. Season attributes pass through reconciliation untouched

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Position on the external block-index timeline (chain height).
pub type BlockIndex = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonId(pub u32);

impl SeasonId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(pub u32);

impl RoundId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range of block indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockSpan {
    pub start: BlockIndex,
    pub end: BlockIndex,
}

impl BlockSpan {
    pub fn new(start: BlockIndex, end: BlockIndex) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedSpan { start, end });
        }
        Ok(BlockSpan { start, end })
    }

    /// Number of blocks covered, both ends included.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    // A valid span always holds at least one block.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, block: BlockIndex) -> bool {
        self.start <= block && block <= self.end
    }
}

impl fmt::Display for BlockSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Attributes carried by a season that reconciliation never reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonAttributes {
    pub arena_type: i32,
    pub required_medal_count: i32,
    pub total_prize: i64,
    pub battle_ticket_policy_id: i32,
    pub refresh_ticket_policy_id: i32,
    pub season_group_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub start_block: BlockIndex,
    pub end_block: BlockIndex,
    /// Blocks per round. Always > 0.
    pub round_interval: u64,
    pub attributes: SeasonAttributes,
}

impl Season {
    pub fn span(&self) -> BlockSpan {
        BlockSpan {
            start: self.start_block,
            end: self.end_block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub season_id: SeasonId,
    /// Zero-based ordinal within the season.
    pub round_index: u32,
    pub start_block: BlockIndex,
    pub end_block: BlockIndex,
}

impl Round {
    pub fn span(&self) -> BlockSpan {
        BlockSpan {
            start: self.start_block,
            end: self.end_block,
        }
    }

    pub fn contains_block(&self, block: BlockIndex) -> bool {
        self.span().contains(block)
    }
}

/// A round that has been planned but not yet persisted (no id assigned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedRound {
    pub season_id: SeasonId,
    pub round_index: u32,
    pub span: BlockSpan,
}

/// Proposed replacement for a season's boundary, already validated at the
/// ingestion edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryUpdate {
    pub season_id: SeasonId,
    pub span: BlockSpan,
    pub round_interval: u64,
    pub attributes: SeasonAttributes,
}

impl BoundaryUpdate {
    pub fn new(
        season_id: SeasonId,
        start_block: BlockIndex,
        end_block: BlockIndex,
        round_interval: u64,
    ) -> Result<Self, ValidationError> {
        let span = BlockSpan::new(start_block, end_block)?;
        if round_interval == 0 {
            return Err(ValidationError::NonPositiveInterval(0));
        }
        Ok(BoundaryUpdate {
            season_id,
            span,
            round_interval,
            attributes: SeasonAttributes::default(),
        })
    }

    pub fn with_attributes(mut self, attributes: SeasonAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_span_rejects_inverted_range() {
        assert_eq!(
            BlockSpan::new(10, 9),
            Err(ValidationError::InvertedSpan { start: 10, end: 9 })
        );
        assert!(BlockSpan::new(10, 10).is_ok());
    }

    #[test]
    fn test_block_span_len_and_contains() {
        let span = BlockSpan::new(100, 199).unwrap();
        assert_eq!(span.len(), 100);
        assert!(span.contains(100));
        assert!(span.contains(199));
        assert!(!span.contains(200));
        assert_eq!(span.to_string(), "100-199");
    }

    #[test]
    fn test_boundary_update_rejects_zero_interval() {
        let result = BoundaryUpdate::new(SeasonId(1), 0, 10, 0);
        assert_eq!(result, Err(ValidationError::NonPositiveInterval(0)));
    }
}
