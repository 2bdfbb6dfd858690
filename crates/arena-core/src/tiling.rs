// TILING VERIFICATION
// A season's rounds, ordered by start block, must cover its range exactly
// once: no gaps, no overlaps, nothing outside.

use crate::error::ValidationError;
use crate::types::{BlockSpan, Round, Season};

/// Check that `spans` tile `range` exactly. Order of input does not matter.
pub fn verify_tiling(spans: &[BlockSpan], range: BlockSpan) -> Result<(), ValidationError> {
    let mut ordered = spans.to_vec();
    ordered.sort();

    let first = ordered
        .first()
        .ok_or_else(|| ValidationError::Tiling(format!("no rounds cover {}", range)))?;
    if first.start != range.start {
        return Err(ValidationError::Tiling(format!(
            "first round starts at {}, range starts at {}",
            first.start, range.start
        )));
    }

    for pair in ordered.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if next.start <= prev.end {
            return Err(ValidationError::Tiling(format!(
                "rounds {} and {} overlap",
                prev, next
            )));
        }
        if next.start != prev.end + 1 {
            return Err(ValidationError::Tiling(format!(
                "gap between rounds {} and {}",
                prev, next
            )));
        }
    }

    // Non-empty: checked above.
    let last = ordered[ordered.len() - 1];
    if last.end != range.end {
        return Err(ValidationError::Tiling(format!(
            "last round ends at {}, range ends at {}",
            last.end, range.end
        )));
    }
    Ok(())
}

/// Full audit of a stored season: tiling plus round length rules.
///
/// A round longer than the interval fails the audit. A short round before
/// the last one is returned instead of failing: cursor retention keeps a
/// short trailing round verbatim and appends new rounds after it.
pub fn verify_season_rounds(
    season: &Season,
    rounds: &[Round],
) -> Result<Vec<BlockSpan>, ValidationError> {
    let spans: Vec<BlockSpan> = rounds.iter().map(Round::span).collect();
    verify_tiling(&spans, season.span())?;

    let mut ordered = spans;
    ordered.sort();
    let last = ordered.len() - 1;
    let mut short_interior = Vec::new();
    for (i, span) in ordered.iter().enumerate() {
        if span.len() > season.round_interval {
            return Err(ValidationError::Tiling(format!(
                "round {} is longer than interval {}",
                span, season.round_interval
            )));
        }
        if i != last && span.len() != season.round_interval {
            short_interior.push(*span);
        }
    }
    Ok(short_interior)
}
