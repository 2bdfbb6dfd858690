// ROUND PARTITION GENERATOR
// Splits an inclusive block range into fixed-length rounds.
//
// INVARIANTS:
// 1. Spans are ascending and contiguous: span[i+1].start == span[i].end + 1
// 2. The first span starts at `start`, the last ends at `end`
// 3. Every span holds exactly `interval` blocks except the last (1..=interval)
// 4. Span count == ceil((end - start + 1) / interval)

use crate::error::ValidationError;
use crate::types::{BlockIndex, BlockSpan};

/// Partition `[start, end]` into rounds of `interval` blocks.
pub fn partition(
    start: BlockIndex,
    end: BlockIndex,
    interval: u64,
) -> Result<Vec<BlockSpan>, ValidationError> {
    if start > end {
        return Err(ValidationError::InvertedSpan { start, end });
    }
    if interval == 0 {
        return Err(ValidationError::NonPositiveInterval(0));
    }

    // (end - start) / interval + 1 == ceil((end - start + 1) / interval) without overflow.
    let expected = (end - start) / interval + 1;
    let mut spans = Vec::with_capacity(expected.min(4096) as usize);
    let mut cursor = start;
    loop {
        // Saturating keeps the arithmetic safe near u64::MAX.
        let span_end = cursor.saturating_add(interval - 1).min(end);
        spans.push(BlockSpan {
            start: cursor,
            end: span_end,
        });
        if span_end == end {
            break;
        }
        cursor = span_end + 1;
    }
    Ok(spans)
}

/// Number of rounds needed to cover `total` blocks.
pub fn span_count(total: u64, interval: u64) -> u64 {
    total / interval + u64::from(total % interval != 0)
}
