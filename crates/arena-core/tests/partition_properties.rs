// Property checks for the partition contract and cursor retention.

use arena_core::*;
use proptest::prelude::*;

fn season_rounds(start: u64, end: u64, interval: u64) -> Vec<Round> {
    partition(start, end, interval)
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, span)| Round {
            id: RoundId(i as u32 + 1),
            season_id: SeasonId(1),
            round_index: i as u32,
            start_block: span.start,
            end_block: span.end,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_partition_tiles_range(
        start in 0u64..1_000_000,
        len in 1u64..5_000,
        interval in 1u64..700,
    ) {
        let end = start + len - 1;
        let spans = partition(start, end, interval).unwrap();

        let season = BlockSpan { start, end };
        prop_assert!(verify_tiling(&spans, season).is_ok());
        prop_assert_eq!(spans.len() as u64, span_count(len, interval));
        for (i, span) in spans.iter().enumerate() {
            prop_assert!(span.len() <= interval);
            if i + 1 < spans.len() {
                prop_assert_eq!(span.len(), interval);
            }
        }
    }

    #[test]
    fn prop_retention_keeps_elapsed_and_tiles(
        start in 0u64..10_000,
        old_len in 1u64..2_000,
        extra in 0u64..2_000,
        interval in 1u64..300,
        cursor_offset in 0u64..2_000,
    ) {
        let old_end = start + old_len - 1;
        let rounds = season_rounds(start, old_end, interval);
        let cursor = start + (cursor_offset % old_len);
        let new_end = old_end + extra + 1;

        let diff = BoundaryDiff {
            season_id: SeasonId(1),
            old_span: BlockSpan { start, end: old_end },
            new_span: BlockSpan { start, end: new_end },
            round_interval: interval,
            attributes: SeasonAttributes::default(),
        };
        let plan =
            resolve_retention(&rounds, &diff, Some(cursor), RetentionOptions::default()).unwrap();

        let cursor_round = rounds.iter().find(|r| r.contains_block(cursor)).unwrap();
        for round in rounds.iter().filter(|r| r.end_block <= cursor_round.end_block) {
            prop_assert!(plan.kept.contains(round));
        }

        let mut spans: Vec<BlockSpan> = plan.kept.iter().map(Round::span).collect();
        spans.extend(plan.created.iter().map(|p| p.span));
        let season = BlockSpan { start, end: new_end };
        prop_assert!(verify_tiling(&spans, season).is_ok());
    }
}
