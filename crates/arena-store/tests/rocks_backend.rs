// RocksDB backend: persistence across reopen and all-or-nothing batches.

use arena_core::{BlockSpan, RoundId, Season, SeasonAttributes, SeasonId};
use arena_store::{
    RocksBackend, RoundStore, ScheduleBackend, SeasonStore, StagedTransaction, StoreConfig,
    StoreError, WriteOp,
};

fn season(id: u32, start: u64, end: u64) -> Season {
    Season {
        id: SeasonId(id),
        start_block: start,
        end_block: end,
        round_interval: 100,
        attributes: SeasonAttributes {
            arena_type: 1,
            total_prize: 5000,
            ..SeasonAttributes::default()
        },
    }
}

fn seed(backend: &RocksBackend) {
    let mut tx = StagedTransaction::begin(backend);
    tx.put_season(season(1, 100, 399));
    tx.put_season(season(2, 400, 599));
    for (i, start) in [100u64, 200, 300].iter().enumerate() {
        tx.insert(SeasonId(1), i as u32, BlockSpan { start: *start, end: start + 99 })
            .unwrap();
    }
    tx.insert(SeasonId(2), 0, BlockSpan { start: 400, end: 499 }).unwrap();
    tx.insert(SeasonId(2), 1, BlockSpan { start: 500, end: 599 }).unwrap();
    tx.commit().unwrap();
}

#[test]
fn test_rounds_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::at(dir.path().join("db"));
    {
        let backend = RocksBackend::open(&config).unwrap();
        seed(&backend);
    }

    let backend = RocksBackend::open(&config).unwrap();
    let seasons = backend.load_seasons().unwrap();
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0].attributes.total_prize, 5000);

    let rounds = backend.load_rounds(SeasonId(1)).unwrap();
    let spans: Vec<(u64, u64)> = rounds.iter().map(|r| (r.start_block, r.end_block)).collect();
    assert_eq!(spans, vec![(100, 199), (200, 299), (300, 399)]);
    assert_eq!(backend.load_rounds(SeasonId(2)).unwrap().len(), 2);
    assert_eq!(backend.next_round_id().unwrap(), RoundId(6));
    assert_eq!(backend.round_owner(RoundId(4)).unwrap(), Some(SeasonId(2)));
}

#[test]
fn test_boundary_update_and_round_replacement() {
    let dir = tempfile::tempdir().unwrap();
    let backend = RocksBackend::open(&StoreConfig::at(dir.path())).unwrap();
    seed(&backend);

    let mut tx = StagedTransaction::begin(&backend);
    tx.set_boundary(SeasonId(1), 100, 499).unwrap();
    tx.delete(RoundId(3)).unwrap();
    tx.insert(SeasonId(1), 2, BlockSpan { start: 300, end: 399 }).unwrap();
    tx.insert(SeasonId(1), 3, BlockSpan { start: 400, end: 499 }).unwrap();
    assert_eq!(tx.commit().unwrap(), 4);

    let season = backend.load_season(SeasonId(1)).unwrap().unwrap();
    assert_eq!((season.start_block, season.end_block), (100, 499));
    let ids: Vec<u32> = backend
        .load_rounds(SeasonId(1))
        .unwrap()
        .iter()
        .map(|r| r.id.as_u32())
        .collect();
    assert_eq!(ids, vec![1, 2, 6, 7]);
    assert_eq!(backend.round_owner(RoundId(3)).unwrap(), None);
}

#[test]
fn test_failed_batch_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let backend = RocksBackend::open(&StoreConfig::at(dir.path())).unwrap();
    seed(&backend);

    let ops = vec![
        WriteOp::SetBoundary { season_id: SeasonId(1), start_block: 100, end_block: 999 },
        WriteOp::DeleteRound { season_id: SeasonId(1), round_id: RoundId(77) },
    ];
    assert!(matches!(backend.apply(&ops), Err(StoreError::RoundNotFound(RoundId(77)))));
    assert_eq!(backend.load_season(SeasonId(1)).unwrap().unwrap().end_block, 399);
}

#[test]
fn test_missing_store_without_create() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        path: dir.path().join("absent"),
        create_if_missing: false,
    };
    assert!(matches!(RocksBackend::open(&config), Err(StoreError::Backend(_))));
}
