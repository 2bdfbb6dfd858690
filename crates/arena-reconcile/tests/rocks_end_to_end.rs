// Seed a RocksDB store from CSV, correct it from a second CSV, audit it.

use arena_core::{RetentionOptions, SeasonId};
use arena_reconcile::{
    audit_schedule, load_boundaries, seed_seasons, Reconciler, RunMode, RunOutcome,
};
use arena_store::{RocksBackend, ScheduleBackend, StoreConfig};
use std::io::Write;

const HEADER: &str = concat!(
    "id,start_block,end_block,arena_type,round_interval,required_medal_count,",
    "total_prize,battle_ticket_policy_id,refresh_ticket_policy_id,season_group_id",
);

fn write_csv(dir: &std::path::Path, name: &str, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    path
}

#[tokio::test]
async fn test_seed_reconcile_and_audit() {
    let dir = tempfile::tempdir().unwrap();
    let backend = RocksBackend::open(&StoreConfig::at(dir.path().join("db"))).unwrap();

    let seasons = write_csv(
        dir.path(),
        "seasons.csv",
        &["1,100,399,1,100,0,1000,1,1,0", "2,500,799,1,100,0,1000,1,1,0"],
    );
    let summary = seed_seasons(&backend, &load_boundaries(&seasons).await.unwrap()).unwrap();
    assert_eq!(summary.created_seasons, vec![SeasonId(1), SeasonId(2)]);
    assert_eq!(summary.rounds_created, 6);
    assert!(audit_schedule(&backend).unwrap().is_clean());

    // Seeding again is a no-op for existing seasons.
    let again = seed_seasons(&backend, &load_boundaries(&seasons).await.unwrap()).unwrap();
    assert_eq!(again.skipped_existing, vec![SeasonId(1), SeasonId(2)]);

    let corrected = write_csv(
        dir.path(),
        "corrected.csv",
        &["1,100,499,1,100,0,1000,1,1,0", "2,500,799,1,100,0,1000,1,1,0"],
    );
    let batch = load_boundaries(&corrected).await.unwrap();
    let reconciler = Reconciler::new(&backend, RetentionOptions::default());

    let preview = reconciler.run(&batch, Some(250), RunMode::Preview);
    assert_eq!(preview.outcome, RunOutcome::Previewed);
    assert_eq!(backend.load_rounds(SeasonId(1)).unwrap().len(), 3);

    let report = reconciler.run(&batch, Some(250), RunMode::Commit);
    assert_eq!(report.outcome, RunOutcome::Committed);
    assert_eq!(report.records, preview.records);
    assert_eq!(report.unchanged, vec![SeasonId(2)]);
    assert_eq!(backend.load_rounds(SeasonId(1)).unwrap().len(), 4);
    assert!(audit_schedule(&backend).unwrap().is_clean());
}
