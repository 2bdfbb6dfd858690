// SEASON SETUP AND AUDIT
// Seeding creates seasons from a boundary batch and partitions each into
// rounds; auditing re-checks every stored season against the tiling rules.

use arena_core::{
    partition, verify_season_rounds, BlockSpan, Season, SeasonId, ValidationError,
};
use arena_store::{RoundStore, ScheduleBackend, SeasonStore, StagedTransaction};
use serde::Serialize;
use tracing::{info, warn};

use crate::boundary::BoundaryBatch;
use crate::error::ReconcileError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub created_seasons: Vec<SeasonId>,
    pub skipped_existing: Vec<SeasonId>,
    pub rounds_created: usize,
}

/// Insert every season of `batch` that the store does not know yet, with a
/// full round partition, in one transaction.
pub fn seed_seasons<B: ScheduleBackend + ?Sized>(
    backend: &B,
    batch: &BoundaryBatch,
) -> Result<SeedSummary, ReconcileError> {
    let mut tx = StagedTransaction::begin(backend);
    let mut summary = SeedSummary::default();

    for update in &batch.updates {
        match tx.get(update.season_id) {
            Ok(_) => {
                warn!("Season {} already exists, not seeding", update.season_id);
                summary.skipped_existing.push(update.season_id);
                continue;
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }

        tx.put_season(Season {
            id: update.season_id,
            start_block: update.span.start,
            end_block: update.span.end,
            round_interval: update.round_interval,
            attributes: update.attributes,
        });
        let spans = partition(update.span.start, update.span.end, update.round_interval)
            .map_err(arena_core::ScheduleError::from)?;
        for (round_index, span) in (0u32..).zip(spans) {
            tx.insert(update.season_id, round_index, span)?;
            summary.rounds_created += 1;
        }
        info!("Seeded season {} [{}]", update.season_id, update.span);
        summary.created_seasons.push(update.season_id);
    }

    tx.commit()?;
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub season_id: SeasonId,
    pub error: ValidationError,
}

/// A short round followed by later rounds. Left behind when cursor retention
/// kept a short trailing round; the season still tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditNote {
    pub season_id: SeasonId,
    pub span: BlockSpan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleAudit {
    pub findings: Vec<AuditFinding>,
    pub notes: Vec<AuditNote>,
}

impl ScheduleAudit {
    /// No season failed; notes do not count.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check every stored season's rounds.
pub fn audit_schedule<B: ScheduleBackend + ?Sized>(
    backend: &B,
) -> Result<ScheduleAudit, ReconcileError> {
    let mut audit = ScheduleAudit::default();
    for season in backend.load_seasons()? {
        let rounds = backend.load_rounds(season.id)?;
        match verify_season_rounds(&season, &rounds) {
            Ok(short_interior) => {
                for span in short_interior {
                    info!(
                        "Season {} keeps short round [{}] before later rounds",
                        season.id, span
                    );
                    audit.notes.push(AuditNote {
                        season_id: season.id,
                        span,
                    });
                }
            }
            Err(error) => {
                warn!("Season {} fails audit: {}", season.id, error);
                audit.findings.push(AuditFinding {
                    season_id: season.id,
                    error,
                });
            }
        }
    }
    Ok(audit)
}
