// CHANGE APPLICATION / DRY-RUN COORDINATOR
// Drives one reconciliation run:
//
//   INIT -> LOAD_BOUNDARIES -> per season: DIFF -> [no-op | RESOLVE_ROUNDS ->
//   STAGE_CHANGES] -> (COMMIT | ROLLBACK) -> REPORT
//
// INVARIANTS:
// 1. COMMIT and PREVIEW stage exactly the same ops and produce identical records
// 2. Every staged change of the run lives in one transaction: a failure
//    anywhere discards all of it
// 3. PREVIEW always rolls back
// 4. A season with a per-season problem is left out of staging entirely

use arena_core::{
    resolve_diff, resolve_retention, BlockIndex, BoundaryUpdate, DiffOutcome, RetentionOptions,
    RetentionPlan, ScheduleError, SeasonId, ValidationError,
};
use arena_store::{RoundStore, ScheduleBackend, SeasonStore, StagedTransaction, StoreError};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, info_span, warn};

use crate::boundary::BoundaryBatch;
use crate::report::{
    IssueKind, ReconcileReport, RunMode, RunOutcome, SeasonChange, SeasonIssue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    LoadBoundaries,
    Diff,
    ResolveRounds,
    StageChanges,
    Commit,
    Rollback,
    Report,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Init => "INIT",
            RunPhase::LoadBoundaries => "LOAD_BOUNDARIES",
            RunPhase::Diff => "DIFF",
            RunPhase::ResolveRounds => "RESOLVE_ROUNDS",
            RunPhase::StageChanges => "STAGE_CHANGES",
            RunPhase::Commit => "COMMIT",
            RunPhase::Rollback => "ROLLBACK",
            RunPhase::Report => "REPORT",
        };
        f.write_str(name)
    }
}

/// What happened to one season during staging.
enum SeasonStep {
    Unchanged,
    Staged,
    Skipped(SeasonIssue),
}

pub struct Reconciler<'a, B: ScheduleBackend + ?Sized> {
    backend: &'a B,
    options: RetentionOptions,
}

impl<'a, B: ScheduleBackend + ?Sized> Reconciler<'a, B> {
    pub fn new(backend: &'a B, options: RetentionOptions) -> Self {
        Reconciler { backend, options }
    }

    /// Run one pass over `batch`. Rows rejected at ingestion are carried into
    /// the report as validation issues.
    pub fn run(
        &self,
        batch: &BoundaryBatch,
        cursor: Option<BlockIndex>,
        mode: RunMode,
    ) -> ReconcileReport {
        let span = info_span!("reconcile", ?mode, ?cursor);
        let _guard = span.enter();
        let prefix = mode.log_prefix();

        let mut report = ReconcileReport::new(mode, cursor);
        self.enter(RunPhase::Init, mode);

        self.enter(RunPhase::LoadBoundaries, mode);
        for row in &batch.rejected {
            report.issues.push(SeasonIssue {
                season_id: row.season_id,
                line: Some(row.line),
                kind: IssueKind::Validation,
                excluded: true,
                message: row.error.to_string(),
            });
        }
        info!(
            "{}Reconciling {} boundary updates ({} rejected at ingestion)",
            prefix,
            batch.updates.len(),
            batch.rejected.len()
        );

        let mut tx = StagedTransaction::begin(self.backend);
        let mut seen: HashSet<SeasonId> = HashSet::new();

        for update in &batch.updates {
            if !seen.insert(update.season_id) {
                report.issues.push(validation_issue(
                    update.season_id,
                    &ValidationError::DuplicateSeason(update.season_id),
                ));
                continue;
            }

            match self.stage_season(&mut tx, update, cursor, mode, &mut report) {
                Ok(SeasonStep::Unchanged) => report.unchanged.push(update.season_id),
                Ok(SeasonStep::Staged) => {}
                Ok(SeasonStep::Skipped(issue)) => report.issues.push(issue),
                Err(err) => {
                    // Storage faults abort the whole run.
                    error!(
                        "{}Storage failure while staging season {}: {}",
                        prefix, update.season_id, err
                    );
                    self.enter(RunPhase::Rollback, mode);
                    let dropped = tx.rollback();
                    warn!("{}Rolled back {} staged ops", prefix, dropped);
                    report.outcome = RunOutcome::Failed {
                        reason: err.to_string(),
                    };
                    self.enter(RunPhase::Report, mode);
                    return report;
                }
            }
        }

        report.outcome = self.finish(tx, mode);
        self.enter(RunPhase::Report, mode);
        info!("{}Run finished: {}", prefix, report.outcome.label());
        report
    }

    fn enter(&self, phase: RunPhase, mode: RunMode) {
        debug!("{}Entering {}", mode.log_prefix(), phase);
    }

    fn finish(&self, tx: StagedTransaction<'a, B>, mode: RunMode) -> RunOutcome {
        let prefix = mode.log_prefix();
        if tx.is_empty() {
            self.enter(RunPhase::Rollback, mode);
            tx.rollback();
            info!("{}No season boundaries changed", prefix);
            return RunOutcome::NoOp;
        }

        match mode {
            RunMode::Preview => {
                self.enter(RunPhase::Rollback, mode);
                let dropped = tx.rollback();
                info!("{}Preview only: {} staged ops discarded", prefix, dropped);
                RunOutcome::Previewed
            }
            RunMode::Commit => {
                self.enter(RunPhase::Commit, mode);
                match tx.commit() {
                    Ok(written) => {
                        info!("Committed {} ops", written);
                        RunOutcome::Committed
                    }
                    Err(err) => {
                        error!("Commit failed, nothing applied: {}", err);
                        self.enter(RunPhase::Rollback, mode);
                        RunOutcome::Failed {
                            reason: err.to_string(),
                        }
                    }
                }
            }
        }
    }

    /// Diff, resolve and stage one season. `Err` is reserved for storage
    /// faults; every per-season problem comes back as `SeasonStep::Skipped`.
    fn stage_season(
        &self,
        tx: &mut StagedTransaction<'a, B>,
        update: &BoundaryUpdate,
        cursor: Option<BlockIndex>,
        mode: RunMode,
        report: &mut ReconcileReport,
    ) -> Result<SeasonStep, StoreError> {
        let prefix = mode.log_prefix();
        let season_id = update.season_id;

        self.enter(RunPhase::Diff, mode);
        let stored = match tx.get(season_id) {
            Ok(season) => Some(season),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        let diff = match resolve_diff(stored.as_ref(), update) {
            Ok(DiffOutcome::Unchanged(_)) => {
                debug!("{}Season {} unchanged", prefix, season_id);
                return Ok(SeasonStep::Unchanged);
            }
            Ok(DiffOutcome::Changed(diff)) => diff,
            Err(err) => {
                warn!("{}{}", prefix, err);
                return Ok(SeasonStep::Skipped(schedule_issue(season_id, &err)));
            }
        };
        info!(
            "{}Season {} boundary {} -> {}",
            prefix, season_id, diff.old_span, diff.new_span
        );

        self.enter(RunPhase::ResolveRounds, mode);
        let existing = tx.list_by_season(season_id)?;
        let plan = match resolve_retention(&existing, &diff, cursor, self.options) {
            Ok(plan) => plan,
            Err(err) => {
                warn!("{}Season {} excluded: {}", prefix, season_id, err);
                return Ok(SeasonStep::Skipped(schedule_issue(season_id, &err)));
            }
        };
        if let Some(ambiguity) = plan.ambiguity() {
            warn!("{}{}; regenerating all rounds", prefix, ambiguity);
            report.issues.push(SeasonIssue {
                season_id: Some(season_id),
                line: None,
                kind: IssueKind::RetentionAmbiguity,
                excluded: false,
                message: format!("{}; fell back to full regeneration", ambiguity),
            });
        }

        self.enter(RunPhase::StageChanges, mode);
        self.stage_plan(tx, &plan, mode)?;

        report.records.extend(plan.change_records());
        report.seasons.push(SeasonChange {
            season_id,
            old_span: diff.old_span,
            new_span: diff.new_span,
            round_interval: diff.round_interval,
            policy: plan.policy,
        });
        Ok(SeasonStep::Staged)
    }

    fn stage_plan(
        &self,
        tx: &mut StagedTransaction<'a, B>,
        plan: &RetentionPlan,
        mode: RunMode,
    ) -> Result<(), StoreError> {
        let prefix = mode.log_prefix();
        tx.set_boundary(plan.season_id, plan.new_span.start, plan.new_span.end)?;

        for round in &plan.kept {
            info!(
                "{}Keep round {} of season {} [{}]",
                prefix,
                round.id,
                plan.season_id,
                round.span()
            );
        }
        for round in &plan.deleted {
            tx.delete(round.id)?;
            info!(
                "{}Delete round {} of season {} [{}]",
                prefix,
                round.id,
                plan.season_id,
                round.span()
            );
        }
        for planned in &plan.created {
            tx.insert(plan.season_id, planned.round_index, planned.span)?;
            info!(
                "{}Create round of season {} [{}]",
                prefix, plan.season_id, planned.span
            );
        }
        Ok(())
    }
}

fn schedule_issue(season_id: SeasonId, err: &ScheduleError) -> SeasonIssue {
    let kind = match err {
        ScheduleError::SeasonNotFound(_) => IssueKind::NotFound,
        ScheduleError::Validation(_) => IssueKind::Validation,
        ScheduleError::RetentionAmbiguity { .. } => IssueKind::RetentionAmbiguity,
    };
    SeasonIssue {
        season_id: Some(season_id),
        line: None,
        kind,
        excluded: true,
        message: err.to_string(),
    }
}

fn validation_issue(season_id: SeasonId, err: &ValidationError) -> SeasonIssue {
    SeasonIssue {
        season_id: Some(season_id),
        line: None,
        kind: IssueKind::Validation,
        excluded: true,
        message: err.to_string(),
    }
}
