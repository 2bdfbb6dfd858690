// CHANGE REPORT
// What a reconciliation run decided, rendered for operators before (and
// regardless of) any commit.

use arena_core::{
    BlockIndex, BlockSpan, ChangeKind, ChangeRecord, RetentionPolicy, SeasonId,
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Commit,
    Preview,
}

impl RunMode {
    /// Prefix for log lines so previews are never mistaken for writes.
    pub fn log_prefix(&self) -> &'static str {
        match self {
            RunMode::Commit => "",
            RunMode::Preview => "[DRY RUN] ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Committed,
    Previewed,
    NoOp,
    Failed { reason: String },
}

impl RunOutcome {
    pub fn label(&self) -> String {
        match self {
            RunOutcome::Committed => "COMMITTED".to_string(),
            RunOutcome::Previewed => "PREVIEWED".to_string(),
            RunOutcome::NoOp => "NO-OP".to_string(),
            RunOutcome::Failed { reason } => format!("FAILED: {}", reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NotFound,
    Validation,
    RetentionAmbiguity,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::NotFound => "not_found",
            IssueKind::Validation => "validation",
            IssueKind::RetentionAmbiguity => "retention_ambiguity",
        }
    }
}

/// A per-season problem. `excluded` seasons were left untouched by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonIssue {
    pub season_id: Option<SeasonId>,
    /// Source line, for problems found at ingestion.
    pub line: Option<u64>,
    pub kind: IssueKind,
    pub excluded: bool,
    pub message: String,
}

/// A season whose boundary the run staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonChange {
    pub season_id: SeasonId,
    pub old_span: BlockSpan,
    pub new_span: BlockSpan,
    pub round_interval: u64,
    pub policy: RetentionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub mode: RunMode,
    pub cursor: Option<BlockIndex>,
    pub outcome: RunOutcome,
    pub seasons: Vec<SeasonChange>,
    pub unchanged: Vec<SeasonId>,
    pub records: Vec<ChangeRecord>,
    pub issues: Vec<SeasonIssue>,
}

impl ReconcileReport {
    pub fn new(mode: RunMode, cursor: Option<BlockIndex>) -> Self {
        ReconcileReport {
            mode,
            cursor,
            outcome: RunOutcome::NoOp,
            seasons: Vec::new(),
            unchanged: Vec::new(),
            records: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn records_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter().filter(move |record| record.kind() == kind)
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.records_of(kind).count()
    }

    /// Records for one season, in the order they were staged.
    pub fn season_records(&self, season_id: SeasonId) -> Vec<&ChangeRecord> {
        self.records
            .iter()
            .filter(|record| record.season_id() == season_id)
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn write_records(
        &self,
        f: &mut fmt::Formatter<'_>,
        kind: ChangeKind,
        title: &str,
    ) -> fmt::Result {
        if self.count(kind) == 0 {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "{}", title)?;
        writeln!(f, "{:>8} {:>8} {:>6} {:>12} {:>12}", "season", "round", "index", "start", "end")?;
        for record in self.records_of(kind) {
            let (round_id, round_index) = match record {
                ChangeRecord::Kept { round_id, round_index, .. }
                | ChangeRecord::Deleted { round_id, round_index, .. } => {
                    (round_id.to_string(), *round_index)
                }
                ChangeRecord::Created { round_index, .. } => ("-".to_string(), *round_index),
            };
            let span = record.span();
            writeln!(
                f,
                "{:>8} {:>8} {:>6} {:>12} {:>12}",
                record.season_id(),
                round_id,
                round_index,
                span.start,
                span.end
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.mode.log_prefix();
        match self.cursor {
            Some(cursor) => writeln!(f, "{}Reconciliation report (cursor {})", prefix, cursor)?,
            None => writeln!(f, "{}Reconciliation report (no cursor)", prefix)?,
        }

        if self.seasons.is_empty() {
            writeln!(f, "No season boundaries changed.")?;
        } else {
            writeln!(f)?;
            writeln!(f, "Season changes")?;
            writeln!(
                f,
                "{:>8} {:>12} {:>12} {:>12} {:>12} {:>9}  {}",
                "season", "old start", "new start", "old end", "new end", "interval", "policy"
            )?;
            for change in &self.seasons {
                writeln!(
                    f,
                    "{:>8} {:>12} {:>12} {:>12} {:>12} {:>9}  {}",
                    change.season_id,
                    change.old_span.start,
                    change.new_span.start,
                    change.old_span.end,
                    change.new_span.end,
                    change.round_interval,
                    policy_label(&change.policy)
                )?;
            }
        }

        self.write_records(f, ChangeKind::Kept, "Kept rounds")?;
        self.write_records(f, ChangeKind::Deleted, "Deleted rounds")?;
        self.write_records(f, ChangeKind::Created, "Created rounds")?;

        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Issues")?;
            for issue in &self.issues {
                let season = issue
                    .season_id
                    .map(|id| format!("season {}", id))
                    .unwrap_or_else(|| "season ?".to_string());
                let line = issue
                    .line
                    .map(|line| format!(" (line {})", line))
                    .unwrap_or_default();
                let excluded = if issue.excluded { " [excluded]" } else { "" };
                writeln!(
                    f,
                    "  {}{} {}: {}{}",
                    season,
                    line,
                    issue.kind.as_str(),
                    issue.message,
                    excluded
                )?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} changed, {} unchanged, {} kept, {} deleted, {} created, {} issues",
            self.seasons.len(),
            self.unchanged.len(),
            self.count(ChangeKind::Kept),
            self.count(ChangeKind::Deleted),
            self.count(ChangeKind::Created),
            self.issues.len()
        )?;
        write!(f, "Status: {}", self.outcome.label())
    }
}

fn policy_label(policy: &RetentionPolicy) -> String {
    match policy {
        RetentionPolicy::Fresh => "fresh".to_string(),
        RetentionPolicy::FullRegeneration => "full regeneration".to_string(),
        RetentionPolicy::CursorRetention { cursor_round, .. } => {
            format!("keep through round {}", cursor_round)
        }
        RetentionPolicy::AmbiguousCursorFallback { cursor } => {
            format!("full regeneration (cursor {} unmatched)", cursor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::RoundId;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RunOutcome::Committed.label(), "COMMITTED");
        assert_eq!(RunOutcome::NoOp.label(), "NO-OP");
        assert_eq!(
            RunOutcome::Failed { reason: "disk full".into() }.label(),
            "FAILED: disk full"
        );
    }

    #[test]
    fn test_render_lists_each_group() {
        let mut report = ReconcileReport::new(RunMode::Preview, Some(250));
        report.outcome = RunOutcome::Previewed;
        report.records = vec![
            ChangeRecord::Kept {
                season_id: SeasonId(1),
                round_id: RoundId(1),
                round_index: 0,
                span: BlockSpan { start: 100, end: 199 },
            },
            ChangeRecord::Created {
                season_id: SeasonId(1),
                round_index: 1,
                span: BlockSpan { start: 200, end: 299 },
            },
        ];

        let text = report.to_string();
        assert!(text.starts_with("[DRY RUN] Reconciliation report (cursor 250)"));
        assert!(text.contains("Kept rounds"));
        assert!(text.contains("Created rounds"));
        assert!(!text.contains("Deleted rounds"));
        assert!(text.ends_with("Status: PREVIEWED"));
    }

    #[test]
    fn test_json_carries_status_tag() {
        let mut report = ReconcileReport::new(RunMode::Commit, None);
        report.outcome = RunOutcome::Failed { reason: "boom".into() };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["outcome"]["status"], "failed");
        assert_eq!(json["outcome"]["reason"], "boom");
        assert_eq!(json["mode"], "commit");
    }
}
