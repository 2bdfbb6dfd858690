//! Season boundary reconciliation.
//!
//! Reads corrected boundaries, works out per season which rounds survive,
//! and either commits every change in one transaction or previews them.

pub mod boundary;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod report;
pub mod setup;

pub use boundary::{load_boundaries, read_boundaries, BoundaryBatch, BoundaryRecord, RejectedRow};
pub use config::{AppConfig, ReconcileSettings};
pub use coordinator::{Reconciler, RunPhase};
pub use error::ReconcileError;
pub use report::{
    IssueKind, ReconcileReport, RunMode, RunOutcome, SeasonChange, SeasonIssue,
};
pub use setup::{
    audit_schedule, seed_seasons, AuditFinding, AuditNote, ScheduleAudit, SeedSummary,
};
