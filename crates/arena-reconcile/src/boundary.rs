// BOUNDARY SOURCE INGESTION
// Reads corrected season boundaries from CSV and validates each row against
// the fixed schema before anything reaches the reconciliation core.
//
// A row that does not parse as the schema aborts ingestion. A row that parses
// but describes an impossible boundary is rejected on its own and reported.

use arena_core::{BoundaryUpdate, SeasonAttributes, SeasonId, ValidationError};
use csv_async::{AsyncReaderBuilder, Trim};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::error::ReconcileError;

/// One CSV row as exported from the season table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    #[serde(alias = "season_id")]
    pub id: i64,
    pub start_block: i64,
    pub end_block: i64,
    pub round_interval: i64,
    #[serde(default)]
    pub arena_type: i32,
    #[serde(default)]
    pub required_medal_count: i32,
    #[serde(default)]
    pub total_prize: i64,
    #[serde(default)]
    pub battle_ticket_policy_id: i32,
    #[serde(default)]
    pub refresh_ticket_policy_id: i32,
    #[serde(default)]
    pub season_group_id: i32,
}

impl BoundaryRecord {
    pub fn season_id(&self) -> Option<SeasonId> {
        u32::try_from(self.id).ok().map(SeasonId)
    }

    pub fn validate(&self) -> Result<BoundaryUpdate, ValidationError> {
        let season_id = self
            .season_id()
            .ok_or(ValidationError::InvalidSeasonId(self.id))?;
        let start = non_negative(self.start_block)?;
        let end = non_negative(self.end_block)?;
        if self.round_interval <= 0 {
            return Err(ValidationError::NonPositiveInterval(self.round_interval));
        }

        let update = BoundaryUpdate::new(season_id, start, end, self.round_interval as u64)?;
        Ok(update.with_attributes(SeasonAttributes {
            arena_type: self.arena_type,
            required_medal_count: self.required_medal_count,
            total_prize: self.total_prize,
            battle_ticket_policy_id: self.battle_ticket_policy_id,
            refresh_ticket_policy_id: self.refresh_ticket_policy_id,
            season_group_id: self.season_group_id,
        }))
    }
}

fn non_negative(block: i64) -> Result<u64, ValidationError> {
    u64::try_from(block).map_err(|_| ValidationError::NegativeBlock(block))
}

/// A row that parsed but failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based line in the source, header included.
    pub line: u64,
    pub season_id: Option<SeasonId>,
    pub error: ValidationError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryBatch {
    pub updates: Vec<BoundaryUpdate>,
    pub rejected: Vec<RejectedRow>,
}

impl BoundaryBatch {
    /// Validate already-parsed records, in source order. A season named by
    /// more than one row is ambiguous, so every row for it is rejected.
    pub fn from_records(records: impl IntoIterator<Item = BoundaryRecord>) -> Self {
        let records: Vec<BoundaryRecord> = records.into_iter().collect();
        let mut occurrences: HashMap<SeasonId, usize> = HashMap::new();
        for season_id in records.iter().filter_map(BoundaryRecord::season_id) {
            *occurrences.entry(season_id).or_default() += 1;
        }

        let mut batch = BoundaryBatch::default();
        for (i, record) in records.iter().enumerate() {
            let line = i as u64 + 2;
            let checked = record.validate().and_then(|update| {
                if occurrences.get(&update.season_id).copied().unwrap_or(0) > 1 {
                    Err(ValidationError::DuplicateSeason(update.season_id))
                } else {
                    Ok(update)
                }
            });
            match checked {
                Ok(update) => batch.updates.push(update),
                Err(error) => {
                    warn!("Rejected boundary row {}: {}", line, error);
                    batch.rejected.push(RejectedRow {
                        line,
                        season_id: record.season_id(),
                        error,
                    });
                }
            }
        }
        batch
    }
}

/// Read and validate every row from a CSV stream with a header line.
pub async fn read_boundaries<R>(reader: R) -> Result<BoundaryBatch, ReconcileError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut deserializer = AsyncReaderBuilder::new()
        .trim(Trim::All)
        .create_deserializer(reader);
    let rows = deserializer.deserialize::<BoundaryRecord>();
    futures::pin_mut!(rows);

    let mut records = Vec::new();
    while let Some(row) = rows.next().await {
        records.push(row?);
    }
    Ok(BoundaryBatch::from_records(records))
}

pub async fn load_boundaries(path: &Path) -> Result<BoundaryBatch, ReconcileError> {
    let file = tokio::fs::File::open(path).await?;
    let batch = read_boundaries(file).await?;
    info!(
        "Loaded {} boundary rows from {} ({} rejected)",
        batch.updates.len() + batch.rejected.len(),
        path.display(),
        batch.rejected.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::BlockSpan;

    const HEADER: &str = concat!(
        "id,start_block,end_block,arena_type,round_interval,required_medal_count,",
        "total_prize,battle_ticket_policy_id,refresh_ticket_policy_id,season_group_id\n",
    );

    fn parse(body: &str) -> Result<BoundaryBatch, ReconcileError> {
        let csv = format!("{}{}", HEADER, body);
        tokio_test::block_on(read_boundaries(csv.as_bytes()))
    }

    #[test]
    fn test_valid_rows_become_updates() {
        let batch = parse("1,100,499,2,100,0,1000,1,2,7\n2, 500 ,999,2,50,0,0,1,2,7\n").unwrap();
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.updates.len(), 2);

        let first = &batch.updates[0];
        assert_eq!(first.season_id, SeasonId(1));
        assert_eq!(first.span, BlockSpan { start: 100, end: 499 });
        assert_eq!(first.round_interval, 100);
        assert_eq!(first.attributes.total_prize, 1000);
        assert_eq!(first.attributes.season_group_id, 7);
        assert_eq!(batch.updates[1].span.start, 500);
    }

    #[test]
    fn test_invalid_rows_rejected_individually() {
        let batch = parse(concat!(
            "1,500,100,2,100,0,0,1,2,0\n",
            "2,0,10,2,0,0,0,1,2,0\n",
            "3,-5,10,2,5,0,0,1,2,0\n",
            "5,0,99,2,10,0,0,1,2,0\n",
        ))
        .unwrap();

        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].season_id, SeasonId(5));

        let errors: Vec<(u64, ValidationError)> = batch
            .rejected
            .iter()
            .map(|row| (row.line, row.error.clone()))
            .collect();
        assert_eq!(
            errors,
            vec![
                (2, ValidationError::InvertedSpan { start: 500, end: 100 }),
                (3, ValidationError::NonPositiveInterval(0)),
                (4, ValidationError::NegativeBlock(-5)),
            ]
        );
    }

    #[test]
    fn test_conflicting_rows_exclude_the_season() {
        let batch = parse(concat!(
            "4,0,99,2,10,0,0,1,2,0\n",
            "5,0,99,2,10,0,0,1,2,0\n",
            "4,0,199,2,10,0,0,1,2,0\n",
        ))
        .unwrap();

        let applied: Vec<SeasonId> = batch.updates.iter().map(|u| u.season_id).collect();
        assert_eq!(applied, vec![SeasonId(5)]);

        let rejected: Vec<(u64, Option<SeasonId>)> = batch
            .rejected
            .iter()
            .map(|row| (row.line, row.season_id))
            .collect();
        assert_eq!(rejected, vec![(2, Some(SeasonId(4))), (4, Some(SeasonId(4)))]);
        assert!(batch
            .rejected
            .iter()
            .all(|row| row.error == ValidationError::DuplicateSeason(SeasonId(4))));
    }

    #[test]
    fn test_minimal_columns_with_season_id_alias() {
        let csv = "season_id,start_block,end_block,round_interval\n3,0,9,5\n";
        let batch = tokio_test::block_on(read_boundaries(csv.as_bytes())).unwrap();
        assert_eq!(batch.updates.len(), 1);
        assert_eq!(batch.updates[0].season_id, SeasonId(3));
        assert_eq!(batch.updates[0].attributes, SeasonAttributes::default());
    }

    #[test]
    fn test_unparseable_row_is_fatal() {
        let result = parse("1,abc,499,2,100,0,0,1,2,0\n");
        assert!(matches!(result, Err(ReconcileError::Ingest(_))));
    }
}
