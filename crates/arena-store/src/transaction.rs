// STAGED TRANSACTION
// Reads see committed state overlaid with this transaction's own writes.
// Nothing reaches the backend until `commit`, which hands every staged op to
// `ScheduleBackend::apply` in one call. Dropping or rolling back discards them.

use arena_core::{BlockIndex, BlockSpan, Round, RoundId, Season, SeasonId};
use log::{debug, info};
use std::collections::{HashMap, HashSet};

use crate::contract::{RoundStore, ScheduleBackend, SeasonStore, WriteOp};
use crate::error::StoreError;

pub struct StagedTransaction<'a, B: ScheduleBackend + ?Sized> {
    backend: &'a B,
    ops: Vec<WriteOp>,
    seasons: HashMap<SeasonId, Season>,
    deleted: HashSet<RoundId>,
    inserted: Vec<Round>,
    next_round_id: Option<u32>,
}

impl<'a, B: ScheduleBackend + ?Sized> StagedTransaction<'a, B> {
    pub fn begin(backend: &'a B) -> Self {
        StagedTransaction {
            backend,
            ops: Vec::new(),
            seasons: HashMap::new(),
            deleted: HashSet::new(),
            inserted: Vec::new(),
            next_round_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Stage creation (or full replacement) of a season record.
    pub fn put_season(&mut self, season: Season) {
        self.seasons.insert(season.id, season.clone());
        self.ops.push(WriteOp::PutSeason(season));
    }

    /// Apply every staged op atomically. Returns the number of ops written.
    pub fn commit(self) -> Result<usize, StoreError> {
        let count = self.ops.len();
        if count == 0 {
            debug!("Commit with no staged ops, nothing to write");
            return Ok(0);
        }
        self.backend.apply(&self.ops)?;
        info!("Committed {} staged ops", count);
        Ok(count)
    }

    /// Discard every staged op. Returns how many were dropped.
    pub fn rollback(self) -> usize {
        let count = self.ops.len();
        debug!("Rolled back {} staged ops", count);
        count
    }

    fn allocate_round_id(&mut self) -> Result<RoundId, StoreError> {
        let next = match self.next_round_id {
            Some(next) => next,
            None => self.backend.next_round_id()?.as_u32(),
        };
        let following = next.checked_add(1).ok_or(StoreError::RoundIdExhausted)?;
        self.next_round_id = Some(following);
        Ok(RoundId(next))
    }
}

impl<'a, B: ScheduleBackend + ?Sized> SeasonStore for StagedTransaction<'a, B> {
    fn get(&self, id: SeasonId) -> Result<Season, StoreError> {
        if let Some(season) = self.seasons.get(&id) {
            return Ok(season.clone());
        }
        self.backend
            .load_season(id)?
            .ok_or(StoreError::SeasonNotFound(id))
    }

    fn set_boundary(
        &mut self,
        id: SeasonId,
        start_block: BlockIndex,
        end_block: BlockIndex,
    ) -> Result<(), StoreError> {
        let mut season = self.get(id)?;
        season.start_block = start_block;
        season.end_block = end_block;
        self.seasons.insert(id, season);
        self.ops.push(WriteOp::SetBoundary {
            season_id: id,
            start_block,
            end_block,
        });
        Ok(())
    }
}

impl<'a, B: ScheduleBackend + ?Sized> RoundStore for StagedTransaction<'a, B> {
    fn list_by_season(&self, season_id: SeasonId) -> Result<Vec<Round>, StoreError> {
        let mut rounds: Vec<Round> = self
            .backend
            .load_rounds(season_id)?
            .into_iter()
            .filter(|round| !self.deleted.contains(&round.id))
            .chain(
                self.inserted
                    .iter()
                    .filter(|round| round.season_id == season_id)
                    .cloned(),
            )
            .collect();
        rounds.sort_by_key(|round| (round.start_block, round.end_block));
        Ok(rounds)
    }

    fn delete(&mut self, round_id: RoundId) -> Result<(), StoreError> {
        // A round inserted by this transaction simply disappears from the stage.
        if let Some(pos) = self.inserted.iter().position(|round| round.id == round_id) {
            self.inserted.remove(pos);
            self.ops
                .retain(|op| !matches!(op, WriteOp::InsertRound(round) if round.id == round_id));
            return Ok(());
        }

        if self.deleted.contains(&round_id) {
            return Err(StoreError::RoundNotFound(round_id));
        }
        let season_id = self
            .backend
            .round_owner(round_id)?
            .ok_or(StoreError::RoundNotFound(round_id))?;
        self.deleted.insert(round_id);
        self.ops.push(WriteOp::DeleteRound {
            season_id,
            round_id,
        });
        Ok(())
    }

    fn insert(
        &mut self,
        season_id: SeasonId,
        round_index: u32,
        span: BlockSpan,
    ) -> Result<Round, StoreError> {
        // The season must exist either committed or staged.
        self.get(season_id)?;
        let round = Round {
            id: self.allocate_round_id()?,
            season_id,
            round_index,
            start_block: span.start,
            end_block: span.end,
        };
        self.inserted.push(round.clone());
        self.ops.push(WriteOp::InsertRound(round.clone()));
        Ok(round)
    }
}
