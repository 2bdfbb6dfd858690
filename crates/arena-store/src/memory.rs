// IN-MEMORY BACKEND
// Used by tests and previews against fixtures. `apply` works on a copy of the
// state and swaps it in only when every op succeeded.

use arena_core::{Round, RoundId, Season, SeasonId};
use log::warn;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

use crate::contract::{ScheduleBackend, WriteOp};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct MemoryState {
    seasons: BTreeMap<SeasonId, Season>,
    rounds: BTreeMap<RoundId, Round>,
    next_round_id: u32,
}

impl MemoryState {
    fn apply_op(&mut self, op: &WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::PutSeason(season) => {
                self.seasons.insert(season.id, season.clone());
            }
            WriteOp::SetBoundary {
                season_id,
                start_block,
                end_block,
            } => {
                let season = self
                    .seasons
                    .get_mut(season_id)
                    .ok_or(StoreError::SeasonNotFound(*season_id))?;
                season.start_block = *start_block;
                season.end_block = *end_block;
            }
            WriteOp::DeleteRound { round_id, .. } => {
                self.rounds
                    .remove(round_id)
                    .ok_or(StoreError::RoundNotFound(*round_id))?;
            }
            WriteOp::InsertRound(round) => {
                if !self.seasons.contains_key(&round.season_id) {
                    return Err(StoreError::SeasonNotFound(round.season_id));
                }
                self.next_round_id = self.next_round_id.max(round.id.as_u32().saturating_add(1));
                self.rounds.insert(round.id, round.clone());
            }
        }
        Ok(())
    }
}

pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    fail_next_apply: Mutex<Option<String>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        MemoryBackend::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            state: RwLock::new(MemoryState {
                seasons: BTreeMap::new(),
                rounds: BTreeMap::new(),
                next_round_id: 1,
            }),
            fail_next_apply: Mutex::new(None),
        }
    }

    /// Make the next `apply` fail with `reason` and write nothing.
    pub fn fail_next_apply(&self, reason: impl Into<String>) {
        *self.fail_next_apply.lock() = Some(reason.into());
    }

    pub fn round_count(&self) -> usize {
        self.state.read().rounds.len()
    }
}

impl ScheduleBackend for MemoryBackend {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError> {
        Ok(self.state.read().seasons.get(&id).cloned())
    }

    fn load_seasons(&self) -> Result<Vec<Season>, StoreError> {
        Ok(self.state.read().seasons.values().cloned().collect())
    }

    fn load_rounds(&self, season_id: SeasonId) -> Result<Vec<Round>, StoreError> {
        let mut rounds: Vec<Round> = self
            .state
            .read()
            .rounds
            .values()
            .filter(|round| round.season_id == season_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|round| (round.start_block, round.end_block));
        Ok(rounds)
    }

    fn round_owner(&self, round_id: RoundId) -> Result<Option<SeasonId>, StoreError> {
        Ok(self
            .state
            .read()
            .rounds
            .get(&round_id)
            .map(|round| round.season_id))
    }

    fn next_round_id(&self) -> Result<RoundId, StoreError> {
        Ok(RoundId(self.state.read().next_round_id))
    }

    fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        if let Some(reason) = self.fail_next_apply.lock().take() {
            warn!("Injected apply failure: {}", reason);
            return Err(StoreError::Injected(reason));
        }

        let mut state = self.state.write();
        let mut next = state.clone();
        for op in ops {
            next.apply_op(op)?;
        }
        *state = next;
        Ok(())
    }
}
