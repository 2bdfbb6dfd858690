// ROCKSDB BACKEND
// Column families:
//   seasons      season_id (be u32)                 -> bincode(Season)
//   rounds       season_id (be u32) ++ round_id (be) -> bincode(Round)
//   round_owner  round_id (be u32)                  -> season_id (be u32)
//   meta         "next_round_id"                    -> be u32
//
// `apply` folds every op into one WriteBatch, so a failed run never leaves a
// season with a partial round set.

use arena_core::{Round, RoundId, Season, SeasonId};
use log::{debug, info};
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use std::collections::{HashMap, HashSet};

use crate::config::StoreConfig;
use crate::contract::{ScheduleBackend, WriteOp};
use crate::error::StoreError;

const CF_SEASONS: &str = "seasons";
const CF_ROUNDS: &str = "rounds";
const CF_ROUND_OWNER: &str = "round_owner";
const CF_META: &str = "meta";
const KEY_NEXT_ROUND_ID: &[u8] = b"next_round_id";

pub struct RocksBackend {
    db: DB,
}

impl RocksBackend {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(
            &opts,
            &config.path,
            [CF_SEASONS, CF_ROUNDS, CF_ROUND_OWNER, CF_META],
        )?;
        info!("Opened schedule store at {}", config.path.display());
        Ok(RocksBackend { db })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or(StoreError::MissingColumnFamily(name))
    }

    fn stored_next_round_id(&self) -> Result<u32, StoreError> {
        match self.db.get_cf(self.cf(CF_META)?, KEY_NEXT_ROUND_ID)? {
            Some(bytes) => decode_u32(KEY_NEXT_ROUND_ID, &bytes),
            None => Ok(1),
        }
    }
}

fn season_key(id: SeasonId) -> [u8; 4] {
    id.as_u32().to_be_bytes()
}

fn round_key(season_id: SeasonId, round_id: RoundId) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&season_id.as_u32().to_be_bytes());
    key[4..].copy_from_slice(&round_id.as_u32().to_be_bytes());
    key
}

fn decode_u32(key: &[u8], bytes: &[u8]) -> Result<u32, StoreError> {
    let array: [u8; 4] = bytes.try_into().map_err(|_| StoreError::Corrupt {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: format!("expected 4 bytes, found {}", bytes.len()),
    })?;
    Ok(u32::from_be_bytes(array))
}

impl ScheduleBackend for RocksBackend {
    fn load_season(&self, id: SeasonId) -> Result<Option<Season>, StoreError> {
        match self.db.get_cf(self.cf(CF_SEASONS)?, season_key(id))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_seasons(&self) -> Result<Vec<Season>, StoreError> {
        let mut seasons = Vec::new();
        for entry in self.db.iterator_cf(self.cf(CF_SEASONS)?, IteratorMode::Start) {
            let (_, value) = entry?;
            seasons.push(bincode::deserialize(&value)?);
        }
        Ok(seasons)
    }

    fn load_rounds(&self, season_id: SeasonId) -> Result<Vec<Round>, StoreError> {
        let prefix = season_key(season_id);
        let mut rounds: Vec<Round> = Vec::new();
        let iter = self.db.iterator_cf(
            self.cf(CF_ROUNDS)?,
            IteratorMode::From(&prefix[..], Direction::Forward),
        );
        for entry in iter {
            let (key, value) = entry?;
            if !key.starts_with(&prefix[..]) {
                break;
            }
            rounds.push(bincode::deserialize(&value)?);
        }
        rounds.sort_by_key(|round| (round.start_block, round.end_block));
        Ok(rounds)
    }

    fn round_owner(&self, round_id: RoundId) -> Result<Option<SeasonId>, StoreError> {
        let key = round_id.as_u32().to_be_bytes();
        match self.db.get_cf(self.cf(CF_ROUND_OWNER)?, key)? {
            Some(bytes) => Ok(Some(SeasonId(decode_u32(&key, &bytes)?))),
            None => Ok(None),
        }
    }

    fn next_round_id(&self) -> Result<RoundId, StoreError> {
        Ok(RoundId(self.stored_next_round_id()?))
    }

    fn apply(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let seasons_cf = self.cf(CF_SEASONS)?;
        let rounds_cf = self.cf(CF_ROUNDS)?;
        let owner_cf = self.cf(CF_ROUND_OWNER)?;
        let meta_cf = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();
        // Seasons written earlier in this batch, for SetBoundary that follows.
        let mut pending_seasons: HashMap<SeasonId, Season> = HashMap::new();
        let mut pending_rounds: HashSet<RoundId> = HashSet::new();
        let mut next_round_id = self.stored_next_round_id()?;

        for op in ops {
            match op {
                WriteOp::PutSeason(season) => {
                    batch.put_cf(seasons_cf, season_key(season.id), bincode::serialize(season)?);
                    pending_seasons.insert(season.id, season.clone());
                }
                WriteOp::SetBoundary {
                    season_id,
                    start_block,
                    end_block,
                } => {
                    let mut season = match pending_seasons.get(season_id) {
                        Some(season) => season.clone(),
                        None => self
                            .load_season(*season_id)?
                            .ok_or(StoreError::SeasonNotFound(*season_id))?,
                    };
                    season.start_block = *start_block;
                    season.end_block = *end_block;
                    batch.put_cf(seasons_cf, season_key(*season_id), bincode::serialize(&season)?);
                    pending_seasons.insert(*season_id, season);
                }
                WriteOp::DeleteRound {
                    season_id,
                    round_id,
                } => {
                    let known = pending_rounds.remove(round_id)
                        || self.round_owner(*round_id)? == Some(*season_id);
                    if !known {
                        return Err(StoreError::RoundNotFound(*round_id));
                    }
                    batch.delete_cf(rounds_cf, round_key(*season_id, *round_id));
                    batch.delete_cf(owner_cf, round_id.as_u32().to_be_bytes());
                }
                WriteOp::InsertRound(round) => {
                    let season_known = pending_seasons.contains_key(&round.season_id)
                        || self.load_season(round.season_id)?.is_some();
                    if !season_known {
                        return Err(StoreError::SeasonNotFound(round.season_id));
                    }
                    batch.put_cf(
                        rounds_cf,
                        round_key(round.season_id, round.id),
                        bincode::serialize(round)?,
                    );
                    batch.put_cf(
                        owner_cf,
                        round.id.as_u32().to_be_bytes(),
                        round.season_id.as_u32().to_be_bytes(),
                    );
                    pending_rounds.insert(round.id);
                    next_round_id = next_round_id.max(round.id.as_u32().saturating_add(1));
                }
            }
        }

        batch.put_cf(meta_cf, KEY_NEXT_ROUND_ID, next_round_id.to_be_bytes());
        debug!("Writing batch of {} ops", ops.len());
        self.db.write(batch)?;
        Ok(())
    }
}
