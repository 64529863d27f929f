//! Cached, persisted per-player progression records.
//!
//! Records are loaded lazily on first access and kept in a sharded map. Each
//! record sits behind its own mutex and every mutation holds that mutex for the
//! whole read-modify-write, so the tick thread and async command handlers can
//! touch the same player without losing updates. Records are written as RON,
//! one file per player.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::ProgressionError;
use crate::progress::PlayerRecord;

pub type RecordHandle = Arc<Mutex<PlayerRecord>>;

#[derive(Debug)]
pub struct ProgressionStore {
    dir: PathBuf,
    records: DashMap<Uuid, RecordHandle>,
}

impl ProgressionStore {
    /// Create a store persisting into `dir`. Nothing is read until first access.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            records: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the save file for `player`.
    pub fn record_path(&self, player: Uuid) -> PathBuf {
        self.dir.join(format!("{player}.ron"))
    }

    /// Shared handle to the player's record, loading or creating it on first access.
    pub(crate) fn handle(&self, player: Uuid) -> RecordHandle {
        if let Some(existing) = self.records.get(&player) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .records
            .entry(player)
            .or_insert_with(|| Arc::new(Mutex::new(self.load_or_new(player))));
        Arc::clone(entry.value())
    }

    /// Run `f` with exclusive access to the player's record, reloading it if
    /// the player was evicted between fetching the handle and locking it.
    pub fn with_record<R>(&self, player: Uuid, f: impl FnOnce(&mut PlayerRecord) -> R) -> R {
        loop {
            let handle = self.handle(player);
            let mut record = handle.lock().unwrap_or_else(PoisonError::into_inner);
            if self.is_current(player, &handle) {
                return f(&mut record);
            }
            debug!("{player} was evicted before the lock was taken, reloading");
        }
    }

    /// Like [`Self::with_record`] for a handle fetched earlier. `None` when that
    /// handle has since been evicted and must not be written.
    pub(crate) fn with_handle<R>(
        &self,
        player: Uuid,
        handle: &RecordHandle,
        f: impl FnOnce(&mut PlayerRecord) -> R,
    ) -> Option<R> {
        let mut record = handle.lock().unwrap_or_else(PoisonError::into_inner);
        self.is_current(player, handle).then(|| f(&mut record))
    }

    /// Read the player's record without caching it or touching disk state.
    /// Uncached players are read from their save file, or start fresh.
    pub fn peek<R>(&self, player: Uuid, f: impl FnOnce(&PlayerRecord) -> R) -> R {
        if let Some(handle) = self.records.get(&player).map(|entry| Arc::clone(entry.value())) {
            let record = handle.lock().unwrap_or_else(PoisonError::into_inner);
            return f(&record);
        }
        let path = self.record_path(player);
        let record = if path.exists() {
            load_record(&path).unwrap_or_else(|err| {
                debug!("reading {player} as fresh, {err:#}");
                PlayerRecord::new(player)
            })
        } else {
            PlayerRecord::new(player)
        };
        f(&record)
    }

    /// Snapshot of the player's record. Does not cache uncached players.
    pub fn snapshot(&self, player: Uuid) -> PlayerRecord {
        self.peek(player, PlayerRecord::clone)
    }

    fn is_current(&self, player: Uuid, handle: &RecordHandle) -> bool {
        self.records
            .get(&player)
            .is_some_and(|current| Arc::ptr_eq(current.value(), handle))
    }

    pub fn is_cached(&self, player: Uuid) -> bool {
        self.records.contains_key(&player)
    }

    pub fn cached_players(&self) -> Vec<Uuid> {
        let mut players: Vec<Uuid> = self.records.iter().map(|entry| *entry.key()).collect();
        players.sort();
        players
    }

    /// Flush one cached record to disk. Uncached players are a no-op.
    ///
    /// # Errors
    /// Returns an error if the record cannot be serialized or written.
    pub fn save(&self, player: Uuid) -> Result<()> {
        let Some(handle) = self.records.get(&player).map(|entry| Arc::clone(entry.value())) else {
            return Ok(());
        };
        let record = handle.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_record(player, &record)
    }

    /// Flush every cached record; failures are logged and counted.
    pub fn save_all(&self) -> usize {
        let mut failures = 0;
        for player in self.cached_players() {
            if let Err(err) = self.save(player) {
                error!("failed to save progression for {player}: {err:#}");
                failures += 1;
            }
        }
        info!("flushed {} cached player record(s), {failures} failure(s)", self.records.len());
        failures
    }

    /// Flush then evict a player. A failed flush keeps the record cached.
    ///
    /// The record stays locked from serialization until it leaves the map, so no
    /// write can land on it between the flush and the eviction.
    pub fn unload(&self, player: Uuid) -> bool {
        let Some(handle) = self.records.get(&player).map(|entry| Arc::clone(entry.value())) else {
            return true;
        };
        let record = handle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = self.write_record(player, &record) {
            error!("keeping {player} cached after failed save: {err:#}");
            return false;
        }
        self.records
            .remove_if(&player, |_, current| Arc::ptr_eq(current, &handle));
        drop(record);
        debug!("unloaded progression for {player}");
        true
    }

    fn write_record(&self, player: Uuid, record: &PlayerRecord) -> Result<()> {
        let text = ron::ser::to_string_pretty(record, ron::ser::PrettyConfig::default())
            .with_context(|| format!("serializing progression for {player}"))?;
        write_atomically(&self.record_path(player), &text)
    }

    fn load_or_new(&self, player: Uuid) -> PlayerRecord {
        let path = self.record_path(player);
        if !path.exists() {
            return PlayerRecord::new(player);
        }
        match load_record(&path) {
            Ok(mut record) => {
                record.player_id = player;
                debug!("loaded progression for {player} from {}", path.display());
                record
            },
            Err(err) => {
                warn!("starting {player} fresh, could not load {}: {err:#}", path.display());
                let aside = path.with_extension("ron.corrupt");
                if let Err(copy_err) = fs::copy(&path, &aside) {
                    warn!("could not preserve {}: {copy_err}", path.display());
                }
                PlayerRecord::new(player)
            },
        }
    }
}

fn load_record(path: &Path) -> Result<PlayerRecord> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ron::from_str::<PlayerRecord>(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_atomically(path: &Path, text: &str) -> Result<()> {
    let io_err = |source| ProgressionError::PersistenceIo {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let tmp = path.with_extension("ron.tmp");
    fs::write(&tmp, text).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
