//! Durable, atomically committed snapshots of the clock + account graph.
//!
//! One checkpoint per completed trading day, keyed by date (`YYYYMMDD`
//! directory under the store root). A write lands in an underscore-prefixed
//! staging directory first and is committed by a single atomic rename, so a
//! reader can never observe a half-written checkpoint. Recovery scans for the
//! newest committed key, deleting staging leftovers and anything that fails
//! the checksum on the way.

use crate::clock::ClockSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SNAPSHOT_FILE: &str = "snapshot.json";
const KEY_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encode/decode error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("checkpoint {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// On-disk wrapper: the serialized graph plus a blake3 checksum over it, so
/// bit rot and truncation surface as `Corrupt` instead of bad state.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    graph: String,
}

/// Store contract, kept narrow so tests can exercise recovery directly.
pub trait CheckpointStore {
    fn write_snapshot(&self, date: NaiveDate, graph: &ClockSnapshot)
        -> Result<(), CheckpointError>;
    fn list_committed_keys(&self) -> Result<Vec<NaiveDate>, CheckpointError>;
    fn read_snapshot(&self, date: NaiveDate) -> Result<ClockSnapshot, CheckpointError>;
}

/// Filesystem-backed store, one directory per committed day.
pub struct DirCheckpointStore {
    root: PathBuf,
}

impl DirCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(date: NaiveDate) -> String {
        date.format(KEY_FORMAT).to_string()
    }

    fn parse_key(name: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(name, KEY_FORMAT).ok()
    }

    /// Delete every committed checkpoint older than `keep`.
    pub fn prune_before(&self, keep: NaiveDate) -> Result<(), CheckpointError> {
        for date in self.list_committed_keys()? {
            if date < keep {
                fs::remove_dir_all(self.root.join(Self::key(date)))?;
            }
        }
        Ok(())
    }

    /// Recover the newest usable checkpoint.
    ///
    /// Staging leftovers and entries that don't parse as a date key are
    /// deleted outright; committed checkpoints that fail the checksum or
    /// decode are deleted and recovery falls back to the next-most-recent
    /// one. `Ok(None)` means a fresh start.
    pub fn recover_latest(&self) -> Result<Option<(NaiveDate, ClockSnapshot)>, CheckpointError> {
        if !self.root.exists() {
            return Ok(None);
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::parse_key(&name).is_some() {
                continue;
            }
            // Partial (underscore-staged) or foreign entry: never trust it.
            if entry.path().is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }

        let mut keys = self.list_committed_keys()?;
        while let Some(date) = keys.pop() {
            match self.read_snapshot(date) {
                Ok(graph) => return Ok(Some((date, graph))),
                Err(CheckpointError::Corrupt { .. }) | Err(CheckpointError::Codec(_)) => {
                    fs::remove_dir_all(self.root.join(Self::key(date)))?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

impl CheckpointStore for DirCheckpointStore {
    fn write_snapshot(
        &self,
        date: NaiveDate,
        graph: &ClockSnapshot,
    ) -> Result<(), CheckpointError> {
        let key = Self::key(date);
        let staging = self.root.join(format!("_{key}"));
        let committed = self.root.join(&key);

        // Restart mid-write leaves stale staging behind; start clean.
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        if committed.exists() {
            fs::remove_dir_all(&committed)?;
        }
        fs::create_dir_all(&staging)?;

        let payload = serde_json::to_string(graph)?;
        let envelope = Envelope {
            checksum: blake3::hash(payload.as_bytes()).to_hex().to_string(),
            graph: payload,
        };
        fs::write(
            staging.join(SNAPSHOT_FILE),
            serde_json::to_string(&envelope)?,
        )?;

        // The commit point: rename is atomic on one filesystem.
        fs::rename(&staging, &committed)?;
        Ok(())
    }

    fn list_committed_keys(&self) -> Result<Vec<NaiveDate>, CheckpointError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(date) = Self::parse_key(&entry.file_name().to_string_lossy()) {
                keys.push(date);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    fn read_snapshot(&self, date: NaiveDate) -> Result<ClockSnapshot, CheckpointError> {
        let key = Self::key(date);
        let raw = fs::read_to_string(self.root.join(&key).join(SNAPSHOT_FILE))?;
        let envelope: Envelope = serde_json::from_str(&raw)?;
        let checksum = blake3::hash(envelope.graph.as_bytes()).to_hex().to_string();
        if checksum != envelope.checksum {
            return Err(CheckpointError::Corrupt {
                key,
                reason: "checksum mismatch".to_string(),
            });
        }
        Ok(serde_json::from_str(&envelope.graph)?)
    }
}
