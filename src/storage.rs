use crate::models::{AttendanceRecord, EventKind};
use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const BACKUP_PREFIX: &str = "fichajes_backup_";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where the store file and its backups live.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub store_path: PathBuf,
    pub backup_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("datos/fichajes.json"),
            backup_dir: PathBuf::from("datos/backups"),
        }
    }
}

/// How a read turned out. `read_all` collapses all of these to a
/// record sequence; callers that care can ask for the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Ok,
    RecoveredFromBackup,
    Corrupted,
    IoError,
}

/// File-backed attendance record store. The store file holds a single
/// JSON array; every save is a full rewrite, preceded by a best-effort
/// timestamped backup.
pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn store_path(&self) -> &Path {
        &self.config.store_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.config.backup_dir
    }

    /// Startup hook, called once by the owning process: snapshots any
    /// pre-existing store file before this run touches it.
    pub fn initialize(&self) -> bool {
        if self.config.store_path.exists() {
            self.create_backup()
        } else {
            true
        }
    }

    /// Copies the store file into the backup directory under a
    /// `fichajes_backup_<YYYYMMDDHHMMSS>.json` name, after checking it
    /// holds well-formed JSON. If it does not, tries to self-heal by
    /// restoring the most recent backup over the store file instead.
    ///
    /// Backup stamps have whole-second resolution; two backups within
    /// the same second overwrite each other.
    pub fn create_backup(&self) -> bool {
        let store = &self.config.store_path;
        if !store.exists() {
            warn!("nothing to back up: {} does not exist", store.display());
            return false;
        }
        if let Err(e) = fs::create_dir_all(&self.config.backup_dir) {
            error!(
                "cannot create backup directory {}: {e}",
                self.config.backup_dir.display()
            );
            return false;
        }
        let text = match fs::read_to_string(store) {
            Ok(text) => text,
            Err(e) => {
                error!("cannot read {}: {e}", store.display());
                return false;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(_) => match self.copy_to_timestamped_backup() {
                Ok(dest) => {
                    info!("backup created: {}", dest.display());
                    true
                }
                Err(e) => {
                    error!("backup copy failed: {e:#}");
                    false
                }
            },
            Err(e) => {
                error!("invalid JSON in {}: {e}", store.display());
                self.restore_latest_backup()
            }
        }
    }

    /// Reads the full record sequence. Missing file is an empty store;
    /// corruption triggers a restore-from-backup attempt and one retry;
    /// anything unrecoverable degrades to an empty sequence. Never
    /// returns an error.
    pub fn read_all(&self) -> Vec<AttendanceRecord> {
        self.read_all_with_outcome().0
    }

    /// Same as [`read_all`](Self::read_all), with a tag saying whether
    /// the data came back clean, was recovered from a backup, or was
    /// lost to corruption or an unreadable file.
    pub fn read_all_with_outcome(&self) -> (Vec<AttendanceRecord>, ReadOutcome) {
        let store = &self.config.store_path;
        if !store.exists() {
            return (Vec::new(), ReadOutcome::Ok);
        }
        let text = match fs::read_to_string(store) {
            Ok(text) => text,
            Err(e) => {
                error!("cannot read {}: {e}", store.display());
                return (Vec::new(), ReadOutcome::IoError);
            }
        };
        match serde_json::from_str(&text) {
            Ok(records) => (records, ReadOutcome::Ok),
            Err(e) => {
                error!("cannot parse {}: {e}", store.display());
                // create_backup restores the latest backup when the
                // live file is corrupt; retry the parse once after it.
                if self.create_backup() {
                    if let Ok(text) = fs::read_to_string(store) {
                        if let Ok(records) = serde_json::from_str(&text) {
                            return (records, ReadOutcome::RecoveredFromBackup);
                        }
                    }
                }
                (Vec::new(), ReadOutcome::Corrupted)
            }
        }
    }

    /// Replaces the store file contents with `records`, pretty-printed.
    /// A backup is attempted first but its failure does not block the
    /// write. Returns false only when serialization or the write fails.
    pub fn write_all(&self, records: &[AttendanceRecord]) -> bool {
        if let Some(parent) = self.config.store_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("cannot create {}: {e}", parent.display());
                return false;
            }
        }
        let _ = self.create_backup();
        match serde_json::to_string_pretty(records) {
            Ok(json) => match fs::write(&self.config.store_path, json) {
                Ok(()) => true,
                Err(e) => {
                    error!("cannot write {}: {e}", self.config.store_path.display());
                    false
                }
            },
            Err(e) => {
                error!("cannot serialize records: {e}");
                false
            }
        }
    }

    /// The single mutation entry point. A clock-in always appends a new
    /// open record for `person_id` stamped with the current local date
    /// and time; a clock-out closes the most recently appended open
    /// record with a matching id, or does nothing when none is open.
    /// The possibly-updated sequence is persisted either way.
    pub fn register_manual_event(
        &self,
        person_id: impl fmt::Display,
        name: &str,
        kind: EventKind,
    ) -> bool {
        let person_id = person_id.to_string();
        let mut records = self.read_all();
        let now = Local::now();
        match kind {
            EventKind::ClockIn => {
                records.push(AttendanceRecord {
                    id: person_id,
                    name: name.to_string(),
                    date: now.format(DATE_FORMAT).to_string(),
                    clock_in_time: now.format(TIME_FORMAT).to_string(),
                    clock_out_time: None,
                    location: None,
                });
            }
            EventKind::ClockOut => {
                let open = records
                    .iter_mut()
                    .rev()
                    .find(|r| r.id == person_id && r.is_open());
                match open {
                    Some(record) => {
                        record.clock_out_time = Some(now.format(TIME_FORMAT).to_string());
                    }
                    None => warn!("no open record for id {person_id}; {kind} ignored"),
                }
            }
        }
        self.write_all(&records)
    }

    fn copy_to_timestamped_backup(&self) -> Result<PathBuf> {
        let stamp = Local::now().format(BACKUP_STAMP_FORMAT);
        let dest = self
            .config
            .backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}.json"));
        fs::copy(&self.config.store_path, &dest).with_context(|| {
            format!(
                "copying {} to {}",
                self.config.store_path.display(),
                dest.display()
            )
        })?;
        Ok(dest)
    }

    fn restore_latest_backup(&self) -> bool {
        match self.latest_backup() {
            Ok(Some(backup)) => {
                info!("restoring store from {}", backup.display());
                match fs::copy(&backup, &self.config.store_path) {
                    Ok(_) => {
                        info!("restore complete: {}", backup.display());
                        true
                    }
                    Err(e) => {
                        error!("restore from {} failed: {e}", backup.display());
                        false
                    }
                }
            }
            Ok(None) => {
                error!(
                    "no backups available in {}",
                    self.config.backup_dir.display()
                );
                false
            }
            Err(e) => {
                error!("cannot list {}: {e}", self.config.backup_dir.display());
                false
            }
        }
    }

    fn latest_backup(&self) -> std::io::Result<Option<PathBuf>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.backup_dir)? {
            let name = entry?.file_name();
            if name.to_string_lossy().starts_with(BACKUP_PREFIX) {
                names.push(name);
            }
        }
        // Fixed-width stamps make lexicographic order chronological.
        names.sort();
        Ok(names.pop().map(|n| self.config.backup_dir.join(n)))
    }
}
