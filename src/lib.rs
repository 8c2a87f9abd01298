//! Clock-in/clock-out record keeper backed by a single JSON file, with
//! timestamped backups and restore-from-backup self-healing, plus a
//! small great-circle distance helper.

pub mod geo;
pub mod models;
pub mod storage;

pub use geo::surface_distance;
pub use models::{AttendanceRecord, EventKind};
pub use storage::{ReadOutcome, RecordStore, StoreConfig, BACKUP_PREFIX};
