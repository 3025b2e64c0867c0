//! Housekeeper (spec §4.F): detects rotation/truncation and schedules
//! periodic checkpoint writes.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::checkpoint::{CheckpointRecord, CheckpointStore};
use crate::entry::FileIdentity;
use crate::events::ReaderEvents;

pub const HEALTH_INTERVAL: Duration = Duration::from_secs(2);
pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(5);

/// What the reader loop should do in response to a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthAction {
    /// Nothing changed.
    Noop,
    /// The file no longer exists; keep tailing the current (stale) handle.
    Removed,
    /// Identity changed: reader must close and reopen at position 0.
    Rotated,
    /// Position exceeded size: reader must seek to 0 on the same handle.
    Truncated,
}

pub struct Housekeeper {
    path: PathBuf,
    checkpoint_key: String,
    checkpoints: Option<CheckpointStore>,
    last_health_check: Option<Instant>,
    last_checkpoint_write: Option<Instant>,
}

impl Housekeeper {
    pub fn new(path: PathBuf, checkpoint_key: String, checkpoints: Option<CheckpointStore>) -> Self {
        Housekeeper {
            path,
            checkpoint_key,
            checkpoints,
            last_health_check: None,
            last_checkpoint_write: None,
        }
    }

    /// `ensure_file_is_good`, rate-gated to run at most every
    /// `HEALTH_INTERVAL`. Returns `None` if the gate suppressed the check.
    ///
    /// `current_position` is compared against the on-disk file length to
    /// detect truncation; for a gzip source that position is a decompressed
    /// offset, not comparable to the compressed file length, so
    /// `is_gzip` disables that comparison (rotation is still detected via
    /// identity).
    pub fn maybe_check_health(
        &mut self,
        now: Instant,
        current_identity: FileIdentity,
        current_position: u64,
        is_gzip: bool,
    ) -> Option<HealthAction> {
        if let Some(last) = self.last_health_check {
            if now.duration_since(last) < HEALTH_INTERVAL {
                return None;
            }
        }
        self.last_health_check = Some(now);

        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(_) => return Some(HealthAction::Removed),
        };

        let actual_identity = file_identity(&metadata);
        if actual_identity != current_identity {
            return Some(HealthAction::Rotated);
        }

        if !is_gzip && current_position > metadata.len() {
            return Some(HealthAction::Truncated);
        }

        Some(HealthAction::Noop)
    }

    /// `save_progress`, rate-gated to run at most every
    /// `CHECKPOINT_INTERVAL`. No-op if checkpointing is disabled.
    pub fn maybe_save_progress(
        &mut self,
        now: Instant,
        events: &dyn ReaderEvents,
        identity: FileIdentity,
        position: u64,
        size: u64,
    ) {
        let Some(store) = &self.checkpoints else {
            return;
        };
        if let Some(last) = self.last_checkpoint_write {
            if now.duration_since(last) < CHECKPOINT_INTERVAL {
                return;
            }
        }
        self.last_checkpoint_write = Some(now);

        let record = CheckpointRecord {
            path: self.checkpoint_key.clone(),
            identity,
            position,
            size,
        };
        if store.save(&self.checkpoint_key, &record).is_err() {
            events.checkpoint_write_failed(&self.path);
        }
    }
}

#[cfg(unix)]
fn file_identity(metadata: &std::fs::Metadata) -> FileIdentity {
    use std::os::unix::fs::MetadataExt;
    FileIdentity::new(metadata.dev(), metadata.ino())
}

#[cfg(not(unix))]
fn file_identity(_metadata: &std::fs::Metadata) -> FileIdentity {
    FileIdentity::new(0, 0)
}
