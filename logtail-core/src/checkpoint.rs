//! Checkpoint ("sincedb") Store (spec §4.D).
//!
//! Keeps the exact legacy serialization -- including the literal `g`
//! separator inside the identity token -- so that checkpoints written by
//! older builds remain readable (spec §9).

use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use snafu::OptionExt;

use crate::entry::FileIdentity;
use crate::error::{CheckpointError, CheckpointMissingOrCorruptSnafu};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    pub path: String,
    pub identity: FileIdentity,
    pub position: u64,
    pub size: u64,
}

impl CheckpointRecord {
    fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.path,
            self.identity.to_token(),
            self.position,
            self.size
        )
    }

    fn parse(line: &str) -> Option<CheckpointRecord> {
        // rsplit_whitespace(n=3): only the last three tokens are
        // structured, so the path may itself contain spaces.
        let mut rsplit = line.rsplitn(4, char::is_whitespace);
        let size: u64 = rsplit.next()?.parse().ok()?;
        let position: u64 = rsplit.next()?.parse().ok()?;
        let identity_token = rsplit.next()?;
        let identity = FileIdentity::parse_token(identity_token)?;
        let path = rsplit.next()?.to_string();
        Some(CheckpointRecord {
            path,
            identity,
            position,
            size,
        })
    }
}

/// The per-file checkpoint path for `prefix` and log path `log_path`:
/// `prefix + "f" + lowercase_hex(sha1(log_path))`.
pub fn checkpoint_path(prefix: &str, log_path: &str) -> PathBuf {
    let mut hasher = Sha1::new();
    hasher.update(log_path.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    PathBuf::from(format!("{prefix}f{hex}"))
}

#[derive(Clone)]
pub struct CheckpointStore {
    prefix: String,
}

impl CheckpointStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        CheckpointStore { prefix: prefix.into() }
    }

    fn path_for(&self, log_path: &str) -> PathBuf {
        checkpoint_path(&self.prefix, log_path)
    }

    /// Writes are best-effort: failures are never fatal (spec §4.D, §7
    /// `CheckpointWriteFailed`). Callers report `Err` through
    /// [`crate::events::ReaderEvents`] and swallow it.
    pub fn save(&self, log_path: &str, record: &CheckpointRecord) -> std::io::Result<()> {
        let path = self.path_for(log_path);
        fs::write(&path, record.to_line())
    }

    /// `CheckpointMissingOrCorrupt` is returned on any failure; callers
    /// convert that into "start from byte 0" (spec §4.C).
    pub fn load(&self, log_path: &str) -> Result<CheckpointRecord, CheckpointError> {
        let path = self.path_for(log_path);
        let content = fs::read_to_string(&path).ok();
        let record = content.as_deref().and_then(CheckpointRecord::parse);
        record.context(CheckpointMissingOrCorruptSnafu { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_spaces_in_path() {
        let record = CheckpointRecord {
            path: "/var/log/my app.log".to_string(),
            identity: FileIdentity::new(0xabc, 0xdef),
            position: 12345,
            size: 67890,
        };
        let line = record.to_line();
        let parsed = CheckpointRecord::parse(&line).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn checkpoint_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sincedb-").to_string_lossy().to_string();
        let store = CheckpointStore::new(prefix);
        let record = CheckpointRecord {
            path: "/var/log/app.log".to_string(),
            identity: FileIdentity::new(1, 2),
            position: 100,
            size: 200,
        };
        store.save("/var/log/app.log", &record).unwrap();
        let loaded = store.load("/var/log/app.log").unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn missing_checkpoint_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sincedb-").to_string_lossy().to_string();
        let store = CheckpointStore::new(prefix);
        assert!(store.load("/var/log/nope.log").is_err());
    }

    #[test]
    fn quickcheck_round_trip_numeric_fields() {
        fn prop(dev: u64, ino: u64, position: u64, size: u64) -> bool {
            let record = CheckpointRecord {
                path: "/var/log/app.log".to_string(),
                identity: FileIdentity::new(dev, ino),
                position,
                size,
            };
            CheckpointRecord::parse(&record.to_line()) == Some(record)
        }
        quickcheck::quickcheck(prop as fn(u64, u64, u64, u64) -> bool);
    }

    #[test]
    fn corrupt_checkpoint_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("sincedb-").to_string_lossy().to_string();
        let store = CheckpointStore::new(prefix.clone());
        let path = checkpoint_path(&prefix, "/var/log/app.log");
        fs::write(&path, "garbage").unwrap();
        assert!(store.load("/var/log/app.log").is_err());
    }
}
