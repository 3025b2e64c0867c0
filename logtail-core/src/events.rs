//! Injectable logging interface for reader-level observability.
//!
//! Spec §9 flags "process-wide logger monkey-patching" (used by the
//! original's test suite) as a pattern requiring re-architecture: each
//! component gets an injected logging interface instead, modeled on
//! `file-source`'s `FileSourceInternalEvents` trait. Production code uses
//! [`TracingEvents`]; tests can supply a recording implementation.

use std::path::Path;

/// Every notable event a reader can emit over its lifetime.
pub trait ReaderEvents: Send + Sync + 'static {
    fn file_opened(&self, path: &Path);
    fn file_removed(&self, path: &Path);
    fn file_rotated(&self, path: &Path);
    fn file_truncated(&self, path: &Path);
    fn checkpoint_resumed(&self, path: &Path, position: u64);
    fn checkpoint_read_failed(&self, path: &Path);
    fn checkpoint_write_failed(&self, path: &Path);
    fn line_rejected(&self, path: &Path, line: &str);
    fn autoconfig_failed(&self, path: &Path);
}

/// Default production implementation: forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl ReaderEvents for TracingEvents {
    fn file_opened(&self, path: &Path) {
        tracing::info!(path = %path.display(), "opened");
    }

    fn file_removed(&self, path: &Path) {
        tracing::info!(path = %path.display(), "file removed");
    }

    fn file_rotated(&self, path: &Path) {
        tracing::info!(path = %path.display(), "file rotated");
    }

    fn file_truncated(&self, path: &Path) {
        tracing::info!(path = %path.display(), "file truncated");
    }

    fn checkpoint_resumed(&self, path: &Path, position: u64) {
        tracing::info!(path = %path.display(), position, "resumed from checkpoint");
    }

    fn checkpoint_read_failed(&self, path: &Path) {
        tracing::warn!(path = %path.display(), "failed to read checkpoint");
    }

    fn checkpoint_write_failed(&self, path: &Path) {
        tracing::warn!(path = %path.display(), "failed to write checkpoint");
    }

    fn line_rejected(&self, path: &Path, line: &str) {
        tracing::warn!(path = %path.display(), line, "rejected malformed line");
    }

    fn autoconfig_failed(&self, path: &Path) {
        tracing::warn!(path = %path.display(), "auto-configuration failed");
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        FileOpened(String),
        FileRemoved(String),
        FileRotated(String),
        FileTruncated(String),
        CheckpointResumed(String, u64),
        CheckpointReadFailed(String),
        CheckpointWriteFailed(String),
        LineRejected(String, String),
        AutoconfigFailed(String),
    }

    #[derive(Default)]
    pub struct RecordingEvents {
        pub events: Mutex<Vec<Recorded>>,
    }

    impl ReaderEvents for RecordingEvents {
        fn file_opened(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::FileOpened(path.display().to_string()));
        }
        fn file_removed(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::FileRemoved(path.display().to_string()));
        }
        fn file_rotated(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::FileRotated(path.display().to_string()));
        }
        fn file_truncated(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::FileTruncated(path.display().to_string()));
        }
        fn checkpoint_resumed(&self, path: &Path, position: u64) {
            self.events.lock().unwrap().push(Recorded::CheckpointResumed(
                path.display().to_string(),
                position,
            ));
        }
        fn checkpoint_read_failed(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::CheckpointReadFailed(path.display().to_string()));
        }
        fn checkpoint_write_failed(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::CheckpointWriteFailed(path.display().to_string()));
        }
        fn line_rejected(&self, path: &Path, line: &str) {
            self.events.lock().unwrap().push(Recorded::LineRejected(
                path.display().to_string(),
                line.to_string(),
            ));
        }
        fn autoconfig_failed(&self, path: &Path) {
            self.events
                .lock()
                .unwrap()
                .push(Recorded::AutoconfigFailed(path.display().to_string()));
        }
    }
}
