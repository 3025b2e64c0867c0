//! Error kinds, per spec §7.

use std::io;
use std::path::PathBuf;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum OpenError {
    #[snafu(display("failed to open log file {}: {source}", path.display()))]
    OpenFailed { path: PathBuf, source: io::Error },

    #[snafu(display("failed to stat log file {}: {source}", path.display()))]
    StatFailed { path: PathBuf, source: io::Error },
}

#[derive(Debug, Snafu)]
pub enum AutoconfigError {
    #[snafu(display("no code location found in columns 1..3 of the first line of {}", path.display()))]
    AutoconfigFailed { path: PathBuf },

    #[snafu(display("failed to read first line of {}: {source}", path.display()))]
    ReadFailed { path: PathBuf, source: io::Error },
}

#[derive(Debug, Snafu)]
pub enum CheckpointError {
    #[snafu(display("checkpoint file missing or corrupt: {}", path.display()))]
    CheckpointMissingOrCorrupt { path: PathBuf },

    #[snafu(display("failed to write checkpoint for {}: {source}", path.display()))]
    CheckpointWriteFailed { path: PathBuf, source: io::Error },
}
