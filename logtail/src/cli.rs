//! Command-line options, mirroring the option set of the Python original
//! (`original_source/logfire.py`'s `OptionParser` block).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "logtail", about = "Tail and merge log4j-shaped log files")]
pub struct Cli {
    /// Use custom configuration profile(s), comma-separated.
    #[arg(short = 'p', long)]
    pub profile: Option<String>,

    /// Keep files open, reading new lines as they arrive.
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Show last N lines (default 100 when this flag is present).
    #[arg(short = 't', long)]
    pub tail: bool,

    /// Number of lines shown by `--tail`.
    #[arg(short = 'n', long = "lines", default_value_t = 100)]
    pub tail_lines: u64,

    /// Collapse multi-line entries onto a single line.
    #[arg(short = 'c', long)]
    pub collapse: bool,

    /// Truncate log message to this many characters.
    #[arg(long)]
    pub truncate: Option<usize>,

    /// Only show entries with this comma-separated set of log levels.
    #[arg(short = 'l', long)]
    pub levels: Option<String>,

    /// Only show entries whose message or class contains this substring.
    #[arg(short = 'g', long)]
    pub grep: Option<String>,

    /// Only show entries at or after this timestamp.
    #[arg(long = "time-from")]
    pub time_from: Option<String>,

    /// Only show entries strictly before this timestamp.
    #[arg(long = "time-to")]
    pub time_to: Option<String>,

    /// Directory/prefix for sincedb checkpoint files; omit to disable
    /// checkpointing.
    #[arg(long = "sincedb")]
    pub sincedb_prefix: Option<String>,

    /// Deliver entries as a FIFO (arrival order) rather than merged by
    /// timestamp.
    #[arg(long)]
    pub fifo: bool,

    /// Ship entries to this Redis list instead of printing to the
    /// terminal (`host:port/list-name`).
    #[arg(long)]
    pub redis: Option<String>,

    /// `[name:]path` log files to tail.
    pub files: Vec<String>,
}
