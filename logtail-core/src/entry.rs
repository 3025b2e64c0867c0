//! The log entry data model (spec §3).

use std::cmp::Ordering;

/// Severity, in priority order. Derive order matches priority 0..5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Map the first alphabetic character of a level token (after stripping a
    /// leading `[`) to a level. Unknown first letters map to `Fatal` -- this
    /// deliberately turns `"WARNING"` into `Warn` and `"BORING"` into `Fatal`,
    /// matching the legacy parser's behavior.
    pub fn from_first_letter(token: &str) -> Level {
        let stripped = token.strip_prefix('[').unwrap_or(token);
        match stripped.chars().next() {
            Some('T') => Level::Trace,
            Some('D') => Level::Debug,
            Some('I') => Level::Info,
            Some('W') => Level::Warn,
            Some('E') => Level::Error,
            _ => Level::Fatal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

/// `(device, inode)` rendered as `"{dev:x}g{ino:x}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub device: u64,
    pub inode: u64,
}

impl FileIdentity {
    pub fn new(device: u64, inode: u64) -> Self {
        FileIdentity { device, inode }
    }

    pub fn to_token(self) -> String {
        format!("{:x}g{:x}", self.device, self.inode)
    }

    pub fn parse_token(token: &str) -> Option<FileIdentity> {
        let (dev, ino) = token.split_once('g')?;
        Some(FileIdentity {
            device: u64::from_str_radix(dev, 16).ok()?,
            inode: u64::from_str_radix(ino, 16).ok()?,
        })
    }
}

/// An immutable, fully parsed log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Raw 23-character `YYYY-MM-DD HH:MM:SS,mmm` timestamp. Kept as text so
    /// that lexicographic compare equals chronological compare.
    pub timestamp_text: String,
    pub reader_id: usize,
    pub entry_index: u64,
    pub flow_id: Option<String>,
    pub level: Level,
    pub thread: Option<String>,
    pub class_name: String,
    pub method: String,
    pub source_file: String,
    pub source_line: i64,
    pub message: String,
}

/// The total order from spec §3: `(timestamp_text, reader_id, entry_index)`.
impl LogEntry {
    pub fn sort_key(&self) -> (&str, usize, u64) {
        (&self.timestamp_text, self.reader_id, self.entry_index)
    }
}

impl PartialOrd for LogEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// `(levels, grep, time_from, time_to)` -- see spec §3.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub levels: Vec<Level>,
    pub grep: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
}

impl Filter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.levels.is_empty() && !self.levels.contains(&entry.level) {
            return false;
        }
        if let Some(grep) = &self.grep {
            if !entry.message.contains(grep.as_str()) && !entry.class_name.contains(grep.as_str())
            {
                return false;
            }
        }
        if let Some(from) = &self.time_from {
            if entry.timestamp_text.as_str() < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.time_to {
            if entry.timestamp_text.as_str() >= to.as_str() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_first_letter_oddities() {
        assert_eq!(Level::from_first_letter("WARNING"), Level::Warn);
        assert_eq!(Level::from_first_letter("BORING"), Level::Fatal);
        assert_eq!(Level::from_first_letter("[DEBUG]"), Level::Debug);
    }

    #[test]
    fn identity_token_round_trips() {
        let id = FileIdentity::new(0xabc, 0x10);
        let token = id.to_token();
        assert_eq!(token, "abcg10");
        assert_eq!(FileIdentity::parse_token(&token), Some(id));
    }

    fn entry(ts: &str, reader_id: usize, entry_index: u64) -> LogEntry {
        LogEntry {
            timestamp_text: ts.to_string(),
            reader_id,
            entry_index,
            flow_id: None,
            level: Level::Info,
            thread: None,
            class_name: String::new(),
            method: String::new(),
            source_file: String::new(),
            source_line: -1,
            message: String::new(),
        }
    }

    #[test]
    fn total_order_ties_on_reader_then_index() {
        let a = entry("2000-01-01 00:00:00,000", 0, 5);
        let b = entry("2000-01-01 00:00:00,000", 1, 0);
        assert!(a < b);
        let c = entry("2000-01-01 00:00:00,000", 0, 4);
        assert!(c < a);
    }

    #[test]
    fn filter_semantics() {
        let mut f = Filter::default();
        assert!(f.matches(&entry("2000-01-01 00:00:00,000", 0, 0)));

        f.levels = vec![Level::Error];
        assert!(!f.matches(&entry("2000-01-01 00:00:00,000", 0, 0)));

        let mut e = entry("2000-01-01 00:00:00,000", 0, 0);
        e.level = Level::Error;
        assert!(f.matches(&e));

        f.time_from = Some("2000-01-01 00:00:00,500".to_string());
        assert!(!f.matches(&e));
        f.time_from = None;
        f.time_to = Some("2000-01-01 00:00:00,000".to_string());
        assert!(!f.matches(&e));
    }
}
