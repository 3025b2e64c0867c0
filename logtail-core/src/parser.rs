//! Record Parser (spec §4.A): splits a byte stream into structured [`LogEntry`]
//! records, with auto-detection of the column layout.

use std::io::{self, BufRead, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::entry::{Level, LogEntry};
use crate::error::{AutoconfigError, AutoconfigFailedSnafu, ReadFailedSnafu};
use crate::events::ReaderEvents;

/// `(delimiter, column_count, index_of_flow_id?, index_of_level,
/// index_of_thread?, index_of_location, index_of_message)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    pub delimiter: u8,
    pub column_count: usize,
    pub index_of_flow_id: Option<usize>,
    pub index_of_level: usize,
    pub index_of_thread: Option<usize>,
    pub index_of_location: usize,
    pub index_of_message: usize,
}

impl ParserConfig {
    fn for_column_count(column_count: usize, index_of_location: usize) -> ParserConfig {
        let index_of_message = index_of_location + 1;
        match column_count {
            3 => ParserConfig {
                delimiter: b' ',
                column_count,
                index_of_flow_id: None,
                index_of_level: 0,
                index_of_thread: None,
                index_of_location,
                index_of_message,
            },
            4 => ParserConfig {
                delimiter: b' ',
                column_count,
                index_of_flow_id: None,
                index_of_level: 0,
                index_of_thread: Some(1),
                index_of_location,
                index_of_message,
            },
            5 => ParserConfig {
                delimiter: b' ',
                column_count,
                index_of_flow_id: Some(0),
                index_of_level: 1,
                index_of_thread: Some(2),
                index_of_location,
                index_of_message,
            },
            _ => unreachable!("column_count is only ever derived as 3, 4, or 5"),
        }
    }
}

/// A header line: the first two bytes are `"20"` and byte 23 is a space.
pub fn is_header_line(line: &str) -> bool {
    line.len() > 23 && line.as_bytes()[0] == b'2' && line.as_bytes()[1] == b'0' && line.as_bytes()[23] == b' '
}

/// The 23-character timestamp text of a header line. Caller must have
/// already checked `is_header_line`.
pub fn extract_timestamp(header_line: &str) -> &str {
    &header_line[0..23]
}

/// Probe the first line of `path`'s content, reading from `reader`, and
/// derive a [`ParserConfig`]. Restores the reader to position 0 afterward,
/// whether the probe succeeds or fails.
pub fn autoconfigure<R: BufRead + Seek>(
    reader: &mut R,
    path: &Path,
) -> Result<ParserConfig, AutoconfigError> {
    let result = autoconfigure_inner(reader, path);
    reader
        .seek(SeekFrom::Start(0))
        .context(ReadFailedSnafu { path: path.to_path_buf() })?;
    result
}

fn autoconfigure_inner<R: BufRead + Seek>(
    reader: &mut R,
    path: &Path,
) -> Result<ParserConfig, AutoconfigError> {
    let mut first_line = String::new();
    reader
        .read_line(&mut first_line)
        .context(ReadFailedSnafu { path: path.to_path_buf() })?;
    let trimmed = first_line.trim_end_matches(['\n', '\r']);
    if !is_header_line(trimmed) || trimmed.len() <= 24 {
        return AutoconfigFailedSnafu { path: path.to_path_buf() }.fail();
    }

    let after_date = &trimmed[24..];
    let columns: Vec<&str> = after_date.split(' ').collect();

    for &candidate in &[1usize, 2, 3] {
        if candidate >= columns.len() {
            continue;
        }
        if let Some(location) = parse_location(columns[candidate]) {
            if !location.class_name.is_empty()
                && !location.method.is_empty()
                && !location.source_file.is_empty()
                && location.source_line >= 0
            {
                return Ok(ParserConfig::for_column_count(candidate + 2, candidate));
            }
        }
    }

    AutoconfigFailedSnafu { path: path.to_path_buf() }.fail()
}

struct Location {
    class_name: String,
    method: String,
    source_file: String,
    source_line: i64,
}

/// Code location column: `Class.method(File:Line):?`.
///
/// Strips one trailing `':'` and one trailing `')'`, partitions on the last
/// `'('` into class_and_method / file_and_line, partitions class_and_method
/// on the last `'.'`, and partitions file_and_line on the first `':'`. All
/// parts default independently to empty/absent when missing.
fn parse_location(column: &str) -> Option<Location> {
    let mut s = column;
    s = s.strip_suffix(':').unwrap_or(s);
    s = s.strip_suffix(')').unwrap_or(s);

    let (class_and_method, file_and_line) = match s.rfind('(') {
        Some(idx) => (&s[..idx], &s[idx + 1..]),
        None => (s, ""),
    };

    let (class_name, method) = match class_and_method.rfind('.') {
        Some(idx) => (&class_and_method[..idx], &class_and_method[idx + 1..]),
        None => ("", class_and_method),
    };

    let (source_file, line_text) = match file_and_line.find(':') {
        Some(idx) => (&file_and_line[..idx], &file_and_line[idx + 1..]),
        None => (file_and_line, ""),
    };

    let source_line = line_text.parse::<i64>().unwrap_or(-1);

    Some(Location {
        class_name: class_name.to_string(),
        method: method.to_string(),
        source_file: source_file.to_string(),
        source_line,
    })
}

/// A lazy sequence of entries read from a reader passed transiently to each
/// call, using `config`.
///
/// Reads record-by-record: a header line starts a record; subsequent
/// non-header lines are appended to the message verbatim; the first
/// following header line (or EOF) ends the record, with the terminating
/// header line put back (seek backward by its length) so the next call
/// re-reads it.
///
/// The parser does not hold the reader between calls -- it is handed a
/// `&mut R` only for the duration of `next_entry`, so the reader loop stays
/// free to borrow the same file source for housekeeping (rotation/
/// truncation checks, checkpoint saves) in between batches. `next_index` is
/// owned here rather than reset per batch, since callers construct one
/// `Parser` per reader for its whole lifetime and it is what makes
/// `entry_index` monotonically increasing across follow-mode poll cycles
/// (spec §3/§5).
pub struct Parser<'a> {
    config: ParserConfig,
    path: PathBuf,
    reader_id: usize,
    next_index: u64,
    events: &'a dyn ReaderEvents,
}

impl<'a> Parser<'a> {
    pub fn new(config: ParserConfig, path: PathBuf, reader_id: usize, events: &'a dyn ReaderEvents) -> Self {
        Parser {
            config,
            path,
            reader_id,
            next_index: 0,
            events,
        }
    }

    fn read_raw_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(buf))
    }

    /// Read the next record, skipping and warn-logging malformed header
    /// lines along the way. Returns `Ok(None)` at EOF.
    pub fn next_entry<R: BufRead + Seek>(&mut self, reader: &mut R) -> io::Result<Option<LogEntry>> {
        loop {
            let raw = match Self::read_raw_line(reader)? {
                None => return Ok(None),
                Some(line) => line,
            };
            let header = raw.trim_end_matches(['\n', '\r']).to_string();
            if header.is_empty() {
                continue;
            }
            if !is_header_line(&header) {
                self.events.line_rejected(&self.path, &header);
                continue;
            }

            match self.parse_header(&header) {
                Some(mut entry) => {
                    self.accumulate_message(reader, &mut entry)?;
                    entry.reader_id = self.reader_id;
                    entry.entry_index = self.next_index;
                    self.next_index += 1;
                    return Ok(Some(entry));
                }
                None => {
                    self.events.line_rejected(&self.path, &header);
                    continue;
                }
            }
        }
    }

    fn parse_header(&self, header: &str) -> Option<LogEntry> {
        if header.len() < 24 {
            return None;
        }
        let timestamp_text = extract_timestamp(header).to_string();
        let after_date = &header[24..];

        let delimiter = self.config.delimiter as char;
        let max_splits = self.config.column_count - 1;
        let columns: Vec<&str> = splitn_char(after_date, delimiter, max_splits);
        if columns.len() < self.config.column_count {
            return None;
        }

        let level = Level::from_first_letter(columns[self.config.index_of_level]);
        let flow_id = self
            .config
            .index_of_flow_id
            .map(|i| columns[i].trim_end_matches(':').to_string())
            .filter(|s| !s.is_empty());
        let thread = self
            .config
            .index_of_thread
            .map(|i| columns[i].trim_end_matches(':').to_string())
            .filter(|s| !s.is_empty());

        let location_column = columns[self.config.index_of_location];
        let location = parse_location(location_column)?;

        let message = columns[self.config.index_of_message].to_string();

        Some(LogEntry {
            timestamp_text,
            reader_id: 0,
            entry_index: 0,
            flow_id,
            level,
            thread,
            class_name: location.class_name,
            method: location.method,
            source_file: location.source_file,
            source_line: location.source_line,
            message,
        })
    }

    /// Read continuation lines into `entry.message` until the next header
    /// line (put back) or EOF.
    fn accumulate_message<R: BufRead + Seek>(&mut self, reader: &mut R, entry: &mut LogEntry) -> io::Result<()> {
        loop {
            let pos_before = reader.stream_position()?;
            let raw = match Self::read_raw_line(reader)? {
                None => break,
                Some(line) => line,
            };
            let stripped = raw.trim_end_matches(['\n', '\r']);
            if is_header_line(stripped) {
                reader.seek(SeekFrom::Start(pos_before))?;
                break;
            }
            if !stripped.is_empty() {
                entry.message.push('\n');
                entry.message.push_str(stripped);
            }
        }
        entry.message = entry.message.trim_end().to_string();
        Ok(())
    }
}

/// Split on `delimiter`, at most `max_splits` times (`str::splitn` semantics:
/// result has at most `max_splits + 1` parts).
fn splitn_char(s: &str, delimiter: char, max_splits: usize) -> Vec<&str> {
    s.splitn(max_splits + 1, delimiter).collect()
}
