//! Reader Loop (spec §4.E): one thread per file, driving File Source +
//! Positioner + Parser + Housekeeper, forwarding filtered entries to the
//! Aggregator.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::aggregator::Aggregator;
use crate::checkpoint::CheckpointStore;
use crate::entry::Filter;
use crate::events::{ReaderEvents, TracingEvents};
use crate::file_source::FileSource;
use crate::housekeeper::{HealthAction, Housekeeper};
use crate::parser::{autoconfigure, Parser};
use crate::positioner::{seek_tail, seek_time};

/// No-entries poll interval in follow mode (spec §4.E).
pub const NO_ENTRIES_SLEEP_INTERVAL: Duration = Duration::from_millis(100);
/// Housekeeping is attempted every this many entries within a batch, per
/// spec §4.E's `entry_count & 1023 == 0` cadence.
const HOUSEKEEPING_ENTRY_STRIDE: u64 = 1024;

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub path: PathBuf,
    pub reader_id: usize,
    pub follow: bool,
    pub tail_length: Option<u64>,
    pub filter: Filter,
    pub checkpoint_prefix: Option<String>,
}

/// Spawns and owns the OS thread for one tailed file (composition, not
/// thread inheritance, per spec §9).
pub struct Reader {
    handle: JoinHandle<()>,
}

impl Reader {
    pub fn spawn(
        config: ReaderConfig,
        aggregator: Arc<dyn Aggregator>,
        events: Arc<dyn ReaderEvents>,
    ) -> Reader {
        let handle = thread::Builder::new()
            .name(format!("logtail-reader-{}", config.reader_id))
            .spawn(move || run(config, aggregator, events))
            .expect("failed to spawn reader thread");
        Reader { handle }
    }

    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }

    /// Convenience constructor using the default `tracing`-backed events
    /// implementation.
    pub fn spawn_with_tracing(config: ReaderConfig, aggregator: Arc<dyn Aggregator>) -> Reader {
        Reader::spawn(config, aggregator, Arc::new(TracingEvents))
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            path: PathBuf::new(),
            reader_id: 0,
            follow: false,
            tail_length: None,
            filter: Filter::default(),
            checkpoint_prefix: None,
        }
    }
}

fn run(config: ReaderConfig, aggregator: Arc<dyn Aggregator>, events: Arc<dyn ReaderEvents>) {
    run_with_events(config, aggregator, events.as_ref())
}

/// Separated so tests can pass a borrowed `&dyn ReaderEvents` (e.g. the
/// recording implementation) without needing it to be `Arc`-wrapped.
pub fn run_with_events(config: ReaderConfig, aggregator: Arc<dyn Aggregator>, events: &dyn ReaderEvents) {
    let log_path_key = config.path.to_string_lossy().to_string();
    let checkpoints = config
        .checkpoint_prefix
        .as_ref()
        .map(|prefix| CheckpointStore::new(prefix.clone()));

    let mut source = match FileSource::open(&config.path) {
        Ok(s) => s,
        Err(_) => {
            // OpenFailed: propagated, this reader's thread terminates.
            aggregator.eof(config.reader_id);
            return;
        }
    };
    events.file_opened(&config.path);

    let parser_config = match autoconfigure(&mut source, &config.path) {
        Ok(c) => c,
        Err(_) => {
            // AutoconfigFailed: propagated, this reader's thread terminates.
            events.autoconfig_failed(&config.path);
            aggregator.eof(config.reader_id);
            return;
        }
    };

    let mut housekeeper = Housekeeper::new(config.path.clone(), log_path_key.clone(), checkpoints.clone());

    seek_start(&mut source, &config, checkpoints.as_ref(), &log_path_key, events);

    // One `Parser` for the reader's whole lifetime (not one per poll cycle):
    // it owns `next_index`, so `entry_index` stays monotonically increasing
    // across follow-mode batches (spec §3/§5). The parser only borrows
    // `source` for the duration of each `next_entry` call rather than
    // holding it, so `source` is free for housekeeping (which may close and
    // reopen it on rotation) between records.
    let mut parser = Parser::new(parser_config, config.path.clone(), config.reader_id, events);

    let mut entry_count_total: u64 = 0;
    loop {
        let mut had_entry = false;
        loop {
            let next = match parser.next_entry(&mut source) {
                Ok(v) => v,
                Err(_) => None,
            };
            let Some(record) = next else { break };
            had_entry = true;
            if config.filter.matches(&record) {
                aggregator.add(record);
            }
            entry_count_total += 1;
            if entry_count_total % HOUSEKEEPING_ENTRY_STRIDE == 0 {
                run_housekeeping(&mut source, &mut housekeeper, events, &config);
            }
        }

        if !config.follow {
            aggregator.eof(config.reader_id);
            break;
        }

        if !had_entry {
            thread::sleep(NO_ENTRIES_SLEEP_INTERVAL);
            run_housekeeping(&mut source, &mut housekeeper, events, &config);
        }
    }
}

fn seek_start(
    source: &mut FileSource,
    config: &ReaderConfig,
    checkpoints: Option<&CheckpointStore>,
    log_path_key: &str,
    events: &dyn ReaderEvents,
) {
    if let Some(store) = checkpoints {
        match store.load(log_path_key) {
            Ok(record) => {
                if source.seek(record.position).is_ok() {
                    events.checkpoint_resumed(&config.path, record.position);
                    return;
                }
            }
            Err(_) => {
                events.checkpoint_read_failed(&config.path);
            }
        }
    }

    match config.tail_length {
        Some(0) => {
            let _ = source.seek(source.size().unwrap_or(0));
        }
        Some(n) => {
            let _ = seek_tail(source, n);
        }
        None => {
            if let Some(from) = &config.filter.time_from {
                let _ = seek_time(source, from);
            }
        }
    }
}

fn run_housekeeping(
    source: &mut FileSource,
    housekeeper: &mut Housekeeper,
    events: &dyn ReaderEvents,
    config: &ReaderConfig,
) {
    let identity = source.identity();
    let position = source.tell().unwrap_or(0);
    let is_gzip = source.is_gzip();

    if let Some(action) = housekeeper.maybe_check_health(Instant::now(), identity, position, is_gzip) {
        match action {
            HealthAction::Noop => {}
            HealthAction::Removed => events.file_removed(&config.path),
            HealthAction::Rotated => {
                events.file_rotated(&config.path);
                if let Ok(new_source) = FileSource::open(&config.path) {
                    *source = new_source;
                }
            }
            HealthAction::Truncated => {
                events.file_truncated(&config.path);
                let _ = source.seek(0);
            }
        }
    }

    let identity = source.identity();
    let position = source.tell().unwrap_or(0);
    let size = source.size().unwrap_or(position);
    housekeeper.maybe_save_progress(Instant::now(), events, identity, position, size);
}
