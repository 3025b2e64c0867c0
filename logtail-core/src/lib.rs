//! Core reader+parser+merge pipeline for tailing and merging multiple
//! log4j-shaped log files.

pub mod aggregator;
pub mod checkpoint;
pub mod entry;
pub mod error;
pub mod events;
pub mod file_source;
pub mod housekeeper;
pub mod parser;
pub mod positioner;
pub mod reader;

pub use aggregator::{Aggregator, FifoAggregator, OrderedAggregator};
pub use checkpoint::{CheckpointRecord, CheckpointStore};
pub use entry::{Filter, Level, LogEntry};
pub use events::{ReaderEvents, TracingEvents};
pub use file_source::FileSource;
pub use parser::{autoconfigure, ParserConfig};
pub use reader::{Reader, ReaderConfig};
