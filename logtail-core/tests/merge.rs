//! End-to-end scenario from spec §8 #7: two readers, interleaved
//! timestamps, ordered aggregator yields them in timestamp order; FIFO
//! aggregator yields them in arrival (here: reader-start) order.

use std::sync::Arc;
use std::time::Duration;

use logtail_core::aggregator::{Aggregator, OrderedAggregator};
use logtail_core::entry::Filter;
use logtail_core::reader::{Reader, ReaderConfig};

fn write_log(dir: &std::path::Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("")).unwrap();
    path
}

#[test]
fn ordered_aggregator_merges_two_readers_by_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = write_log(
        dir.path(),
        "a.log",
        &[
            "2000-01-01 00:00:00,000 - INFO T C.m(C.java:1): first\n",
            "2000-01-01 00:00:00,002 - INFO T C.m(C.java:1): third\n",
        ],
    );
    let path_b = write_log(
        dir.path(),
        "b.log",
        &["2000-01-01 00:00:00,001 - INFO T C.m(C.java:1): second\n"],
    );

    let aggregator: Arc<dyn Aggregator> = Arc::new(OrderedAggregator::new(2));

    let reader_a = Reader::spawn_with_tracing(
        ReaderConfig {
            path: path_a,
            reader_id: 0,
            follow: false,
            tail_length: None,
            filter: Filter::default(),
            checkpoint_prefix: None,
        },
        aggregator.clone(),
    );
    let reader_b = Reader::spawn_with_tracing(
        ReaderConfig {
            path: path_b,
            reader_id: 1,
            follow: false,
            tail_length: None,
            filter: Filter::default(),
            checkpoint_prefix: None,
        },
        aggregator.clone(),
    );

    reader_a.join().unwrap();
    reader_b.join().unwrap();

    let mut messages = Vec::new();
    while let Some(e) = aggregator.drain_one(Duration::from_millis(10)) {
        messages.push(e.message);
    }

    assert_eq!(messages, vec!["first", "second", "third"]);
}
