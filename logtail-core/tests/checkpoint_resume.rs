//! End-to-end checkpoint round-trip (spec §8): a reader that exits
//! mid-file with checkpointing enabled resumes from its saved position on
//! a second run rather than re-emitting earlier entries.

use std::sync::Arc;
use std::time::Duration;

use logtail_core::aggregator::{Aggregator, FifoAggregator};
use logtail_core::checkpoint::CheckpointStore;
use logtail_core::entry::Filter;
use logtail_core::reader::{Reader, ReaderConfig};

fn drain_all(aggregator: &dyn Aggregator) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(e) = aggregator.drain_one(Duration::from_millis(10)) {
        out.push(e.message);
    }
    out
}

#[test]
fn resumes_from_saved_checkpoint_on_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.log");
    std::fs::write(
        &path,
        "2000-01-01 00:00:00,000 - INFO T C.m(C.java:1): one\n\
2000-01-01 00:00:00,001 - INFO T C.m(C.java:1): two\n",
    )
    .unwrap();

    let checkpoint_prefix = dir.path().join("sincedb-").to_string_lossy().to_string();
    let log_key = path.to_string_lossy().to_string();

    // First run: no checkpoint yet, reads both lines, then we hand-write
    // a checkpoint as if the housekeeper had saved progress after the
    // first line (simulating a restart mid-file).
    let aggregator: Arc<dyn Aggregator> = Arc::new(FifoAggregator::new(1));
    let config = ReaderConfig {
        path: path.clone(),
        reader_id: 0,
        follow: false,
        tail_length: None,
        filter: Filter::default(),
        checkpoint_prefix: Some(checkpoint_prefix.clone()),
    };
    Reader::spawn_with_tracing(config.clone(), aggregator.clone())
        .join()
        .unwrap();
    assert_eq!(drain_all(aggregator.as_ref()), vec!["one", "two"]);

    // Simulate a checkpoint left after the first record only.
    let store = CheckpointStore::new(checkpoint_prefix.clone());
    let first_line_len = "2000-01-01 00:00:00,000 - INFO T C.m(C.java:1): one\n".len() as u64;
    let identity = {
        use logtail_core::entry::FileIdentity;
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let meta = std::fs::metadata(&path).unwrap();
            FileIdentity::new(meta.dev(), meta.ino())
        }
        #[cfg(not(unix))]
        {
            FileIdentity::new(0, 0)
        }
    };
    store
        .save(
            &log_key,
            &logtail_core::checkpoint::CheckpointRecord {
                path: log_key.clone(),
                identity,
                position: first_line_len,
                size: std::fs::metadata(&path).unwrap().len(),
            },
        )
        .unwrap();

    // Second run picks up the checkpoint and only re-emits "two".
    let aggregator2: Arc<dyn Aggregator> = Arc::new(FifoAggregator::new(1));
    Reader::spawn_with_tracing(config, aggregator2.clone())
        .join()
        .unwrap();
    assert_eq!(drain_all(aggregator2.as_ref()), vec!["two"]);
}
