//! Aggregator (spec §4.G): merges entries from N readers either in
//! timestamp order (heap, strict merge) or arrival order (FIFO).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::entry::LogEntry;

/// Shared interface both aggregator variants implement. Safe under
/// concurrent access from N producers and one consumer (spec §5).
pub trait Aggregator: Send + Sync {
    fn add(&self, entry: LogEntry);
    fn eof(&self, reader_id: usize);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Blocking pop of the next entry in this aggregator's delivery order.
    /// Returns `None` once the aggregator is drained and every reader has
    /// signalled EOF.
    fn drain_one(&self, poll_interval: Duration) -> Option<LogEntry>;
}

struct OrderedState {
    heap: BinaryHeap<Reverse<LogEntry>>,
    open_readers: HashSet<usize>,
    /// Count of each open reader's entries currently sitting in the heap,
    /// unpopped. A reader with zero here has not yet contributed anything
    /// since its last pop (or ever) and is still open -- the min of the
    /// heap is not safe to emit until every open reader has a positive
    /// count, since that reader could still push something smaller.
    pending_per_reader: HashMap<usize, usize>,
}

impl OrderedState {
    /// True once no open reader is missing a contribution, i.e. popping the
    /// current heap minimum (if any) cannot be overtaken by a still-pending
    /// entry from another open reader.
    fn safe_to_pop(&self) -> bool {
        self.open_readers
            .iter()
            .all(|r| self.pending_per_reader.get(r).copied().unwrap_or(0) > 0)
    }
}

/// Min-heap keyed by the spec §3 total order. Implements the strict-merge
/// variant spec §4.G calls out as preferred over the legacy source's
/// best-effort pop-whenever-non-empty behavior: `drain_one` blocks until
/// every currently open reader has at least one entry sitting in the heap
/// (so none of them can still deliver something smaller than the current
/// minimum) or has signalled EOF, then pops the minimum.
pub struct OrderedAggregator {
    state: Mutex<OrderedState>,
    not_empty: Condvar,
}

impl OrderedAggregator {
    pub fn new(reader_count: usize) -> Self {
        OrderedAggregator {
            state: Mutex::new(OrderedState {
                heap: BinaryHeap::new(),
                open_readers: (0..reader_count).collect(),
                pending_per_reader: HashMap::new(),
            }),
            not_empty: Condvar::new(),
        }
    }
}

impl Aggregator for OrderedAggregator {
    fn add(&self, entry: LogEntry) {
        let mut state = self.state.lock().unwrap();
        *state.pending_per_reader.entry(entry.reader_id).or_insert(0) += 1;
        state.heap.push(Reverse(entry));
        self.not_empty.notify_all();
    }

    fn eof(&self, reader_id: usize) {
        let mut state = self.state.lock().unwrap();
        state.open_readers.remove(&reader_id);
        self.not_empty.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap().heap.len()
    }

    fn drain_one(&self, poll_interval: Duration) -> Option<LogEntry> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.safe_to_pop() {
                if let Some(Reverse(entry)) = state.heap.pop() {
                    if let Some(count) = state.pending_per_reader.get_mut(&entry.reader_id) {
                        *count -= 1;
                    }
                    return Some(entry);
                }
            }
            if state.open_readers.is_empty() && state.heap.is_empty() {
                return None;
            }
            let (next_state, _) = self.not_empty.wait_timeout(state, poll_interval).unwrap();
            state = next_state;
        }
    }
}

struct FifoState {
    queue: VecDeque<LogEntry>,
    open_readers: HashSet<usize>,
}

/// Deque; `drain_one` pops front in arrival order regardless of open-reader
/// set, blocking only while producers may still add more.
pub struct FifoAggregator {
    state: Mutex<FifoState>,
    not_empty: Condvar,
}

impl FifoAggregator {
    pub fn new(reader_count: usize) -> Self {
        FifoAggregator {
            state: Mutex::new(FifoState {
                queue: VecDeque::new(),
                open_readers: (0..reader_count).collect(),
            }),
            not_empty: Condvar::new(),
        }
    }

    /// Pop up to `max` entries at once, for the Redis shipper's bounded
    /// drain (spec §9: "take `min(MAX_CHUNK_SIZE, len)` by slicing the
    /// drain iterator").
    pub fn drain_up_to(&self, max: usize) -> Vec<LogEntry> {
        let mut state = self.state.lock().unwrap();
        let n = max.min(state.queue.len());
        state.queue.drain(..n).collect()
    }
}

impl Aggregator for FifoAggregator {
    fn add(&self, entry: LogEntry) {
        let mut state = self.state.lock().unwrap();
        state.queue.push_back(entry);
        self.not_empty.notify_all();
    }

    fn eof(&self, reader_id: usize) {
        let mut state = self.state.lock().unwrap();
        state.open_readers.remove(&reader_id);
        self.not_empty.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    fn drain_one(&self, poll_interval: Duration) -> Option<LogEntry> {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(entry) = state.queue.pop_front() {
                return Some(entry);
            }
            if state.open_readers.is_empty() {
                return None;
            }
            let (next_state, _) = self.not_empty.wait_timeout(state, poll_interval).unwrap();
            state = next_state;
        }
    }
}
