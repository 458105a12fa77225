use std::collections::VecDeque;
use std::sync::Arc;

use logan_types::{LogEntry, LogType};

/// Default capacity of the log store
pub const DEFAULT_MAX_LOGS: usize = 1000;

/// An entry held by the store, tagged with its arrival sequence number.
///
/// Cloning is cheap (the entry itself is behind an `Arc`), so the view can
/// keep its own copies without borrowing from the store.
#[derive(Clone, Debug)]
pub struct StoredEntry {
    /// Session-unique arrival number, stable across evictions
    pub seq: u64,
    pub entry: Arc<LogEntry>,
}

impl std::ops::Deref for StoredEntry {
    type Target = LogEntry;

    fn deref(&self) -> &LogEntry {
        &self.entry
    }
}

/// Capacity-bounded FIFO of log entries in arrival order
#[derive(Debug)]
pub struct LogStore {
    entries: VecDeque<StoredEntry>,

    /// Maximum capacity
    capacity: usize,

    /// Sequence number handed to the next appended entry
    next_seq: u64,

    /// Per-type counts, maintained on append/evict
    counts: TypeCounts,
}

impl LogStore {
    /// Create a new store with the given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 0,
            counts: TypeCounts::default(),
        }
    }

    /// Append an entry, returning the evicted oldest entry if over capacity
    pub fn append(&mut self, entry: LogEntry) -> (StoredEntry, Option<StoredEntry>) {
        let stored = StoredEntry {
            seq: self.next_seq,
            entry: Arc::new(entry),
        };
        self.next_seq += 1;
        self.counts.increment(stored.log_type);
        self.entries.push_back(stored.clone());

        let evicted = if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        if let Some(old) = &evicted {
            self.counts.decrement(old.log_type);
        }

        (stored, evicted)
    }

    /// Remove every entry. Sequence numbers keep increasing afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts = TypeCounts::default();
    }

    /// All entries in arrival order
    pub fn all(&self) -> impl Iterator<Item = &StoredEntry> + '_ {
        self.entries.iter()
    }

    /// Look up an entry by sequence number
    pub fn get(&self, seq: u64) -> Option<&StoredEntry> {
        // Seqs are contiguous within the store, so this is an index lookup
        let first = self.entries.front()?.seq;
        let idx = usize::try_from(seq.checked_sub(first)?).ok()?;
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry count per type (O(1))
    pub fn type_counts(&self) -> TypeCounts {
        self.counts.clone()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOGS)
    }
}

/// Counts per log type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub debug: usize,
}

impl TypeCounts {
    pub fn total(&self) -> usize {
        self.info + self.warning + self.error + self.debug
    }

    pub fn get(&self, log_type: LogType) -> usize {
        match log_type {
            LogType::Info => self.info,
            LogType::Warning => self.warning,
            LogType::Error => self.error,
            LogType::Debug => self.debug,
        }
    }

    fn slot(&mut self, log_type: LogType) -> &mut usize {
        match log_type {
            LogType::Info => &mut self.info,
            LogType::Warning => &mut self.warning,
            LogType::Error => &mut self.error,
            LogType::Debug => &mut self.debug,
        }
    }

    fn increment(&mut self, log_type: LogType) {
        *self.slot(log_type) += 1;
    }

    fn decrement(&mut self, log_type: LogType) {
        let slot = self.slot(log_type);
        *slot = slot.saturating_sub(1);
    }
}
