use std::collections::VecDeque;
use std::time::{Duration, Instant};

use logan_logs::{FilterModel, LogStore, StoredEntry};

/// One display frame at 60 Hz
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(16);

/// Longest a pending draw may be postponed by a sustained stream
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(100);

/// Debounce timer for draw passes.
///
/// Every arrival replaces the deadline with `now + window`, but the deadline
/// never moves past `first_pending + max_wait`.
#[derive(Clone, Debug)]
struct Coalescer {
    window: Duration,
    max_wait: Duration,
    deadline: Option<Instant>,
    first_pending: Option<Instant>,
}

impl Coalescer {
    fn new(window: Duration, max_wait: Duration) -> Self {
        Self {
            window,
            max_wait: max_wait.max(window),
            deadline: None,
            first_pending: None,
        }
    }

    fn arm(&mut self, now: Instant) {
        let first = *self.first_pending.get_or_insert(now);
        self.deadline = Some((now + self.window).min(first + self.max_wait));
    }

    fn fire_now(&mut self, now: Instant) {
        self.first_pending.get_or_insert(now);
        self.deadline = Some(now);
    }

    fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.first_pending = None;
                true
            }
            _ => false,
        }
    }
}

/// Counters for how the visible list has been maintained
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Single-entry updates from the stream
    pub incremental: u64,
    /// Whole-list recomputations
    pub rebuilds: u64,
    /// Draw passes handed out
    pub passes: u64,
}

/// Maintains the visible entry list and decides when to draw.
///
/// The visible list always equals the store filtered by the filter model, in
/// store order. Stream arrivals update it in O(1); selection changes rebuild
/// it.
#[derive(Debug)]
pub struct RenderEngine {
    visible: VecDeque<StoredEntry>,
    coalescer: Coalescer,

    /// Follow mode: keep the newest entry in view
    auto_scroll: bool,

    /// Set by a pass, consumed by the next draw
    scroll_to_newest: bool,

    stats: RenderStats,
}

impl RenderEngine {
    pub fn new(window: Duration, max_wait: Duration, auto_scroll: bool) -> Self {
        Self {
            visible: VecDeque::new(),
            coalescer: Coalescer::new(window, max_wait),
            auto_scroll,
            scroll_to_newest: auto_scroll,
            stats: RenderStats::default(),
        }
    }

    /// Incremental path for one stream arrival
    pub fn on_append(
        &mut self,
        appended: &StoredEntry,
        evicted: Option<&StoredEntry>,
        filter: &FilterModel,
        now: Instant,
    ) {
        // The evicted entry is the oldest in the store, so if it was visible it is first
        if let Some(old) = evicted {
            if self.visible.front().is_some_and(|v| v.seq == old.seq) {
                self.visible.pop_front();
            }
        }
        if filter.matches(appended) {
            self.visible.push_back(appended.clone());
        }
        self.stats.incremental += 1;
        self.coalescer.arm(now);
    }

    /// Full-rebuild path, for selection changes
    pub fn rebuild(&mut self, store: &LogStore, filter: &FilterModel, now: Instant) {
        self.visible = store.all().filter(|e| filter.matches(e)).cloned().collect();
        self.stats.rebuilds += 1;
        self.coalescer.fire_now(now);
    }

    /// Drop every visible row (the store was cleared)
    pub fn clear(&mut self, now: Instant) {
        self.visible.clear();
        self.coalescer.fire_now(now);
    }

    pub fn visible(&self) -> &VecDeque<StoredEntry> {
        &self.visible
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Index of an entry in the visible list
    pub fn position_of(&self, seq: u64) -> Option<usize> {
        // Visible entries are in arrival order, so seqs are ascending
        self.visible.binary_search_by_key(&seq, |e| e.seq).ok()
    }

    /// When the next draw should happen, if one is pending
    pub fn deadline(&self) -> Option<Instant> {
        self.coalescer.deadline
    }

    /// Ask for a draw as soon as possible (user input, status changes)
    pub fn request_render(&mut self, now: Instant) {
        self.coalescer.fire_now(now);
    }

    /// Start a draw pass if one is due. In follow mode the pass also asks the
    /// draw to pin the newest entry.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if !self.coalescer.take_due(now) {
            return false;
        }
        self.stats.passes += 1;
        if self.auto_scroll {
            self.scroll_to_newest = true;
        }
        true
    }

    /// Consumed by the draw right before it lays out rows
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_newest)
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Turning follow mode on snaps to the newest entry on the next draw
    pub fn set_auto_scroll(&mut self, enabled: bool, now: Instant) {
        self.auto_scroll = enabled;
        if enabled {
            self.scroll_to_newest = true;
            self.request_render(now);
        }
    }

    pub fn toggle_auto_scroll(&mut self, now: Instant) {
        self.set_auto_scroll(!self.auto_scroll, now);
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_WAIT, true)
    }
}
