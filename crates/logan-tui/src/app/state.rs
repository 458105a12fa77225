use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

use logan_logs::{
    ConnectionState, EmptySelection, FilterModel, LogEntry, LogStore, LogType, StreamEvent,
    TypeCounts,
};

use super::detail::{ClickTarget, DetailPanel};
use super::render::{DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_WAIT, RenderEngine};

/// Knobs for a viewing session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Stream endpoint, shown in the header
    pub source: String,
    pub max_logs: usize,
    pub empty_selection: EmptySelection,
    pub coalesce_window: Duration,
    pub max_wait: Duration,
    pub auto_scroll: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            max_logs: logan_logs::DEFAULT_MAX_LOGS,
            empty_selection: EmptySelection::MatchAll,
            coalesce_window: DEFAULT_COALESCE_WINDOW,
            max_wait: DEFAULT_MAX_WAIT,
            auto_scroll: true,
        }
    }
}

/// A row of the filter panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterRow {
    Type(LogType),
    Namespace(String),
}

/// Filter panel overlay state
#[derive(Clone, Debug, Default)]
pub struct FilterPanelState {
    pub visible: bool,

    /// Index into the current rows
    pub selection: usize,

    /// Namespace search text
    pub search: String,

    /// Search input has focus
    pub search_active: bool,
}

impl FilterPanelState {
    /// Rows to show: every type, then the namespaces matching the search
    pub fn rows(&self, filter: &FilterModel) -> Vec<FilterRow> {
        let search = self.search.to_lowercase();
        LogType::ALL
            .into_iter()
            .map(FilterRow::Type)
            .chain(
                filter
                    .namespaces()
                    .filter(|ns| search.is_empty() || ns.to_lowercase().contains(&search))
                    .map(|ns| FilterRow::Namespace(ns.to_string())),
            )
            .collect()
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Is help overlay visible?
    pub help_visible: bool,

    pub filter_panel: FilterPanelState,

    /// First visible entry index in the log view
    pub log_scroll: usize,

    /// Entry under the keyboard cursor (None = newest)
    pub cursor: Option<u64>,

    /// Scroll the cursor into view on the next draw
    pub follow_cursor: bool,

    /// Show timestamps in log viewer?
    pub show_timestamps: bool,

    /// Show namespaces in log viewer?
    pub show_namespaces: bool,

    /// Show statistics bar?
    pub stats_visible: bool,

    /// Message to display (if any)
    pub notice: Option<String>,

    /// What each log row of the last draw showed, top to bottom
    pub row_targets: Vec<ClickTarget>,

    /// Screen row of the first entry in `row_targets`
    pub rows_top: u16,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            help_visible: false,
            filter_panel: FilterPanelState::default(),
            log_scroll: 0,
            cursor: None,
            follow_cursor: false,
            show_timestamps: true,
            show_namespaces: true,
            stats_visible: false,
            notice: None,
            row_targets: Vec::new(),
            rows_top: 0,
        }
    }
}

impl UiState {
    /// Map a screen row from the last draw to what it showed
    pub fn target_at(&self, row: u16) -> ClickTarget {
        row.checked_sub(self.rows_top)
            .and_then(|offset| self.row_targets.get(offset as usize))
            .copied()
            .unwrap_or(ClickTarget::Empty)
    }
}

/// Everything a viewing session owns, passed explicitly to whoever needs it
pub struct Session {
    pub source: String,
    pub store: LogStore,
    pub filter: FilterModel,
    pub engine: RenderEngine,
    pub detail: DetailPanel,
    pub ui: UiState,
    pub connection: ConnectionState,
    pub should_quit: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            source: config.source,
            store: LogStore::new(config.max_logs),
            filter: FilterModel::new(config.empty_selection),
            engine: RenderEngine::new(config.coalesce_window, config.max_wait, config.auto_scroll),
            detail: DetailPanel::new(),
            ui: UiState::default(),
            connection: ConnectionState::Disconnected,
            should_quit: false,
        }
    }

    /// Apply one event from the connection
    pub fn handle_stream_event(&mut self, event: StreamEvent, now: Instant) {
        match event {
            StreamEvent::Entry(entry) => self.ingest(entry, now),
            StreamEvent::Status(state) => {
                if state != self.connection {
                    debug!(state = %state.label(), "connection state changed");
                }
                self.connection = state;
                self.engine.request_render(now);
            }
        }
    }

    /// Store a new entry and update the view incrementally
    pub fn ingest(&mut self, entry: LogEntry, now: Instant) {
        self.filter.register(&entry.namespace);
        let (stored, evicted) = self.store.append(entry);
        if let Some(old) = &evicted {
            self.detail.forget(old.seq);
            if self.ui.cursor == Some(old.seq) {
                self.ui.cursor = None;
            }
            // The evicted entry is the oldest, so if visible it is the first row
            if self.engine.visible().front().is_some_and(|e| e.seq == old.seq) {
                self.ui.log_scroll = self.ui.log_scroll.saturating_sub(1);
            }
        }
        self.engine
            .on_append(&stored, evicted.as_ref(), &self.filter, now);
    }

    pub fn set_types<I>(&mut self, types: I, now: Instant)
    where
        I: IntoIterator<Item = LogType>,
    {
        self.filter.set_types(types);
        self.refilter(now);
    }

    pub fn set_namespaces<I, S>(&mut self, namespaces: I, now: Instant)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.set_namespaces(namespaces);
        self.refilter(now);
    }

    /// "Select all": back to matching everything
    pub fn select_all(&mut self, now: Instant) {
        self.filter.reset_to_all();
        self.refilter(now);
    }

    /// Flip one filter panel row, keeping the empty-means-all representation
    pub fn toggle_filter_row(&mut self, row: &FilterRow, now: Instant) {
        let policy = self.filter.policy();
        match row {
            FilterRow::Type(log_type) => {
                let types = toggled(
                    self.filter.selected_types(),
                    LogType::ALL.into_iter(),
                    *log_type,
                    policy,
                );
                self.set_types(types, now);
            }
            FilterRow::Namespace(ns) => {
                let universe: Vec<String> = self.filter.namespaces().map(str::to_string).collect();
                let namespaces = toggled(
                    self.filter.selected_namespaces(),
                    universe.into_iter(),
                    ns.clone(),
                    policy,
                );
                self.set_namespaces(namespaces, now);
            }
        }
    }

    /// Drop every stored entry and every visible row
    pub fn clear_logs(&mut self, now: Instant) {
        self.store.clear();
        self.engine.clear(now);
        self.detail.collapse();
        self.ui.cursor = None;
        self.ui.log_scroll = 0;
    }

    pub fn toggle_auto_scroll(&mut self, now: Instant) {
        self.engine.toggle_auto_scroll(now);
        if self.engine.auto_scroll() {
            self.ui.cursor = None;
        }
    }

    /// Toggle details of the entry under the cursor
    pub fn toggle_detail_at_cursor(&mut self, now: Instant) {
        if let Some(seq) = self.cursor_seq() {
            self.detail.toggle(seq);
            self.engine.request_render(now);
        }
    }

    /// Handle a click on a log row
    pub fn click(&mut self, target: ClickTarget, now: Instant) {
        if let ClickTarget::Entry(seq) = target {
            self.ui.cursor = Some(seq);
        }
        if self.detail.click(target) {
            self.engine.request_render(now);
        }
    }

    /// Entry under the cursor, defaulting to the newest visible one
    pub fn cursor_seq(&self) -> Option<u64> {
        match self.ui.cursor {
            Some(seq) if self.engine.position_of(seq).is_some() => Some(seq),
            _ => self.engine.visible().back().map(|e| e.seq),
        }
    }

    /// Move the cursor by `delta` entries; leaves follow mode
    pub fn move_cursor(&mut self, delta: isize, now: Instant) {
        let len = self.engine.visible_len();
        if len == 0 {
            return;
        }
        let current = self
            .cursor_seq()
            .and_then(|seq| self.engine.position_of(seq))
            .unwrap_or(len - 1);
        let target = current.saturating_add_signed(delta).min(len - 1);
        self.ui.cursor = self.engine.visible().get(target).map(|e| e.seq);
        self.ui.follow_cursor = true;
        self.engine.set_auto_scroll(false, now);
        self.engine.request_render(now);
    }

    pub fn cursor_to_top(&mut self, now: Instant) {
        self.move_cursor(isize::MIN, now);
    }

    pub fn cursor_to_bottom(&mut self, now: Instant) {
        self.move_cursor(isize::MAX, now);
    }

    /// Scroll the viewport without moving the cursor; leaves follow mode
    pub fn scroll_by(&mut self, delta: isize, now: Instant) {
        let max = self.engine.visible_len().saturating_sub(1);
        self.ui.log_scroll = self.ui.log_scroll.saturating_add_signed(delta).min(max);
        self.engine.set_auto_scroll(false, now);
        self.engine.request_render(now);
    }

    pub fn type_counts(&self) -> TypeCounts {
        self.store.type_counts()
    }

    fn refilter(&mut self, now: Instant) {
        self.engine.rebuild(&self.store, &self.filter, now);
        if self.ui.log_scroll >= self.engine.visible_len() {
            self.ui.log_scroll = self.engine.visible_len().saturating_sub(1);
        }
    }
}

/// Toggle `item` in an explicit selection derived from `current`.
///
/// Under match-all, an empty selection stands for the whole universe, and a
/// selection that covers the whole universe is stored as empty again.
fn toggled<T, I>(current: &HashSet<T>, universe: I, item: T, policy: EmptySelection) -> HashSet<T>
where
    T: Eq + Hash + Clone,
    I: Iterator<Item = T>,
{
    let universe: HashSet<T> = universe.collect();
    let mut selection = if current.is_empty() && policy == EmptySelection::MatchAll {
        universe.clone()
    } else {
        current.clone()
    };

    if !selection.remove(&item) {
        selection.insert(item);
    }

    if policy == EmptySelection::MatchAll && universe.is_subset(&selection) {
        selection.clear();
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max_logs: usize) -> Session {
        Session::new(SessionConfig {
            max_logs,
            ..Default::default()
        })
    }

    fn visible_messages(session: &Session) -> Vec<String> {
        session
            .engine
            .visible()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    #[test]
    fn test_heartbeat_frames_leave_session_untouched() {
        let mut session = session(10);
        let now = Instant::now();
        let mut sse = logan_logs::SseDecoder::new();
        let payloads = sse.push(b"data: {\"type\":\"heartbeat\"}\n\ndata: {\"type\":\"heartbeat\"}\n\n");
        assert_eq!(payloads.len(), 2);

        for payload in &payloads {
            if let Some(entry) = logan_logs::dispatch(payload) {
                session.handle_stream_event(StreamEvent::Entry(entry), now);
            }
        }
        assert!(session.store.is_empty());
        assert_eq!(session.engine.stats().incremental, 0);
        assert!(!session.engine.take_due(now));
    }

    #[test]
    fn test_status_event_updates_connection() {
        let mut session = session(10);
        let now = Instant::now();
        session.handle_stream_event(StreamEvent::Status(ConnectionState::Failed), now);
        assert_eq!(session.connection, ConnectionState::Failed);
        assert!(session.engine.take_due(now));
    }

    #[test]
    fn test_eviction_collapses_expanded_entry() {
        let mut session = session(2);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Info, "global", "a"), now);
        session.ingest(LogEntry::new(LogType::Info, "global", "b"), now);

        let first = session.engine.visible()[0].seq;
        session.click(ClickTarget::Entry(first), now);
        assert_eq!(session.detail.expanded(), Some(first));

        session.ingest(LogEntry::new(LogType::Info, "global", "c"), now);
        assert_eq!(session.detail.expanded(), None);
        assert_eq!(visible_messages(&session), vec!["b", "c"]);
    }

    #[test]
    fn test_universe_keeps_namespace_after_eviction() {
        let mut session = session(2);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Info, "app", "a"), now);
        session.ingest(LogEntry::new(LogType::Info, "global", "b"), now);
        session.ingest(LogEntry::new(LogType::Info, "global", "c"), now);

        assert!(session.store.all().all(|e| e.namespace != "app"));
        assert!(session.filter.namespaces().any(|ns| ns == "app"));
        assert_eq!(visible_messages(&session), vec!["b", "c"]);
    }

    #[test]
    fn test_eviction_shifts_scroll_only_for_visible_entries() {
        let mut session = session(2);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Debug, "global", "hidden"), now);
        session.ingest(LogEntry::new(LogType::Info, "global", "a"), now);
        session.set_types([LogType::Info], now);
        session.ui.log_scroll = 1;

        // Evicts the hidden entry: the viewport stays put
        session.ingest(LogEntry::new(LogType::Info, "global", "b"), now);
        assert_eq!(session.ui.log_scroll, 1);

        // Evicts "a", the first visible row
        session.ingest(LogEntry::new(LogType::Info, "global", "c"), now);
        assert_eq!(session.ui.log_scroll, 0);
        assert_eq!(visible_messages(&session), vec!["b", "c"]);
    }

    #[test]
    fn test_clear_empties_store_view_and_expansion() {
        let mut session = session(5);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Error, "app", "a"), now);
        session.toggle_detail_at_cursor(now);
        assert!(session.detail.expanded().is_some());

        session.clear_logs(now);
        assert!(session.store.is_empty());
        assert_eq!(session.engine.visible_len(), 0);
        assert!(session.detail.expanded().is_none());
        // Namespaces survive a clear
        assert!(session.filter.namespaces().any(|ns| ns == "app"));
    }

    #[test]
    fn test_toggle_type_row_from_implicit_all() {
        let mut session = session(10);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Info, "global", "i"), now);
        session.ingest(LogEntry::new(LogType::Debug, "global", "d"), now);

        session.toggle_filter_row(&FilterRow::Type(LogType::Debug), now);
        assert_eq!(session.filter.selected_types().len(), 3);
        assert_eq!(visible_messages(&session), vec!["i"]);

        session.toggle_filter_row(&FilterRow::Type(LogType::Debug), now);
        assert!(session.filter.selected_types().is_empty());
        assert_eq!(visible_messages(&session), vec!["i", "d"]);
    }

    #[test]
    fn test_new_namespace_shows_despite_narrowed_selection() {
        let mut session = session(10);
        let now = Instant::now();
        session.ingest(LogEntry::new(LogType::Info, "app", "a"), now);
        session.ingest(LogEntry::new(LogType::Info, "db", "b"), now);
        session.set_namespaces(["app"], now);
        assert_eq!(visible_messages(&session), vec!["a"]);

        session.ingest(LogEntry::new(LogType::Info, "cache", "c"), now);
        assert_eq!(visible_messages(&session), vec!["a", "c"]);

        session.select_all(now);
        assert_eq!(visible_messages(&session), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cursor_movement_leaves_follow_mode() {
        let mut session = session(10);
        let now = Instant::now();
        for m in ["a", "b", "c"] {
            session.ingest(LogEntry::new(LogType::Info, "global", m), now);
        }
        assert!(session.engine.auto_scroll());

        session.move_cursor(-1, now);
        assert!(!session.engine.auto_scroll());
        let seq = session.cursor_seq().unwrap();
        assert_eq!(session.store.get(seq).unwrap().message, "b");

        session.cursor_to_top(now);
        let seq = session.cursor_seq().unwrap();
        assert_eq!(session.store.get(seq).unwrap().message, "a");

        session.toggle_auto_scroll(now);
        assert!(session.engine.auto_scroll());
        assert_eq!(session.ui.cursor, None);
    }

    #[test]
    fn test_target_at_maps_rows() {
        let mut ui = UiState::default();
        ui.rows_top = 4;
        ui.row_targets = vec![ClickTarget::Entry(1), ClickTarget::Detail(1)];
        assert_eq!(ui.target_at(4), ClickTarget::Entry(1));
        assert_eq!(ui.target_at(5), ClickTarget::Detail(1));
        assert_eq!(ui.target_at(6), ClickTarget::Empty);
        assert_eq!(ui.target_at(0), ClickTarget::Empty);
    }
}
