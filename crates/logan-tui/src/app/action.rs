/// All possible actions in the application (command pattern)
#[derive(Clone, Debug)]
pub enum Action {
    Quit,
    GoBack,

    // UI toggles
    ToggleHelp,
    ToggleFilterPanel,

    // Filter panel
    FilterUp,
    FilterDown,
    FilterToggle,
    FilterSelectAll,
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,

    // Log viewer
    CursorUp(usize),
    CursorDown(usize),
    CursorToTop,
    CursorToBottom,
    PageUp,
    PageDown,
    ScrollUp(usize),
    ScrollDown(usize),
    ToggleDetail,
    ToggleAutoScroll,
    ToggleTimestamps,
    ToggleNamespaces,
    ToggleStats,
    ClearLogs,

    // Mouse click at a screen row
    Click(u16),

    // Connection
    Reconnect,

    // Notices
    ShowNotice(String),

    // Render request
    Render,
}
