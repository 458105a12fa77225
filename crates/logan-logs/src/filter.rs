use std::collections::{BTreeSet, HashSet};

use logan_types::{DEFAULT_NAMESPACE, LogEntry, LogType};
use tracing::debug;

/// Which selection a change applies to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    Type,
    Namespace,
}

/// Meaning of a selection with nothing in it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmptySelection {
    /// An empty selection is "no filter"
    #[default]
    MatchAll,
    /// An empty selection shows nothing
    MatchNone,
}

impl EmptySelection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" | "match_all" | "everything" => Some(Self::MatchAll),
            "none" | "match_none" | "nothing" => Some(Self::MatchNone),
            _ => None,
        }
    }
}

/// Namespace universe plus the user's type/namespace selections
#[derive(Clone, Debug)]
pub struct FilterModel {
    /// Every namespace seen this session (never shrinks)
    namespaces: BTreeSet<String>,

    /// Types to include (empty = see `policy`)
    types: HashSet<LogType>,

    /// Namespaces to include (empty = see `policy`)
    selected_namespaces: HashSet<String>,

    policy: EmptySelection,
}

impl FilterModel {
    pub fn new(policy: EmptySelection) -> Self {
        let mut namespaces = BTreeSet::new();
        namespaces.insert(DEFAULT_NAMESPACE.to_string());
        Self {
            namespaces,
            types: HashSet::new(),
            selected_namespaces: HashSet::new(),
            policy,
        }
    }

    /// Record a namespace. Returns true if it was not known before.
    ///
    /// A new namespace is force-selected whenever the namespace selection is
    /// explicit, so a narrowed view never silently hides a brand-new source.
    /// An implicit "all" selection stays implicit.
    pub fn register(&mut self, namespace: &str) -> bool {
        if self.namespaces.contains(namespace) {
            return false;
        }
        self.namespaces.insert(namespace.to_string());

        let implicit_all =
            self.selected_namespaces.is_empty() && self.policy == EmptySelection::MatchAll;
        if !implicit_all {
            self.selected_namespaces.insert(namespace.to_string());
        }
        true
    }

    /// Replace the type selection
    pub fn set_types<I>(&mut self, types: I)
    where
        I: IntoIterator<Item = LogType>,
    {
        self.types = types.into_iter().collect();
    }

    /// Replace the namespace selection
    pub fn set_namespaces<I, S>(&mut self, namespaces: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_namespaces = namespaces.into_iter().map(Into::into).collect();
    }

    /// Replace the selection of the given kind from string values.
    ///
    /// Unknown type tags are skipped. If every given tag is unknown the type
    /// selection is left as it was, since an empty one would widen the filter.
    pub fn set_selection<I, S>(&mut self, kind: SelectionKind, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match kind {
            SelectionKind::Type => {
                let mut given = 0usize;
                let types: Vec<LogType> = values
                    .into_iter()
                    .filter_map(|v| {
                        given += 1;
                        let parsed = LogType::parse(v.as_ref());
                        if parsed.is_none() {
                            debug!(tag = v.as_ref(), "ignoring unknown log type");
                        }
                        parsed
                    })
                    .collect();
                if given > 0 && types.is_empty() {
                    debug!("no known log types given, keeping type selection");
                    return;
                }
                self.set_types(types)
            }
            SelectionKind::Namespace => {
                self.set_namespaces(values.into_iter().map(|v| v.as_ref().to_string()))
            }
        }
    }

    /// Select every type and every known namespace.
    ///
    /// Under `MatchAll` that is the empty representation; under `MatchNone`
    /// the selections have to be spelled out.
    pub fn reset_to_all(&mut self) {
        match self.policy {
            EmptySelection::MatchAll => {
                self.types.clear();
                self.selected_namespaces.clear();
            }
            EmptySelection::MatchNone => {
                self.types = LogType::ALL.into_iter().collect();
                self.selected_namespaces = self.namespaces.iter().cloned().collect();
            }
        }
    }

    /// Check if a log entry passes the current selections
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.type_passes(entry.log_type) && self.namespace_passes(&entry.namespace)
    }

    fn type_passes(&self, log_type: LogType) -> bool {
        if self.types.is_empty() {
            return self.policy == EmptySelection::MatchAll;
        }
        self.types.contains(&log_type)
    }

    fn namespace_passes(&self, namespace: &str) -> bool {
        if self.selected_namespaces.is_empty() {
            return self.policy == EmptySelection::MatchAll;
        }
        self.selected_namespaces.contains(namespace)
    }

    /// Effective checkbox state for a type
    pub fn is_type_selected(&self, log_type: LogType) -> bool {
        self.type_passes(log_type)
    }

    /// Effective checkbox state for a namespace
    pub fn is_namespace_selected(&self, namespace: &str) -> bool {
        self.namespace_passes(namespace)
    }

    /// Namespace universe, sorted
    pub fn namespaces(&self) -> impl Iterator<Item = &str> + '_ {
        self.namespaces.iter().map(String::as_str)
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn selected_types(&self) -> &HashSet<LogType> {
        &self.types
    }

    pub fn selected_namespaces(&self) -> &HashSet<String> {
        &self.selected_namespaces
    }

    /// Whether anything could be hidden by the current selections
    pub fn is_filtering(&self) -> bool {
        match self.policy {
            EmptySelection::MatchAll => {
                !self.types.is_empty() || !self.selected_namespaces.is_empty()
            }
            EmptySelection::MatchNone => true,
        }
    }

    pub fn policy(&self) -> EmptySelection {
        self.policy
    }
}

impl Default for FilterModel {
    fn default() -> Self {
        Self::new(EmptySelection::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(log_type: LogType, namespace: &str) -> LogEntry {
        LogEntry::new(log_type, namespace, "test")
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let filter = FilterModel::default();
        for t in LogType::ALL {
            assert!(filter.matches(&entry(t, "anything")));
        }
        assert!(!filter.is_filtering());
    }

    #[test]
    fn test_match_none_policy() {
        let mut filter = FilterModel::new(EmptySelection::MatchNone);
        assert!(!filter.matches(&entry(LogType::Info, "global")));

        filter.set_types(LogType::ALL);
        filter.set_namespaces(["global"]);
        assert!(filter.matches(&entry(LogType::Info, "global")));
    }

    #[test]
    fn test_type_and_namespace_are_conjunctive() {
        let mut filter = FilterModel::default();
        filter.set_selection(SelectionKind::Type, ["error"]);
        filter.set_selection(SelectionKind::Namespace, ["app"]);

        assert!(filter.matches(&entry(LogType::Error, "app")));
        assert!(!filter.matches(&entry(LogType::Error, "db")));
        assert!(!filter.matches(&entry(LogType::Info, "app")));
    }

    #[test]
    fn test_register_keeps_implicit_all() {
        let mut filter = FilterModel::default();
        assert!(filter.register("app"));
        assert!(!filter.register("app"));
        assert!(filter.selected_namespaces().is_empty());
        assert!(filter.matches(&entry(LogType::Info, "app")));
    }

    #[test]
    fn test_register_force_selects_into_narrowed_selection() {
        let mut filter = FilterModel::default();
        filter.register("app");
        filter.register("db");
        filter.set_namespaces(["app"]);

        filter.register("cache");
        assert!(filter.is_namespace_selected("cache"));
        assert!(filter.is_namespace_selected("app"));
        assert!(!filter.is_namespace_selected("db"));
    }

    #[test]
    fn test_universe_is_monotonic() {
        let mut filter = FilterModel::default();
        filter.register("app");
        filter.reset_to_all();
        filter.set_namespaces(Vec::<String>::new());
        let all: Vec<&str> = filter.namespaces().collect();
        assert_eq!(all, vec!["app", "global"]);
    }

    #[test]
    fn test_reset_to_all() {
        let mut filter = FilterModel::default();
        filter.set_types([LogType::Debug]);
        filter.set_namespaces(["x"]);
        assert!(filter.is_filtering());
        filter.reset_to_all();
        assert!(!filter.is_filtering());
        assert!(filter.matches(&entry(LogType::Error, "y")));
    }

    #[test]
    fn test_reset_under_match_none_selects_universe() {
        let mut filter = FilterModel::new(EmptySelection::MatchNone);
        filter.register("app");
        filter.reset_to_all();
        assert!(filter.matches(&entry(LogType::Debug, "app")));
        assert!(filter.matches(&entry(LogType::Error, "global")));
        assert_eq!(filter.selected_namespaces().len(), 2);
    }

    #[test]
    fn test_unknown_type_tags_ignored() {
        let mut filter = FilterModel::default();
        filter.set_selection(SelectionKind::Type, ["heartbeat", "warn"]);
        assert_eq!(filter.selected_types().len(), 1);
        assert!(filter.matches(&entry(LogType::Warning, "global")));
    }

    #[test]
    fn test_all_unknown_type_tags_keep_selection() {
        let mut filter = FilterModel::default();
        filter.set_types([LogType::Error]);
        filter.set_selection(SelectionKind::Type, ["fatal"]);
        assert_eq!(filter.selected_types().len(), 1);
        assert!(filter.is_type_selected(LogType::Error));
        assert!(!filter.matches(&entry(LogType::Info, "global")));

        // An explicitly empty list still clears it
        filter.set_selection(SelectionKind::Type, Vec::<String>::new());
        assert!(filter.selected_types().is_empty());
    }
}
