use logan_logs::LogEntry;

/// What a click on a log row landed on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// The summary row of an entry
    Entry(u64),
    /// A row inside the entry's open detail panel
    Detail(u64),
    /// Blank space below the last entry
    Empty,
}

/// Tracks the single expanded entry, keyed by store sequence number
#[derive(Clone, Debug, Default)]
pub struct DetailPanel {
    expanded: Option<u64>,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle an entry. Expanding one collapses whichever was open.
    pub fn toggle(&mut self, seq: u64) {
        self.expanded = if self.expanded == Some(seq) {
            None
        } else {
            Some(seq)
        };
    }

    /// Handle a click. Only entry rows toggle; returns whether anything changed.
    pub fn click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Entry(seq) => {
                self.toggle(seq);
                true
            }
            ClickTarget::Detail(_) | ClickTarget::Empty => false,
        }
    }

    pub fn expanded(&self) -> Option<u64> {
        self.expanded
    }

    pub fn is_expanded(&self, seq: u64) -> bool {
        self.expanded == Some(seq)
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    /// The entry left the store; its panel can no longer be shown
    pub fn forget(&mut self, seq: u64) {
        if self.expanded == Some(seq) {
            self.expanded = None;
        }
    }
}

/// Section a detail line belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailKind {
    Message,
    Traceback,
    Frame,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailLine {
    pub kind: DetailKind,
    pub text: String,
}

/// Derive the detail panel content for an entry: the full message, then
/// the traceback, then one `file:line in function()` per call frame.
pub fn detail_lines(entry: &LogEntry) -> Vec<DetailLine> {
    let mut lines: Vec<DetailLine> = entry
        .message
        .lines()
        .map(|text| DetailLine {
            kind: DetailKind::Message,
            text: text.to_string(),
        })
        .collect();
    if lines.is_empty() {
        lines.push(DetailLine {
            kind: DetailKind::Message,
            text: String::new(),
        });
    }

    if let Some(exception) = &entry.exception {
        // Trace lines may carry their own newlines; concatenating first keeps them verbatim
        let traceback = exception.traceback.concat();
        lines.extend(traceback.lines().map(|text| DetailLine {
            kind: DetailKind::Traceback,
            text: text.to_string(),
        }));
    }

    lines.extend(entry.callstack.iter().map(|frame| DetailLine {
        kind: DetailKind::Frame,
        text: frame.to_string(),
    }));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use logan_logs::{CallFrame, ExceptionInfo, LogType};

    #[test]
    fn test_single_expansion() {
        let mut panel = DetailPanel::new();
        panel.toggle(1);
        panel.toggle(2);
        assert_eq!(panel.expanded(), Some(2));
        assert!(!panel.is_expanded(1));

        panel.toggle(2);
        assert_eq!(panel.expanded(), None);
    }

    #[test]
    fn test_any_toggle_sequence_keeps_at_most_one() {
        let mut panel = DetailPanel::new();
        let mut expected = None;
        for seq in [3, 3, 1, 4, 1, 5, 9, 9, 2, 6] {
            panel.toggle(seq);
            expected = if expected == Some(seq) { None } else { Some(seq) };
            assert_eq!(panel.expanded(), expected);
        }
    }

    #[test]
    fn test_click_inside_details_does_not_toggle() {
        let mut panel = DetailPanel::new();
        assert!(panel.click(ClickTarget::Entry(7)));
        assert!(!panel.click(ClickTarget::Detail(7)));
        assert!(!panel.click(ClickTarget::Empty));
        assert_eq!(panel.expanded(), Some(7));
    }

    #[test]
    fn test_forget_only_collapses_matching_entry() {
        let mut panel = DetailPanel::new();
        panel.toggle(4);
        panel.forget(3);
        assert_eq!(panel.expanded(), Some(4));
        panel.forget(4);
        assert_eq!(panel.expanded(), None);
    }

    #[test]
    fn test_detail_content_order() {
        let entry = LogEntry::new(LogType::Error, "app", "failed\nsecond line")
            .with_exception(ExceptionInfo {
                message: Some("bad".into()),
                traceback: vec![
                    "Traceback (most recent call last):\n".into(),
                    "  File \"a.py\", line 1\nValueError: bad\n".into(),
                ],
            })
            .with_callstack(vec![
                CallFrame::new("main.py", 3, "main"),
                CallFrame::new("a.py", 1, "run"),
            ]);

        let texts: Vec<(DetailKind, String)> = detail_lines(&entry)
            .into_iter()
            .map(|l| (l.kind, l.text))
            .collect();
        assert_eq!(
            texts,
            vec![
                (DetailKind::Message, "failed".into()),
                (DetailKind::Message, "second line".into()),
                (DetailKind::Traceback, "Traceback (most recent call last):".into()),
                (DetailKind::Traceback, "  File \"a.py\", line 1".into()),
                (DetailKind::Traceback, "ValueError: bad".into()),
                (DetailKind::Frame, "main.py:3 in main()".into()),
                (DetailKind::Frame, "a.py:1 in run()".into()),
            ]
        );
    }
}
