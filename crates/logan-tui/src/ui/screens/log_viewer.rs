use logan_logs::{LogEntry, LogType, StoredEntry};
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{ClickTarget, DetailKind, Session, detail_lines};
use crate::ui::components::{FilterPanel, HelpOverlay, StatusBar};
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

/// Truncate to a display width, marking the cut with an ellipsis
fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Split into rows of at most `width` display columns. Always yields at
/// least one row; a character wider than `width` gets a row of its own.
fn wrap_to_width(s: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    rows.push(current);
    rows
}

/// Detail panel rows of an entry, wrapped to `width`
fn detail_rows(entry: &LogEntry, width: usize) -> Vec<(DetailKind, String)> {
    detail_lines(entry)
        .into_iter()
        .flat_map(|line| {
            let kind = line.kind;
            wrap_to_width(&line.text, width)
                .into_iter()
                .map(move |row| (kind, row))
        })
        .collect()
}

/// Smallest first index such that entries `first..=last` fit in `height` rows.
/// An entry taller than the viewport is shown from its top.
fn first_fitting(last: usize, height: usize, row_height: impl Fn(usize) -> usize) -> usize {
    let mut used = row_height(last);
    let mut first = last;
    while first > 0 {
        let h = row_height(first - 1);
        if used + h > height {
            break;
        }
        used += h;
        first -= 1;
    }
    first
}

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, session: &mut Session) {
        let areas = Layout::log_viewer(frame.area(), session.ui.stats_visible);

        Self::render_header(frame, areas.header, session);

        if let Some(stats) = areas.stats {
            Self::render_stats_bar(frame, stats, session);
        }

        Self::render_logs(frame, areas.logs, session);
        Self::render_status_bar(frame, areas.status, session);

        if session.ui.filter_panel.visible {
            Self::render_filter_panel(frame, session);
        }

        if session.ui.help_visible {
            HelpOverlay::render(frame);
        }
    }

    fn render_header(frame: &mut Frame, area: Rect, session: &Session) {
        let mut spans = vec![
            Span::styled("logan", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(session.source.clone(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("{} namespaces", session.filter.namespace_count()),
                Theme::text(),
            ),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!(
                    "{}/{} shown",
                    session.engine.visible_len(),
                    session.store.len()
                ),
                Theme::text(),
            ),
        ];

        if session.filter.is_filtering() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled("filtered", Theme::text_highlight()));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, session: &Session) {
        let counts = session.type_counts();
        let mut spans = vec![Span::styled(" ", Theme::text())];

        for log_type in LogType::ALL {
            spans.push(Span::styled(
                format!("{}:", log_type.as_str()),
                Theme::type_tag(log_type),
            ));
            spans.push(Span::styled(
                format!("{} ", counts.get(log_type)),
                Theme::text(),
            ));
        }

        let stats = session.engine.stats();
        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(
            format!("{}/{} ", counts.total(), session.store.capacity()),
            Theme::text(),
        ));
        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled(
            format!(
                "appended {} rebuilt {} drawn {}",
                stats.incremental, stats.rebuilds, stats.passes
            ),
            Theme::text_dim(),
        ));

        let stats_widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(stats_widget, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, session: &mut Session) {
        let inner_height = area.height.saturating_sub(2) as usize;
        // Borders and scrollbar
        let inner_width = area.width.saturating_sub(4) as usize;
        // Detail rows sit behind a "    │ " gutter
        let detail_width = inner_width.saturating_sub(6);

        let pin_newest = session.engine.take_scroll_request();
        let follow_cursor = std::mem::take(&mut session.ui.follow_cursor);
        let cursor = session.ui.cursor;
        let cursor_index = cursor.and_then(|seq| session.engine.position_of(seq));

        let visible = session.engine.visible();
        let total = visible.len();
        let expanded = session.detail.expanded();
        let row_height = |i: usize| {
            let entry = &visible[i];
            if expanded == Some(entry.seq) {
                1 + detail_rows(entry, detail_width).len()
            } else {
                1
            }
        };

        let ui = &mut session.ui;
        if total > 0 {
            if pin_newest {
                ui.log_scroll = first_fitting(total - 1, inner_height, row_height);
            } else if let (true, Some(index)) = (follow_cursor, cursor_index) {
                if index < ui.log_scroll {
                    ui.log_scroll = index;
                } else {
                    ui.log_scroll = ui
                        .log_scroll
                        .max(first_fitting(index, inner_height, row_height));
                }
            }
        }
        ui.log_scroll = ui.log_scroll.min(total.saturating_sub(1));

        let mut lines: Vec<Line> = Vec::with_capacity(inner_height);
        let mut targets = Vec::with_capacity(inner_height);
        for entry in visible.iter().skip(ui.log_scroll) {
            if lines.len() >= inner_height {
                break;
            }
            let is_expanded = expanded == Some(entry.seq);
            let mut line = Self::entry_line(
                entry,
                is_expanded,
                ui.show_timestamps,
                ui.show_namespaces,
                inner_width,
            );
            if cursor == Some(entry.seq) {
                line = line.style(Theme::cursor_row());
            }
            lines.push(line);
            targets.push(ClickTarget::Entry(entry.seq));

            if is_expanded {
                for (kind, text) in detail_rows(entry, detail_width) {
                    if lines.len() >= inner_height {
                        break;
                    }
                    lines.push(Line::from(vec![
                        Span::styled("    │ ", Theme::text_dim()),
                        Span::styled(text, Theme::detail(kind)),
                    ]));
                    targets.push(ClickTarget::Detail(entry.seq));
                }
            }
        }

        if lines.is_empty() {
            let hint = if session.store.is_empty() {
                "Waiting for logs..."
            } else {
                "No entries match the current filter"
            };
            lines.push(Line::from(Span::styled(hint, Theme::text_dim())));
        }

        ui.row_targets = targets;
        ui.rows_top = area.y + 1;

        let title = if session.filter.is_filtering() {
            format!(" Logs ({} matching) ", total)
        } else {
            format!(" Logs ({}) ", total)
        };

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total)
                .position(ui.log_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// Format the summary row of an entry
    fn entry_line(
        entry: &StoredEntry,
        expanded: bool,
        show_timestamps: bool,
        show_namespaces: bool,
        available_width: usize,
    ) -> Line<'static> {
        let mut spans = Vec::new();
        let mut prefix_width: usize = 0;

        let marker = if expanded { "▾" } else { "▸" };
        spans.push(Span::styled(marker, Theme::text_dim()));
        prefix_width += 1;

        // " HH:MM:SS.mmm" = 13 chars
        if show_timestamps {
            spans.push(Span::styled(
                format!(" {}", entry.timestamp.format("%H:%M:%S%.3f")),
                Theme::text_dim(),
            ));
            prefix_width += 13;
        }

        spans.push(Span::styled(
            format!(" {}", entry.log_type.as_str()),
            Theme::type_tag(entry.log_type),
        ));
        prefix_width += 4;

        if show_namespaces {
            let ns = truncate_to_width(&entry.namespace, 12);
            prefix_width += 1 + ns.width();
            spans.push(Span::styled(
                format!(" {}", ns),
                Style::default().fg(namespace_color(&entry.namespace)),
            ));
        }

        spans.push(Span::styled(" │ ", Theme::text_dim()));
        prefix_width += 3;

        let message_width = available_width.saturating_sub(prefix_width);
        spans.push(Span::styled(
            truncate_to_width(entry.summary(), message_width),
            Theme::message(entry.log_type),
        ));

        Line::from(spans)
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, session: &Session) {
        let counts = session.type_counts();
        let right_text = format!(
            "E:{} W:{} I:{} D:{} | {} logs {}",
            counts.error,
            counts.warning,
            counts.info,
            counts.debug,
            counts.total(),
            if session.engine.auto_scroll() { "▼" } else { " " }
        );

        let hints: Vec<(&str, &str)> = if session.ui.filter_panel.search_active {
            vec![("Enter", "Done"), ("Esc", "Close search")]
        } else if session.ui.filter_panel.visible {
            vec![
                ("Space", "Toggle"),
                ("a", "All"),
                ("/", "Search"),
                ("Esc", "Close"),
            ]
        } else {
            vec![
                ("l", "Filter"),
                ("f", "Follow"),
                ("c", "Clear"),
                ("?", "Help"),
                ("q", "Quit"),
            ]
        };

        let status = StatusBar::new()
            .connection(session.connection)
            .notice(session.ui.notice.as_deref())
            .hints(hints)
            .right(right_text);

        frame.render_widget(status, area);
    }

    fn render_filter_panel(frame: &mut Frame, session: &mut Session) {
        let rows = session.ui.filter_panel.rows(&session.filter);
        let panel = &mut session.ui.filter_panel;
        panel.selection = panel.selection.min(rows.len().saturating_sub(1));

        let popup_area = Layout::popup(frame.area(), 40, 20);
        frame.render_widget(Clear, popup_area);

        let mut list_state = ListState::default().with_selected(Some(panel.selection));
        frame.render_stateful_widget(
            FilterPanel::new(&rows, &session.filter, panel),
            popup_area,
            &mut list_state,
        );
    }
}

/// Get a consistent color for a namespace
fn namespace_color(namespace: &str) -> Color {
    let hash: u32 = namespace
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let colors = [
        Color::Cyan,
        Color::Magenta,
        Color::Blue,
        Color::LightGreen,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightBlue,
    ];

    colors[(hash as usize) % colors.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SessionConfig;
    use logan_logs::LogEntry;
    use ratatui::{Terminal, backend::TestBackend};
    use std::time::Instant;

    fn session_with(messages: &[&str]) -> Session {
        let mut session = Session::new(SessionConfig {
            source: "http://127.0.0.1:5000/api/logs/stream".into(),
            ..Default::default()
        });
        let now = Instant::now();
        for m in messages {
            session.ingest(LogEntry::new(LogType::Info, "global", *m), now);
        }
        session
    }

    fn draw(session: &mut Session, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| LogViewerScreen::render(frame, session))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| (0..width).map(|x| buffer[(x, y)].symbol().to_string()).collect())
            .collect()
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_wrap_to_width() {
        assert_eq!(wrap_to_width("", 5), vec![""]);
        assert_eq!(wrap_to_width("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(wrap_to_width("日本語", 4), vec!["日本", "語"]);
        assert_eq!(wrap_to_width("日x", 1), vec!["日", "x"]);
    }

    #[test]
    fn test_first_fitting() {
        // All single rows: the last 5 fit in 5
        assert_eq!(first_fitting(9, 5, |_| 1), 5);
        // Entry 9 is 3 rows tall
        assert_eq!(first_fitting(9, 5, |i| if i == 9 { 3 } else { 1 }), 7);
        // Taller than the viewport
        assert_eq!(first_fitting(9, 2, |_| 4), 9);
        assert_eq!(first_fitting(0, 5, |_| 1), 0);
    }

    #[test]
    fn test_auto_scroll_pins_newest() {
        let messages: Vec<String> = (0..40).map(|i| format!("message {i}")).collect();
        let refs: Vec<&str> = messages.iter().map(String::as_str).collect();
        let mut session = session_with(&refs);

        let screen = draw(&mut session, 80, 24);
        // Rows 3..23 hold the log block; its last inner row is 21
        assert!(screen[21].contains("message 39"), "{:?}", screen[21]);
        assert!(screen.iter().all(|row| !row.contains("message 0 ")));
    }

    #[test]
    fn test_click_map_matches_drawn_rows() {
        let mut session = session_with(&["first", "second"]);
        session.detail.toggle(session.engine.visible()[0].seq);
        let screen = draw(&mut session, 80, 24);

        let first_seq = session.engine.visible()[0].seq;
        let second_seq = session.engine.visible()[1].seq;
        // Log block starts at row 3, its first inner row is 4
        assert!(screen[4].contains("first"));
        assert_eq!(session.ui.target_at(4), ClickTarget::Entry(first_seq));
        assert_eq!(session.ui.target_at(5), ClickTarget::Detail(first_seq));
        assert!(screen[6].contains("second"));
        assert_eq!(session.ui.target_at(6), ClickTarget::Entry(second_seq));
        assert_eq!(session.ui.target_at(7), ClickTarget::Empty);
    }

    #[test]
    fn test_detail_wraps_long_message_in_full() {
        let mut session = Session::new(SessionConfig::default());
        let message = format!("{}TAILMARKER", "x".repeat(150));
        session.ingest(LogEntry::new(LogType::Error, "app", message), Instant::now());
        let seq = session.engine.visible()[0].seq;
        session.detail.toggle(seq);

        let screen = draw(&mut session, 80, 24);
        // Summary row is truncated, the detail rows carry the rest
        assert!(screen[4].contains('…'));
        assert!(screen.iter().any(|row| row.contains("TAILMARKER")));

        // 160 chars in 70 columns: three detail rows, each clickable as detail
        assert_eq!(session.ui.target_at(4), ClickTarget::Entry(seq));
        for row in 5..8 {
            assert_eq!(session.ui.target_at(row), ClickTarget::Detail(seq));
        }
        assert_eq!(session.ui.target_at(8), ClickTarget::Empty);
    }

    #[test]
    fn test_stats_bar_shows_fill_against_capacity() {
        let mut session = session_with(&["a", "b"]);
        session.ui.stats_visible = true;
        let screen = draw(&mut session, 120, 24);
        assert!(screen[4].contains("Total:2/1000"), "{:?}", screen[4]);
    }

    #[test]
    fn test_empty_states() {
        let mut session = session_with(&[]);
        let screen = draw(&mut session, 80, 24);
        assert!(screen.iter().any(|row| row.contains("Waiting for logs...")));

        let mut session = session_with(&["a"]);
        session.set_types([LogType::Error], Instant::now());
        let screen = draw(&mut session, 80, 24);
        assert!(screen.iter().any(|row| row.contains("No entries match")));
    }

    #[test]
    fn test_status_bar_shows_connection_and_follow() {
        let mut session = session_with(&["a"]);
        session.connection = logan_logs::ConnectionState::Failed;
        let screen = draw(&mut session, 120, 24);
        assert!(screen[23].contains("server unreachable"));
        assert!(screen[23].contains("1 logs ▼"));
    }
}
