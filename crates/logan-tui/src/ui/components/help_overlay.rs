use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::Layout;

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::popup(frame.area(), 50, 32);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Navigation"),
            Self::key_line("j/↓", "Next entry"),
            Self::key_line("k/↑", "Previous entry"),
            Self::key_line("Ctrl+d", "Page down"),
            Self::key_line("Ctrl+u", "Page up"),
            Self::key_line("g", "Oldest entry"),
            Self::key_line("G", "Newest entry"),
            Self::key_line("Enter", "Toggle details"),
            Self::key_line("click", "Toggle details"),
            Line::from(""),
            Self::section("Display"),
            Self::key_line("f", "Toggle auto-scroll"),
            Self::key_line("t", "Toggle timestamps"),
            Self::key_line("n", "Toggle namespaces"),
            Self::key_line("s", "Toggle stats bar"),
            Line::from(""),
            Self::section("Filtering"),
            Self::key_line("l", "Filter panel"),
            Self::key_line("a", "Select all"),
            Self::key_line("/", "Search namespaces (panel)"),
            Self::key_line("Space", "Toggle checkbox (panel)"),
            Line::from(""),
            Self::section("Actions"),
            Self::key_line("c", "Clear logs"),
            Self::key_line("r", "Reconnect"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Close overlay"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(Span::styled(
                    " Help ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Style::default().fg(Color::White)),
        ])
    }
}
