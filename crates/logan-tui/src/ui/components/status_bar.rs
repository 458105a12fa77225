use logan_logs::ConnectionState;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// Status bar: connection indicator, keyboard hints and right-aligned text
pub struct StatusBar<'a> {
    connection: Option<ConnectionState>,
    notice: Option<&'a str>,
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            connection: None,
            notice: None,
            hints: Vec::new(),
            right_text: None,
        }
    }

    pub fn connection(mut self, state: ConnectionState) -> Self {
        self.connection = Some(state);
        self
    }

    /// A notice replaces the hints while it is shown
    pub fn notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Indicator text for a connection state
pub fn connection_label(state: &ConnectionState) -> String {
    match state {
        ConnectionState::Reconnecting { attempt, delay } => {
            format!("● reconnecting #{} in {:.1}s", attempt, delay.as_secs_f32())
        }
        other => format!("● {}", other.label()),
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        if let Some(state) = &self.connection {
            spans.push(Span::styled(connection_label(state), Theme::connection(state)));
            spans.push(Span::styled("  ", Theme::status_bar()));
        }

        if let Some(notice) = self.notice {
            spans.push(Span::styled(notice, Theme::status_bar_key()));
        } else {
            for (i, (key, desc)) in self.hints.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled("  ", Theme::status_bar()));
                }
                spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
                spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
            }
        }

        let line = Line::from(spans);
        let line_width = line.width() as u16;

        // Render hints on the left
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        // Render right text if it does not collide with the left side
        if let Some(right) = self.right_text {
            let right_width = right.width() as u16;
            let right_x = area.x + area.width.saturating_sub(right_width + 1);
            if right_x > area.x + line_width + 2 {
                let right_span = Span::styled(&right, Theme::status_bar());
                buf.set_span(right_x, area.y, &right_span, right_width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn rendered(bar: StatusBar<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_connection_labels() {
        assert_eq!(connection_label(&ConnectionState::Connected), "● connected");
        assert_eq!(
            connection_label(&ConnectionState::Failed),
            "● server unreachable"
        );
        assert_eq!(
            connection_label(&ConnectionState::Reconnecting {
                attempt: 3,
                delay: Duration::from_millis(4000)
            }),
            "● reconnecting #3 in 4.0s"
        );
    }

    #[test]
    fn test_renders_status_hints_and_right_text() {
        let bar = StatusBar::new()
            .connection(ConnectionState::Connected)
            .hints([("q", "Quit")])
            .right("3 logs ▼");
        let text = rendered(bar, 60);
        assert!(text.contains("● connected"));
        assert!(text.contains("[q] Quit"));
        assert!(text.trim_end().ends_with("3 logs ▼"));
    }

    #[test]
    fn test_notice_replaces_hints() {
        let bar = StatusBar::new()
            .notice(Some("reconnecting now"))
            .hints([("q", "Quit")]);
        let text = rendered(bar, 60);
        assert!(text.contains("reconnecting now"));
        assert!(!text.contains("Quit"));
    }
}
