use logan_logs::{ConnectionState, LogType};
use ratatui::style::{Color, Modifier, Style};

use crate::app::DetailKind;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // List styles
    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Row under the keyboard cursor
    pub fn cursor_row() -> Style {
        Style::default().bg(Color::Rgb(40, 44, 52))
    }

    // Log rows
    pub fn type_tag(log_type: LogType) -> Style {
        Style::default()
            .fg(log_type.color())
            .add_modifier(Modifier::BOLD)
    }

    pub fn message(log_type: LogType) -> Style {
        match log_type {
            LogType::Error => Style::default().fg(Self::ERROR),
            LogType::Warning => Style::default().fg(Self::WARNING),
            LogType::Debug => Self::text_dim(),
            LogType::Info => Self::text(),
        }
    }

    pub fn detail(kind: DetailKind) -> Style {
        match kind {
            DetailKind::Message => Self::text(),
            DetailKind::Traceback => Style::default().fg(Color::LightRed),
            DetailKind::Frame => Style::default().fg(Color::Blue),
        }
    }

    pub fn connection(state: &ConnectionState) -> Style {
        let color = match state {
            ConnectionState::Connected => Self::SUCCESS,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => Self::WARNING,
            ConnectionState::Disconnected => Self::FG_DIM,
            ConnectionState::Failed => Self::ERROR,
        };
        Style::default()
            .fg(color)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }
}
