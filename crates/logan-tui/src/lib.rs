//! TUI components for logan
//!
//! This crate provides the terminal log viewer: session state, render
//! scheduling, keybindings, event handling and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{
    Action, ClickTarget, DetailPanel, FilterPanelState, FilterRow, RenderEngine, Session,
    SessionConfig, UiState,
};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{FilterPanel, HelpOverlay, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
