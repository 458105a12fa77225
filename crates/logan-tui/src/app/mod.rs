//! Session state, actions and rendering decisions

mod action;
mod detail;
mod render;
mod state;

pub use action::Action;
pub use detail::{ClickTarget, DetailKind, DetailLine, DetailPanel, detail_lines};
pub use render::{DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_WAIT, RenderEngine, RenderStats};
pub use state::{FilterPanelState, FilterRow, Session, SessionConfig, UiState};
