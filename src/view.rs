//! The terminal viewer: one select loop owning the session

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use logan_logs::{ConnectionManager, LogType, StreamEvent, default_client};
use logan_tui::{
    Action, Event, EventHandler, KeyBindings, KeyContext, LogViewerScreen, Session, Tui,
};

use crate::config::Settings;

/// Rows moved per mouse wheel notch
const WHEEL_STEP: usize = 3;

pub async fn run(settings: Settings) -> Result<()> {
    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel::<StreamEvent>();

    let mut session = Session::new(settings.session_config()?);
    let client = default_client().context("Failed to build HTTP client")?;
    let mut connection = ConnectionManager::new(client, settings.reconnect.policy());
    connection.connect(&settings.url, stream_tx.clone());

    let mut tui = Tui::new().context("Failed to initialize terminal")?;
    let mut events = EventHandler::new(Duration::from_millis(250));
    let keybindings = KeyBindings::new();

    info!(url = %settings.url, "viewer started");
    render(&mut tui, &mut session)?;

    loop {
        let deadline = session.engine.deadline();

        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                if let Some(action) = action_for_event(&keybindings, &session, event) {
                    let reconnect = handle_action(&mut session, action, Instant::now());
                    if reconnect {
                        connection.connect(&settings.url, stream_tx.clone());
                    }
                }
            }

            // Handle connection events
            Some(event) = stream_rx.recv() => {
                session.handle_stream_event(event, Instant::now());
            }

            // Pending draw is due
            _ = tokio::time::sleep_until(
                tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now))
            ), if deadline.is_some() => {}
        }

        if session.should_quit {
            break;
        }

        if session.engine.take_due(Instant::now()) {
            render(&mut tui, &mut session)?;
        }
    }

    // Cleanup
    connection.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Which keybinding context is active
fn key_context(session: &Session) -> KeyContext {
    let panel = &session.ui.filter_panel;
    if panel.visible && panel.search_active {
        KeyContext::FilterSearch
    } else if panel.visible {
        KeyContext::FilterPanel
    } else {
        KeyContext::LogViewer
    }
}

fn action_for_event(keybindings: &KeyBindings, session: &Session, event: Event) -> Option<Action> {
    let overlay_open = session.ui.help_visible || session.ui.filter_panel.visible;
    match event {
        Event::Key(key) => keybindings.get_action(key_context(session), &key),
        Event::Click(row) if !overlay_open => Some(Action::Click(row)),
        Event::Wheel(delta) if !overlay_open => Some(if delta < 0 {
            Action::ScrollUp(WHEEL_STEP)
        } else {
            Action::ScrollDown(WHEEL_STEP)
        }),
        Event::Click(_) | Event::Wheel(_) | Event::Tick => None,
        Event::Resize(_, _) => Some(Action::Render),
        Event::Error(e) => Some(Action::ShowNotice(e)),
    }
}

/// Apply an action to the session. Returns true if the connection should be
/// restarted.
fn handle_action(session: &mut Session, action: Action, now: Instant) -> bool {
    let mut reconnect = false;
    let page = session.ui.row_targets.len().max(1) as isize;

    match action {
        Action::Quit => session.should_quit = true,
        Action::GoBack => {
            let ui = &mut session.ui;
            if ui.help_visible {
                ui.help_visible = false;
            } else if ui.filter_panel.search_active {
                ui.filter_panel.search_active = false;
            } else if ui.filter_panel.visible {
                ui.filter_panel.visible = false;
            } else {
                ui.notice = None;
            }
        }

        Action::ToggleHelp => session.ui.help_visible = !session.ui.help_visible,
        Action::ToggleFilterPanel => {
            let panel = &mut session.ui.filter_panel;
            panel.visible = !panel.visible;
            panel.search_active = false;
        }

        Action::FilterUp => {
            let panel = &mut session.ui.filter_panel;
            panel.selection = panel.selection.saturating_sub(1);
        }
        Action::FilterDown => {
            let rows = session.ui.filter_panel.rows(&session.filter).len();
            let panel = &mut session.ui.filter_panel;
            panel.selection = (panel.selection + 1).min(rows.saturating_sub(1));
        }
        Action::FilterToggle => {
            let rows = session.ui.filter_panel.rows(&session.filter);
            if let Some(row) = rows.get(session.ui.filter_panel.selection) {
                session.toggle_filter_row(row, now);
            }
        }
        Action::FilterSelectAll => session.select_all(now),

        Action::OpenSearch => session.ui.filter_panel.search_active = true,
        Action::CloseSearch => session.ui.filter_panel.search_active = false,
        Action::SearchInput(c) => {
            let panel = &mut session.ui.filter_panel;
            panel.search.push(c);
            // Jump to the first namespace row
            panel.selection = LogType::ALL.len();
        }
        Action::SearchBackspace => {
            session.ui.filter_panel.search.pop();
        }
        Action::SearchClear => session.ui.filter_panel.search.clear(),

        Action::CursorUp(n) => session.move_cursor(-(n as isize), now),
        Action::CursorDown(n) => session.move_cursor(n as isize, now),
        Action::CursorToTop => session.cursor_to_top(now),
        Action::CursorToBottom => session.cursor_to_bottom(now),
        Action::PageUp => session.move_cursor(-page, now),
        Action::PageDown => session.move_cursor(page, now),
        Action::ScrollUp(n) => session.scroll_by(-(n as isize), now),
        Action::ScrollDown(n) => session.scroll_by(n as isize, now),

        Action::ToggleDetail => session.toggle_detail_at_cursor(now),
        Action::Click(row) => {
            let target = session.ui.target_at(row);
            session.click(target, now);
        }
        Action::ToggleAutoScroll => session.toggle_auto_scroll(now),
        Action::ToggleTimestamps => session.ui.show_timestamps = !session.ui.show_timestamps,
        Action::ToggleNamespaces => session.ui.show_namespaces = !session.ui.show_namespaces,
        Action::ToggleStats => session.ui.stats_visible = !session.ui.stats_visible,
        Action::ClearLogs => session.clear_logs(now),

        Action::Reconnect => {
            debug!("manual reconnect");
            session.ui.notice = Some("reconnecting...".to_string());
            reconnect = true;
        }

        Action::ShowNotice(message) => session.ui.notice = Some(message),
        Action::Render => {}
    }

    // Any input redraws right away
    session.engine.request_render(now);
    reconnect
}

fn render(tui: &mut Tui, session: &mut Session) -> Result<()> {
    tui.terminal()
        .draw(|frame| LogViewerScreen::render(frame, session))?;
    Ok(())
}
