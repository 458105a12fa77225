use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    FilterPanel,
    /// Namespace search box of the filter panel has focus
    FilterSearch,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Esc), Action::GoBack);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::CursorDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::CursorDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::CursorUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::CursorUp(1));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::CursorToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::CursorToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::CursorToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::CursorToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Enter), Action::ToggleDetail);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::ToggleDetail);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('t')), Action::ToggleTimestamps);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::ToggleNamespaces);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearLogs);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('l')), Action::ToggleFilterPanel);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('a')), Action::FilterSelectAll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('r')), Action::Reconnect);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        let mut panel = HashMap::new();
        panel.insert(KeyBinding::new(KeyCode::Char('j')), Action::FilterDown);
        panel.insert(KeyBinding::new(KeyCode::Down), Action::FilterDown);
        panel.insert(KeyBinding::new(KeyCode::Char('k')), Action::FilterUp);
        panel.insert(KeyBinding::new(KeyCode::Up), Action::FilterUp);
        panel.insert(KeyBinding::new(KeyCode::Char(' ')), Action::FilterToggle);
        panel.insert(KeyBinding::new(KeyCode::Enter), Action::FilterToggle);
        panel.insert(KeyBinding::new(KeyCode::Char('a')), Action::FilterSelectAll);
        panel.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        panel.insert(KeyBinding::new(KeyCode::Char('l')), Action::ToggleFilterPanel);
        panel.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleFilterPanel);
        bindings.insert(KeyContext::FilterPanel, panel);

        // Search box bindings; plain characters become input
        let mut search = HashMap::new();
        search.insert(KeyBinding::new(KeyCode::Enter), Action::CloseSearch);
        search.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        search.insert(KeyBinding::new(KeyCode::Down), Action::FilterDown);
        search.insert(KeyBinding::new(KeyCode::Up), Action::FilterUp);
        bindings.insert(KeyContext::FilterSearch, search);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Text input swallows every other key, including the global ones
        if context == KeyContext::FilterSearch {
            return Self::text_input(key);
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    fn text_input(key: &KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                Some(Action::SearchInput(c))
            }
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_f_toggles_auto_scroll_in_viewer() {
        let bindings = KeyBindings::new();
        let action = bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('f')));
        assert!(matches!(action, Some(Action::ToggleAutoScroll)));
    }

    #[test]
    fn test_search_box_swallows_shortcuts() {
        let bindings = KeyBindings::new();
        for c in ['f', 'q', 'c', '?'] {
            let action = bindings.get_action(KeyContext::FilterSearch, &key(KeyCode::Char(c)));
            assert!(matches!(action, Some(Action::SearchInput(got)) if got == c));
        }
        let action = bindings.get_action(KeyContext::FilterSearch, &key(KeyCode::Esc));
        assert!(matches!(action, Some(Action::CloseSearch)));
    }

    #[test]
    fn test_global_fallback() {
        let bindings = KeyBindings::new();
        let action = bindings.get_action(KeyContext::FilterPanel, &key(KeyCode::Char('q')));
        assert!(matches!(action, Some(Action::Quit)));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(
            bindings.get_action(KeyContext::LogViewer, &ctrl_c),
            Some(Action::Quit)
        ));
    }

    #[test]
    fn test_unbound_key() {
        let bindings = KeyBindings::new();
        assert!(bindings.get_action(KeyContext::LogViewer, &key(KeyCode::F(5))).is_none());
    }
}
