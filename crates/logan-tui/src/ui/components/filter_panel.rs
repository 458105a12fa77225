use logan_logs::FilterModel;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout as RatatuiLayout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::app::{FilterPanelState, FilterRow};
use crate::ui::Theme;

/// Checkbox list over log types and known namespaces
pub struct FilterPanel<'a> {
    rows: &'a [FilterRow],
    filter: &'a FilterModel,
    search: &'a str,
    search_active: bool,
}

impl<'a> FilterPanel<'a> {
    pub fn new(rows: &'a [FilterRow], filter: &'a FilterModel, panel: &'a FilterPanelState) -> Self {
        Self {
            rows,
            filter,
            search: &panel.search,
            search_active: panel.search_active,
        }
    }
}

/// Effective checkbox state of a row
pub fn is_checked(row: &FilterRow, filter: &FilterModel) -> bool {
    match row {
        FilterRow::Type(log_type) => filter.is_type_selected(*log_type),
        FilterRow::Namespace(ns) => filter.is_namespace_selected(ns),
    }
}

fn row_line<'a>(row: &'a FilterRow, checked: bool) -> Line<'a> {
    let checkbox = if checked { "[x] " } else { "[ ] " };
    match row {
        FilterRow::Type(log_type) => Line::from(vec![
            Span::styled(checkbox, Theme::text()),
            Span::styled(log_type.as_str(), Theme::type_tag(*log_type)),
            Span::styled(format!(" {}", log_type), Theme::text_dim()),
        ]),
        FilterRow::Namespace(ns) => Line::from(vec![
            Span::styled(checkbox, Theme::text()),
            Span::styled(ns.as_str(), Theme::text()),
        ]),
    }
}

impl StatefulWidget for FilterPanel<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(" Filter ", Theme::title()));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let mut search = vec![Span::styled("/", Theme::text_highlight())];
        if self.search.is_empty() && !self.search_active {
            search.push(Span::styled(" search namespaces", Theme::text_dim()));
        } else {
            search.push(Span::styled(self.search, Theme::text_highlight()));
        }
        if self.search_active {
            search.push(Span::styled(
                "█",
                Style::default()
                    .fg(Theme::HIGHLIGHT)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        Paragraph::new(Line::from(search)).render(chunks[0], buf);

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| ListItem::new(row_line(row, is_checked(row, self.filter))))
            .collect();

        let list = List::new(items)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        StatefulWidget::render(list, chunks[1], buf, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logan_logs::{EmptySelection, LogType};

    #[test]
    fn test_checkbox_state_follows_effective_selection() {
        let mut filter = FilterModel::new(EmptySelection::MatchAll);
        filter.register("app");
        let info = FilterRow::Type(LogType::Info);
        let app = FilterRow::Namespace("app".into());
        assert!(is_checked(&info, &filter));
        assert!(is_checked(&app, &filter));

        filter.set_types([LogType::Error]);
        filter.set_namespaces(["global"]);
        assert!(!is_checked(&info, &filter));
        assert!(!is_checked(&app, &filter));
        assert!(is_checked(&FilterRow::Type(LogType::Error), &filter));
    }

    #[test]
    fn test_renders_rows_with_selection() {
        let mut filter = FilterModel::default();
        filter.register("app");
        let panel_state = FilterPanelState::default();
        let rows = panel_state.rows(&filter);
        assert_eq!(rows.len(), 6);

        let area = Rect::new(0, 0, 30, 10);
        let mut buf = Buffer::empty(area);
        let mut list_state = ListState::default().with_selected(Some(4));
        FilterPanel::new(&rows, &filter, &panel_state).render(area, &mut buf, &mut list_state);

        let line = |y: u16| -> String { (0..30).map(|x| buf[(x, y)].symbol().to_string()).collect() };
        assert!(line(2).contains("[x] INF"));
        // Namespaces are sorted after the types: "app" then "global"
        assert!(line(6).contains("▶ [x] app"));
        assert!(line(7).contains("[x] global"));
    }
}
