use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, TableState};

use crate::Theme;
use crate::config::{KeyResolver, NavAction, SearchAction};
use crate::ui::{Component, EventResult, Result};

const PAGE: usize = 10;

pub enum TableEvent<T> {
    Activated(T),
}

pub struct ColumnDef {
    pub header: &'static str,
    pub constraint: Constraint,
}

impl ColumnDef {
    pub const fn new(header: &'static str, constraint: Constraint) -> Self {
        Self { header, constraint }
    }
}

pub trait TableRow {
    fn columns() -> &'static [ColumnDef];

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>>;

    /// Whether this row survives the search filter.
    fn matches(&self, query: &str) -> bool;
}

/// Selectable table with `/` search.
pub struct Table<T: TableRow + Clone> {
    items: Vec<T>,
    visible: Vec<usize>,
    state: TableState,
    title: Option<String>,
    empty_message: &'static str,
    searching: bool,
    query: String,
    resolver: Arc<KeyResolver>,
}

impl<T: TableRow + Clone> Table<T> {
    pub fn new(items: Vec<T>, resolver: Arc<KeyResolver>) -> Self {
        let mut table = Self {
            items: Vec::new(),
            visible: Vec::new(),
            state: TableState::default(),
            title: None,
            empty_message: "Nothing to show",
            searching: false,
            query: String::new(),
            resolver,
        };
        table.set_items(items);
        table
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub const fn with_empty_message(mut self, message: &'static str) -> Self {
        self.empty_message = message;
        self
    }

    /// Replace the rows, keeping the cursor where it was when possible.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.refilter();
    }

    pub fn selected(&self) -> Option<&T> {
        let pos = self.state.selected()?;
        self.visible.get(pos).map(|&i| &self.items[i])
    }

    fn refilter(&mut self) {
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.query.is_empty() || item.matches(&self.query))
            .map(|(i, _)| i)
            .collect();

        let last = self.visible.len().checked_sub(1);
        let pos = match (self.state.selected(), last) {
            (_, None) => None,
            (Some(pos), Some(last)) => Some(pos.min(last)),
            (None, Some(_)) => Some(0),
        };
        self.state.select(pos);
    }

    fn move_to(&mut self, target: impl FnOnce(usize, usize) -> usize) {
        let Some(last) = self.visible.len().checked_sub(1) else {
            return;
        };
        let current = self.state.selected().unwrap_or(0);
        self.state.select(Some(target(current, last).min(last)));
    }

    fn clear_query(&mut self) -> bool {
        let had_query = !self.query.is_empty();
        self.query.clear();
        self.refilter();
        had_query
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> EventResult<TableEvent<T>> {
        if self.resolver.matches_search(&key, SearchAction::Exit) {
            self.searching = false;
            self.clear_query();
            return EventResult::Consumed;
        }
        // Enter leaves search mode but keeps the filter.
        if self.resolver.matches_nav(&key, NavAction::Select) {
            self.searching = false;
            return EventResult::Consumed;
        }
        match key.code {
            KeyCode::Backspace => {
                self.query.pop();
                self.refilter();
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.refilter();
            }
            _ => {}
        }
        EventResult::Consumed
    }

    fn handle_navigation_key(&mut self, key: KeyEvent) -> EventResult<TableEvent<T>> {
        let r = &self.resolver;
        if r.matches_nav(&key, NavAction::Down) {
            self.move_to(|i, _| i + 1);
        } else if r.matches_nav(&key, NavAction::Up) {
            self.move_to(|i, _| i.saturating_sub(1));
        } else if r.matches_nav(&key, NavAction::PageDown) {
            self.move_to(|i, _| i + PAGE);
        } else if r.matches_nav(&key, NavAction::PageUp) {
            self.move_to(|i, _| i.saturating_sub(PAGE));
        } else if r.matches_nav(&key, NavAction::Home) {
            self.move_to(|_, _| 0);
        } else if r.matches_nav(&key, NavAction::End) {
            self.move_to(|_, last| last);
        } else if r.matches_nav(&key, NavAction::Select) {
            return self
                .selected()
                .cloned()
                .map_or(EventResult::Ignored, |item| TableEvent::Activated(item).into());
        } else if r.matches_search(&key, SearchAction::Toggle) {
            self.searching = true;
        } else if r.matches_search(&key, SearchAction::Exit) && !self.query.is_empty() {
            self.clear_query();
        } else {
            return EventResult::Ignored;
        }
        EventResult::Consumed
    }
}

impl<T: TableRow + Clone> Component for Table<T> {
    type Output = TableEvent<T>;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(if self.searching {
            self.handle_search_key(key)
        } else {
            self.handle_navigation_key(key)
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let show_search = self.searching || !self.query.is_empty();
        let [table_area, search_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(u16::from(show_search)),
        ])
        .areas(area);

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));
        if let Some(title) = &self.title {
            block = block.title(title.as_str()).title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            );
        }

        if self.visible.is_empty() {
            let message = if self.items.is_empty() {
                self.empty_message
            } else {
                "No matches"
            };
            let placeholder = Paragraph::new(message)
                .style(Style::default().fg(theme.overlay0()))
                .centered()
                .block(block);
            frame.render_widget(placeholder, table_area);
        } else {
            let columns = T::columns();
            let header = Row::new(columns.iter().map(|c| {
                Cell::from(c.header).style(
                    Style::default()
                        .fg(theme.header())
                        .add_modifier(Modifier::BOLD),
                )
            }))
            .style(Style::default().bg(theme.surface0()));

            let rows = self.visible.iter().map(|&i| {
                Row::new(self.items[i].render_cells(theme)).style(Style::default().fg(theme.text()))
            });

            let table = ratatui::widgets::Table::new(rows, columns.iter().map(|c| c.constraint))
                .header(header)
                .block(block)
                .row_highlight_style(
                    Style::default()
                        .bg(theme.selection_bg())
                        .fg(theme.lavender())
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");
            frame.render_stateful_widget(table, table_area, &mut self.state);
        }

        if show_search {
            let (text, color) = if self.searching {
                (format!("/{}_", self.query), theme.yellow())
            } else {
                (
                    format!("/{} ({} matches)", self.query, self.visible.len()),
                    theme.subtext0(),
                )
            };
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(color)),
                search_area,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;
    use crate::search::Matcher;

    #[derive(Clone, Debug, PartialEq)]
    struct Name(&'static str);

    impl TableRow for Name {
        fn columns() -> &'static [ColumnDef] {
            static COLUMNS: &[ColumnDef] = &[ColumnDef::new("Name", Constraint::Min(10))];
            COLUMNS
        }

        fn render_cells(&self, _theme: &Theme) -> Vec<Cell<'static>> {
            vec![Cell::from(self.0)]
        }

        fn matches(&self, query: &str) -> bool {
            Matcher::new().matches(self.0, query)
        }
    }

    fn press(table: &mut Table<Name>, code: KeyCode) -> EventResult<TableEvent<Name>> {
        table
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn table() -> Table<Name> {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        Table::new(
            vec![Name("City Hall"), Name("Central Clinic"), Name("Tax Office")],
            resolver,
        )
    }

    #[test]
    fn test_navigation_clamps_at_ends() {
        let mut table = table();
        press(&mut table, KeyCode::Up);
        assert_eq!(table.selected(), Some(&Name("City Hall")));
        press(&mut table, KeyCode::End);
        press(&mut table, KeyCode::Down);
        assert_eq!(table.selected(), Some(&Name("Tax Office")));
    }

    #[test]
    fn test_enter_activates_selected_row() {
        let mut table = table();
        press(&mut table, KeyCode::Down);
        let EventResult::Event(TableEvent::Activated(item)) = press(&mut table, KeyCode::Enter)
        else {
            panic!("expected activation");
        };
        assert_eq!(item, Name("Central Clinic"));
    }

    #[test]
    fn test_search_filters_and_esc_clears() {
        let mut table = table();
        press(&mut table, KeyCode::Char('/'));
        for c in "tax".chars() {
            press(&mut table, KeyCode::Char(c));
        }
        assert_eq!(table.selected(), Some(&Name("Tax Office")));

        // Typing while searching must not quit or navigate.
        assert!(press(&mut table, KeyCode::Char('q')).is_consumed());
        press(&mut table, KeyCode::Esc);
        assert_eq!(table.visible.len(), 3);
    }

    #[test]
    fn test_empty_table_ignores_enter() {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        let mut table: Table<Name> = Table::new(vec![], resolver);
        assert_eq!(table.selected(), None);
        assert!(matches!(
            press(&mut table, KeyCode::Enter),
            EventResult::Ignored
        ));
    }

    #[test]
    fn test_set_items_keeps_cursor_in_range() {
        let mut table = table();
        press(&mut table, KeyCode::End);
        table.set_items(vec![Name("Only")]);
        assert_eq!(table.selected(), Some(&Name("Only")));
    }
}
