use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Cell;
use smartq_core::model::{Organization, OrganizationId};

use crate::Theme;
use crate::config::{KeyResolver, KioskAction, NavAction, SearchAction};
use crate::kiosk::message::KioskMsg;
use crate::search::Matcher;
use crate::ui::{
    ColumnDef, Component, EventResult, Keybinding, Result, Screen, Table, TableEvent, TableRow,
};

#[derive(Clone)]
struct OrganizationRow(Organization);

impl TableRow for OrganizationRow {
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("Organization", Constraint::Min(24)),
            ColumnDef::new("Location", Constraint::Min(16)),
            ColumnDef::new("Contact", Constraint::Length(16)),
        ];
        COLUMNS
    }

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>> {
        let dim = Style::default().fg(theme.subtext0());
        vec![
            Cell::from(self.0.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(self.0.location.clone().unwrap_or_default()).style(dim),
            Cell::from(self.0.contact.clone().unwrap_or_default()).style(dim),
        ]
    }

    fn matches(&self, query: &str) -> bool {
        Matcher::new().matches_any(
            [Some(self.0.name.as_str()), self.0.location.as_deref()],
            query,
        )
    }
}

/// First kiosk screen: pick where you are.
pub struct OrganizationsScreen {
    table: Table<OrganizationRow>,
    resolver: Arc<KeyResolver>,
}

impl OrganizationsScreen {
    pub fn new(organizations: &[Organization], resolver: Arc<KeyResolver>) -> Self {
        let rows = organizations.iter().cloned().map(OrganizationRow).collect();
        Self {
            table: Table::new(rows, resolver.clone())
                .with_title(" Select an organization ")
                .with_empty_message("No organizations available"),
            resolver,
        }
    }

    pub fn selected(&self) -> Option<OrganizationId> {
        self.table.selected().map(|row| row.0.id)
    }
}

impl Screen for OrganizationsScreen {
    type Output = KioskMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(match self.table.handle_key(key)? {
            EventResult::Event(TableEvent::Activated(row)) => {
                KioskMsg::OrganizationChosen(row.0.id).into()
            }
            EventResult::Consumed => EventResult::Consumed,
            EventResult::Ignored if self.resolver.matches_kiosk(&key, KioskAction::Reload) => {
                KioskMsg::LoadOrganizations.into()
            }
            EventResult::Ignored => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.table.render(frame, area, theme);
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec!["Organizations".to_string()]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_nav(NavAction::Select), "Choose"),
            Keybinding::hint(r.display_search(SearchAction::Toggle), "Search"),
            Keybinding::hint(r.display_kiosk(KioskAction::Reload), "Reload"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    fn screen() -> OrganizationsScreen {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        let mut clinic = Organization::new(2, "Central Clinic");
        clinic.location = Some("Huye".to_string());
        OrganizationsScreen::new(&[Organization::new(1, "City Hall"), clinic], resolver)
    }

    fn press(screen: &mut OrganizationsScreen, code: KeyCode) -> EventResult<KioskMsg> {
        screen
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn test_enter_chooses_highlighted_organization() {
        let mut screen = screen();
        press(&mut screen, KeyCode::Down);
        assert!(matches!(
            press(&mut screen, KeyCode::Enter),
            EventResult::Event(KioskMsg::OrganizationChosen(OrganizationId(2)))
        ));
    }

    #[test]
    fn test_search_by_location() {
        let mut screen = screen();
        press(&mut screen, KeyCode::Char('/'));
        for c in "huye".chars() {
            press(&mut screen, KeyCode::Char(c));
        }
        assert_eq!(screen.selected(), Some(OrganizationId(2)));
    }

    #[test]
    fn test_reload_key_outside_search() {
        let mut screen = screen();
        assert!(matches!(
            press(&mut screen, KeyCode::Char('r')),
            EventResult::Event(KioskMsg::LoadOrganizations)
        ));
    }
}
