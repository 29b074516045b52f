use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Cell;
use smartq_core::model::Service;

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction, SearchAction};
use crate::kiosk::message::KioskMsg;
use crate::search::Matcher;
use crate::ui::{
    ColumnDef, Component, EventResult, Keybinding, Result, Screen, Table, TableEvent, TableRow,
};

#[derive(Clone)]
struct ServiceRow(Service);

impl TableRow for ServiceRow {
    fn columns() -> &'static [ColumnDef] {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("Service", Constraint::Min(24)),
            ColumnDef::new("Counter", Constraint::Length(10)),
            ColumnDef::new("Avg. time", Constraint::Length(10)),
        ];
        COLUMNS
    }

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>> {
        let dim = Style::default().fg(theme.subtext0());
        let avg = self
            .0
            .avg_service_time
            .map_or_else(String::new, |m| format!("{m} min"));
        vec![
            Cell::from(self.0.name.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(self.0.counter_number.clone().unwrap_or_default()).style(dim),
            Cell::from(avg).style(dim),
        ]
    }

    fn matches(&self, query: &str) -> bool {
        Matcher::new().matches(&self.0.name, query)
    }
}

/// Services offered by the chosen organization.
pub struct ServicesScreen {
    organization: String,
    table: Table<ServiceRow>,
    resolver: Arc<KeyResolver>,
}

impl ServicesScreen {
    pub fn new(organization: &str, services: &[Service], resolver: Arc<KeyResolver>) -> Self {
        let rows = services.iter().cloned().map(ServiceRow).collect();
        Self {
            organization: organization.to_string(),
            table: Table::new(rows, resolver.clone())
                .with_title(format!(" {organization}: select a service "))
                .with_empty_message("No services available"),
            resolver,
        }
    }
}

impl Screen for ServicesScreen {
    type Output = KioskMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(match self.table.handle_key(key)? {
            EventResult::Event(TableEvent::Activated(row)) => KioskMsg::ServiceChosen(row.0.id).into(),
            EventResult::Consumed => EventResult::Consumed,
            EventResult::Ignored if self.resolver.matches_global(&key, GlobalAction::Back) => {
                KioskMsg::Back.into()
            }
            EventResult::Ignored => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.table.render(frame, area, theme);
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec![self.organization.clone(), "Services".to_string()]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_nav(NavAction::Select), "Choose"),
            Keybinding::hint(r.display_global(GlobalAction::Back), "Back"),
            Keybinding::new(r.display_search(SearchAction::Toggle), "Search"),
        ]
    }
}
