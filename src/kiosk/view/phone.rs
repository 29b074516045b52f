use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use smartq_core::model::MIN_PHONE_LEN;

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction};
use crate::kiosk::message::KioskMsg;
use crate::ui::{Component, EventResult, Keybinding, Result, Screen, TextInput, TextInputEvent};

/// Longest number the backend stores.
const MAX_PHONE_LEN: usize = 15;

fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | ' ' | '-')
}

pub struct PhoneScreen {
    organization: String,
    service: String,
    input: TextInput,
    resolver: Arc<KeyResolver>,
}

impl PhoneScreen {
    pub fn new(organization: &str, service: &str, resolver: Arc<KeyResolver>) -> Self {
        Self {
            organization: organization.to_string(),
            service: service.to_string(),
            input: TextInput::new("Phone number")
                .with_placeholder(format!("at least {MIN_PHONE_LEN} digits"))
                .with_max_len(MAX_PHONE_LEN)
                .with_filter(is_phone_char),
            resolver,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }
}

impl Screen for PhoneScreen {
    type Output = KioskMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(match self.input.handle_key(key)? {
            EventResult::Event(TextInputEvent::Submitted(phone)) => {
                KioskMsg::PhoneSubmitted(phone).into()
            }
            EventResult::Event(TextInputEvent::Cancelled) => KioskMsg::Back.into(),
            EventResult::Consumed => EventResult::Consumed,
            EventResult::Ignored => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let form = area.centered(Constraint::Max(60), Constraint::Length(8));
        let [summary, input, hint] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .areas(form);

        let label = Style::default().fg(theme.overlay1());
        let value = Style::default()
            .fg(theme.lavender())
            .add_modifier(Modifier::BOLD);
        let summary_lines = vec![
            Line::from(vec![
                Span::styled("Organization  ", label),
                Span::styled(self.organization.as_str(), value),
            ]),
            Line::from(vec![
                Span::styled("Service       ", label),
                Span::styled(self.service.as_str(), value),
            ]),
        ];
        frame.render_widget(Paragraph::new(summary_lines), summary);

        self.input.render(frame, input, theme);

        let hint_text = format!(
            "{} to join the queue, {} to go back",
            self.resolver.display_nav(NavAction::Select),
            self.resolver.display_global(GlobalAction::Back)
        );
        frame.render_widget(
            Paragraph::new(hint_text)
                .style(Style::default().fg(theme.subtext0()))
                .centered(),
            hint,
        );
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec![self.organization.clone(), self.service.clone(), "Phone".to_string()]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_nav(NavAction::Select), "Join queue"),
            Keybinding::hint(r.display_global(GlobalAction::Back), "Back"),
        ]
    }
}
