use std::sync::Arc;

use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use smartq_core::model::Ticket;

use crate::Theme;
use crate::config::{KeyResolver, KioskAction, NavAction};
use crate::kiosk::message::KioskMsg;
use crate::ui::{EventResult, Keybinding, Result, Screen};

/// The ticket card shown after a successful join.
pub struct TicketScreen {
    ticket: Ticket,
    organization: String,
    service: String,
    issued_at: DateTime<Local>,
    resolver: Arc<KeyResolver>,
}

impl TicketScreen {
    pub fn new(
        ticket: Ticket,
        organization: &str,
        service: &str,
        resolver: Arc<KeyResolver>,
    ) -> Self {
        Self {
            ticket,
            organization: organization.to_string(),
            service: service.to_string(),
            issued_at: Local::now(),
            resolver,
        }
    }

    fn detail_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let label = Style::default().fg(theme.overlay1());
        let value = Style::default().fg(theme.text()).add_modifier(Modifier::BOLD);
        let row = |name: &'static str, text: String| {
            Line::from(vec![
                Span::styled(format!("{name:>16}  "), label),
                Span::styled(format!("{text:<16}"), value),
            ])
        };
        vec![
            row("Counter", self.ticket.counter.clone()),
            row("Position", self.ticket.position.to_string()),
            row("Estimated wait", format!("{} min", self.ticket.estimated_wait)),
            row("Service", self.service.clone()),
            row("Issued", self.issued_at.format("%H:%M").to_string()),
        ]
    }
}

impl Screen for TicketScreen {
    type Output = KioskMsg;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let done = self.resolver.matches_nav(&key, NavAction::Select)
            || self.resolver.matches_kiosk(&key, KioskAction::Reload);
        Ok(if done {
            KioskMsg::Reset.into()
        } else {
            EventResult::Ignored
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let card = area.centered(Constraint::Max(48), Constraint::Length(15));

        let mut lines = vec![
            Line::from(Span::styled(
                "Your number",
                Style::default().fg(theme.subtext0()),
            )),
            Line::from(Span::styled(
                self.ticket.queue_number.clone(),
                Style::default()
                    .fg(theme.green())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(self.detail_lines(theme));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Please wait for your number to be called",
            Style::default().fg(theme.yellow()),
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "{} when done",
                self.resolver.display_nav(NavAction::Select)
            ),
            Style::default().fg(theme.overlay0()),
        )));

        let block = Block::default()
            .title(format!(" {} ", self.organization))
            .title_alignment(Alignment::Center)
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(theme.green()));

        frame.render_widget(
            Paragraph::new(lines).block(block).alignment(Alignment::Center),
            card,
        );
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec![
            self.organization.clone(),
            self.service.clone(),
            format!("Ticket {}", self.ticket.queue_number),
        ]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        vec![Keybinding::hint(
            self.resolver.display_nav(NavAction::Select),
            "New ticket",
        )]
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::keybindings::KeybindingsConfig;

    fn screen() -> TicketScreen {
        let resolver = Arc::new(KeyResolver::new(Arc::new(KeybindingsConfig::default())));
        let ticket = Ticket {
            queue_number: "A1".to_string(),
            counter: "2".to_string(),
            position: 3,
            estimated_wait: 15,
        };
        TicketScreen::new(ticket, "City Hall", "Billing", resolver)
    }

    #[test]
    fn test_card_shows_ticket_fields() {
        let mut screen = screen();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| screen.render(frame, frame.area(), &Theme::default()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("A1"));
        assert!(text.contains("Counter"));
        assert!(text.contains("15 min"));
        assert!(text.contains("Position"));
    }

    #[test]
    fn test_enter_or_r_starts_over() {
        let mut screen = screen();
        for code in [KeyCode::Enter, KeyCode::Char('r')] {
            assert!(matches!(
                screen
                    .handle_key(KeyEvent::new(code, KeyModifiers::NONE))
                    .unwrap(),
                EventResult::Event(KioskMsg::Reset)
            ));
        }
        assert!(matches!(
            screen
                .handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE))
                .unwrap(),
            EventResult::Ignored
        ));
    }
}
