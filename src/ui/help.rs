use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, SearchAction};
use crate::ui::{Component, EventResult, Result};

pub struct Keybinding {
    pub key: String,
    pub description: String,
    /// Also shown in the status bar hints.
    pub hint: bool,
}

impl Keybinding {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            hint: false,
        }
    }

    pub fn hint(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            hint: true,
            ..Self::new(key, description)
        }
    }
}

pub enum HelpEvent {
    Close,
}

/// Full list of keys for the current screen.
pub struct HelpOverlay {
    sections: Vec<(String, Vec<Keybinding>)>,
    resolver: Arc<KeyResolver>,
}

impl HelpOverlay {
    pub fn new(screen: Vec<Keybinding>, global: Vec<Keybinding>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            sections: vec![
                ("This screen".to_string(), screen),
                ("Everywhere".to_string(), global),
            ],
            resolver,
        }
    }
}

impl Component for HelpOverlay {
    type Output = HelpEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let closes = self.resolver.matches_global(&key, GlobalAction::Help)
            || self.resolver.matches_global(&key, GlobalAction::Quit)
            || self.resolver.matches_search(&key, SearchAction::Exit);
        Ok(if closes {
            HelpEvent::Close.into()
        } else {
            EventResult::Consumed
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup = area.centered(Constraint::Percentage(60), Constraint::Percentage(70));
        frame.render_widget(Clear, popup);

        let key_style = Style::default()
            .fg(theme.peach())
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(theme.text());
        let section_style = Style::default()
            .fg(theme.subtext0())
            .add_modifier(Modifier::BOLD);

        let mut lines = Vec::new();
        for (title, keybindings) in self.sections.iter().filter(|(_, kbs)| !kbs.is_empty()) {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(format!("── {title} ──"), section_style)));
            for kb in keybindings {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:>12}", kb.key), key_style),
                    Span::raw("  "),
                    Span::styled(kb.description.clone(), desc_style),
                ]));
            }
        }

        let close = self.resolver.display_global(GlobalAction::Help);
        let block = Block::default()
            .title(format!(" Help ({close} to close) "))
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender()))
            .style(Style::default().bg(theme.base()));

        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}
