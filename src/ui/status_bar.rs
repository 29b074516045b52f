use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction};
use crate::ui::Keybinding;

const LOGO: &[&str] = &[
    r"  ___                _    ___  ",
    r" / __|_ __  __ _ _ _| |_ / _ \ ",
    r" \__ \ '  \/ _` | '_|  _| (_) |",
    r" |___/_|_|_\__,_|_|  \__|\__\_\",
];

/// Bottom bar: status facts, key hints, logo.
pub struct StatusBar {
    server: String,
    resolver: Arc<KeyResolver>,
}

impl StatusBar {
    pub fn new(server: impl Into<String>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            server: server.into(),
            resolver,
        }
    }

    pub const fn height() -> u16 {
        LOGO.len() as u16 + 2
    }

    /// `status` is a list of `(label, value)` pairs from the active service;
    /// `running` names the commands currently in flight.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        status: &[(&'static str, String)],
        running: &[String],
        local_keybindings: &[Keybinding],
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.surface1()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [info, keys, logo] = Layout::horizontal([
            Constraint::Length(42),
            Constraint::Min(20),
            Constraint::Length(33),
        ])
        .areas(inner);

        self.render_status_info(frame, info, theme, status, running);
        self.render_keybindings(frame, keys, theme, local_keybindings);
        render_logo(frame, logo, theme);
    }

    fn render_status_info(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        status: &[(&'static str, String)],
        running: &[String],
    ) {
        let w = area.width as usize;
        let label_style = Style::default().fg(theme.overlay1());
        let value_style = Style::default().fg(theme.text());

        let mut lines = vec![status_line(
            "server",
            &self.server,
            w,
            label_style,
            Style::default().fg(theme.teal()),
        )];
        lines.extend(
            status
                .iter()
                .map(|(label, value)| status_line(label, value, w, label_style, value_style)),
        );
        if let Some(name) = running.first() {
            lines.push(status_line(
                "busy",
                name,
                w,
                label_style,
                Style::default().fg(theme.yellow()),
            ));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_keybindings(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        local_keybindings: &[Keybinding],
    ) {
        let global = self.global_keybindings();
        let hints: Vec<&Keybinding> = local_keybindings
            .iter()
            .chain(global.iter())
            .filter(|kb| kb.hint)
            .collect();
        if hints.is_empty() || area.height == 0 {
            return;
        }

        // Align the separators into one vertical line per column.
        let key_w = hints.iter().map(|kb| kb.key.len()).max().unwrap_or(1);
        let desc_w = hints.iter().map(|kb| kb.description.len()).max().unwrap_or(1);
        let col_width = u16::try_from(key_w + 3 + desc_w + 2).unwrap_or(u16::MAX);
        let num_cols = (area.width / col_width).max(1) as usize;
        let num_rows = area.height as usize;

        let mut columns: Vec<Vec<Line>> = vec![Vec::new(); num_cols];
        for (i, kb) in hints.iter().enumerate() {
            let Some(column) = columns.get_mut(i / num_rows) else {
                break;
            };
            column.push(Line::from(vec![
                Span::styled(
                    format!("{:>key_w$}", kb.key),
                    Style::default().fg(theme.peach()),
                ),
                Span::styled(" │ ", Style::default().fg(theme.surface2())),
                Span::styled(kb.description.clone(), Style::default().fg(theme.subtext0())),
            ]));
        }

        let areas = Layout::horizontal(vec![Constraint::Length(col_width); num_cols]).split(area);
        for (lines, col_area) in columns.into_iter().zip(areas.iter()) {
            frame.render_widget(Paragraph::new(lines), *col_area);
        }
    }

    /// Keys available on every screen; also listed in the help overlay.
    pub fn global_keybindings(&self) -> Vec<Keybinding> {
        let r = &self.resolver;
        vec![
            Keybinding::hint(r.display_global(GlobalAction::Help), "Help"),
            Keybinding::hint(r.display_global(GlobalAction::Quit), "Quit"),
            Keybinding::new(r.display_global(GlobalAction::Back), "Back"),
            Keybinding::new(r.display_nav(NavAction::Select), "Select"),
            Keybinding::new(
                format!(
                    "{}/{}",
                    r.display_nav(NavAction::Up),
                    r.display_nav(NavAction::Down)
                ),
                "Navigate",
            ),
        ]
    }
}

fn render_logo(frame: &mut Frame, area: Rect, theme: &Theme) {
    let style = Style::default()
        .fg(theme.mauve())
        .add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = LOGO
        .iter()
        .map(|line| Line::from(Span::styled(*line, style)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn status_line<'a>(
    label: &'a str,
    value: &str,
    max_width: usize,
    label_style: Style,
    value_style: Style,
) -> Line<'a> {
    const LABEL_W: usize = 9;
    let available = max_width.saturating_sub(LABEL_W + 1);
    Line::from(vec![
        Span::styled(format!("{label:>LABEL_W$}"), label_style),
        Span::raw(" "),
        Span::styled(truncate(value, available), value_style),
    ])
}

/// Shorten to `max_width` chars, ending in "..." when cut.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return s.chars().take(max_width).collect();
    }
    let mut out: String = s.chars().take(max_width - 3).collect();
    out.push_str("...");
    out
}
