use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};
use smartq_core::model::DisplayStatus;

use crate::Theme;

const MISSING: &str = "—";

/// Rows of the board plus when they were last refreshed.
#[derive(Default)]
pub struct BoardView {
    rows: Vec<DisplayStatus>,
    refreshed_at: Option<DateTime<Local>>,
    stale: bool,
}

impl BoardView {
    pub fn replace(&mut self, rows: Vec<DisplayStatus>) {
        self.rows = rows;
        self.refreshed_at = Some(Local::now());
        self.stale = false;
    }

    /// Keep showing the previous rows, flagged as outdated.
    pub const fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn rows(&self) -> &[DisplayStatus] {
        &self.rows
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [table_area, footer] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

        let header = Row::new(
            ["Service", "Counter", "Now serving", "Next", "Waiting"].map(|h| {
                Cell::from(h).style(
                    Style::default()
                        .fg(theme.header())
                        .add_modifier(Modifier::BOLD),
                )
            }),
        )
        .style(Style::default().bg(theme.surface0()));

        let rows = self.rows.iter().map(|s| {
            Row::new(vec![
                Cell::from(s.service_name.clone()).style(Style::default().fg(theme.text())),
                Cell::from(or_missing(s.counter.as_deref())).style(Style::default().fg(theme.subtext1())),
                Cell::from(or_missing(s.now_serving.as_deref())).style(
                    Style::default()
                        .fg(theme.green())
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(or_missing(s.next.as_deref())).style(Style::default().fg(theme.peach())),
                Cell::from(s.waiting.to_string()).style(Style::default().fg(theme.text())),
            ])
        });

        let block = Block::default()
            .title(" Now serving ")
            .title_style(
                Style::default()
                    .fg(theme.mauve())
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));

        let table = Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(9),
                Constraint::Length(13),
                Constraint::Length(10),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(block);
        frame.render_widget(table, table_area);

        let refreshed = self.refreshed_at.map_or_else(
            || "waiting for first update".to_string(),
            |t| format!("updated {}", t.format("%H:%M:%S")),
        );
        let mut spans = vec![Span::styled(refreshed, Style::default().fg(theme.overlay1()))];
        if self.stale {
            spans.push(Span::styled(
                "  (connection problem, showing last known state)",
                Style::default().fg(theme.red()),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).right_aligned(), footer);
    }
}

fn or_missing(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn rendered(view: &BoardView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 10)).unwrap();
        terminal
            .draw(|frame| view.render(frame, frame.area(), &Theme::default()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_absent_values_show_dash() {
        let mut view = BoardView::default();
        view.replace(vec![DisplayStatus {
            service_name: "Records".to_string(),
            counter: Some("7".to_string()),
            now_serving: None,
            next: None,
            waiting: 0,
        }]);
        let text = rendered(&view);
        assert!(text.contains("Records"));
        assert!(text.contains(MISSING));
        assert!(text.contains("updated"));
    }

    #[test]
    fn test_stale_keeps_rows() {
        let mut view = BoardView::default();
        view.replace(vec![DisplayStatus {
            service_name: "Billing".to_string(),
            counter: None,
            now_serving: Some("BIL003".to_string()),
            next: Some("BIL004".to_string()),
            waiting: 4,
        }]);
        view.mark_stale();
        let text = rendered(&view);
        assert!(text.contains("BIL003"));
        assert!(text.contains("connection problem"));
    }
}
