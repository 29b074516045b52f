use std::collections::BTreeMap;
use std::sync::Arc;

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::Theme;
use crate::commands::Command;
use crate::config::{GlobalAction, KeyResolver};
use crate::service::{Service, ServiceMsg};
use crate::tui::{Event, Tui};
use crate::ui::{AlertDialog, AlertEvent, Component, EventResult, HelpEvent, HelpOverlay, StatusBar};

const FRAME_RATE: f64 = 30.0;
const TICK_RATE: f64 = 4.0;

type CommandId = u64;

/// Messages from spawned commands back to the App.
#[derive(Debug)]
pub enum AppMessage {
    CommandFinished { id: CommandId, error: Option<String> },
}

/// Owns the terminal loop and the active service.
pub struct App {
    service: Box<dyn Service>,
    resolver: Arc<KeyResolver>,
    theme: Theme,
    status_bar: StatusBar,
    alert: Option<AlertDialog>,
    help: Option<HelpOverlay>,
    running: BTreeMap<CommandId, String>,
    next_command_id: CommandId,
    should_quit: bool,
    msg_tx: UnboundedSender<AppMessage>,
    msg_rx: UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(
        service: Box<dyn Service>,
        server: &str,
        resolver: Arc<KeyResolver>,
        theme: Theme,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            service,
            status_bar: StatusBar::new(server, resolver.clone()),
            resolver,
            theme,
            alert: None,
            help: None,
            running: BTreeMap::new(),
            next_command_id: 0,
            should_quit: false,
            msg_tx,
            msg_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;

        self.service.init();
        self.update_service();

        while !self.should_quit {
            tokio::select! {
                event = tui.next_event() => match event {
                    Some(event) => self.handle_event(&mut tui, event)?,
                    None => break,
                },
                Some(msg) = self.msg_rx.recv() => self.handle_message(msg),
            }
        }

        tui.exit()?;
        info!("Exiting");
        Ok(())
    }

    fn handle_event(&mut self, tui: &mut Tui, event: Event) -> Result<()> {
        match event {
            Event::Quit => self.should_quit = true,
            Event::Tick => {
                self.service.handle_tick();
                self.update_service();
            }
            Event::Render => {
                tui.draw(|frame| self.render(frame))?;
            }
            Event::Resize(width, height) => {
                tui.resize(Rect::new(0, 0, width, height))?;
                tui.draw(|frame| self.render(frame))?;
            }
            Event::Key(key) => {
                self.handle_key(key);
                self.update_service();
            }
            Event::Error(e) => warn!(error = %e, "Terminal event error"),
        }
        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::CommandFinished { id, error } => {
                let name = self.running.remove(&id).unwrap_or_default();
                if let Some(e) = error {
                    error!(command = %name, error = %e, "Command failed");
                }
                // Results arrive on the service's own channel.
                self.update_service();
            }
        }
    }

    /// Dialogs first, then the service, then global keys.
    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(alert) = &mut self.alert {
            if let Ok(EventResult::Event(AlertEvent::Dismissed)) = alert.handle_key(key) {
                self.alert = None;
            }
            return;
        }
        if let Some(help) = &mut self.help {
            if let Ok(EventResult::Event(HelpEvent::Close)) = help.handle_key(key) {
                self.help = None;
            }
            return;
        }

        if self.service.handle_key(key).is_consumed() {
            return;
        }

        if self.resolver.matches_global(&key, GlobalAction::Quit) {
            self.should_quit = true;
        } else if self.resolver.matches_global(&key, GlobalAction::Help) {
            self.help = Some(HelpOverlay::new(
                self.service.keybindings(),
                self.status_bar.global_keybindings(),
                self.resolver.clone(),
            ));
        }
    }

    /// Drain the service until it has nothing more to say.
    fn update_service(&mut self) {
        loop {
            match self.service.update() {
                Ok(ServiceMsg::Idle) => break,
                Ok(ServiceMsg::Run(commands)) => {
                    for command in commands {
                        self.spawn(command);
                    }
                }
                Ok(ServiceMsg::Alert(message)) => {
                    info!(%message, "Alert");
                    self.alert = Some(AlertDialog::new(message, self.resolver.clone()));
                }
                Ok(ServiceMsg::Close) => {
                    self.should_quit = true;
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Service update failed");
                    self.alert = Some(AlertDialog::new(e.to_string(), self.resolver.clone()));
                    break;
                }
            }
        }
    }

    fn spawn(&mut self, command: Box<dyn Command>) {
        let id = self.next_command_id;
        self.next_command_id += 1;
        let name = command.name();
        debug!(id, %name, "Spawning command");
        self.running.insert(id, name);

        let tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let error = command.execute().await.err().map(|e| e.to_string());
            let _ = tx.send(AppMessage::CommandFinished { id, error });
        });
    }

    fn render(&mut self, frame: &mut Frame) {
        let [crumbs, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(StatusBar::height()),
        ])
        .areas(frame.area());

        self.render_breadcrumbs(frame, crumbs);
        self.service.render(frame, body, &self.theme);

        let running: Vec<String> = self.running.values().cloned().collect();
        self.status_bar.render(
            frame,
            status,
            &self.theme,
            &self.service.status(),
            &running,
            &self.service.keybindings(),
        );

        if let Some(help) = &mut self.help {
            help.render(frame, body, &self.theme);
        }
        if let Some(alert) = &mut self.alert {
            alert.render(frame, body, &self.theme);
        }
    }

    fn render_breadcrumbs(&self, frame: &mut Frame, area: Rect) {
        let crumbs = self.service.breadcrumbs();
        let last = crumbs.len().saturating_sub(1);
        let mut spans = vec![Span::raw(" ")];
        for (i, crumb) in crumbs.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" › ", Style::default().fg(self.theme.overlay0())));
            }
            let style = if i == last {
                Style::default()
                    .fg(self.theme.lavender())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.subtext0())
            };
            spans.push(Span::styled(crumb, style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}
