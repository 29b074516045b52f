use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use smartq_core::QueueApi;
use smartq_core::model::{DisplayStatus, OrganizationId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::Theme;
use crate::board::command::FetchDisplayStatusCmd;
use crate::board::view::BoardView;
use crate::config::{GlobalAction, KeyResolver, KioskAction};
use crate::service::{Service, ServiceMsg};
use crate::ui::{EventResult, Keybinding};

#[derive(Debug)]
pub enum BoardMsg {
    Refresh,
    Loaded(Vec<DisplayStatus>),
    Failed(String),
    Close,
}

/// Polls the display status of one organization.
pub struct BoardService {
    api: Arc<dyn QueueApi>,
    org: OrganizationId,
    poll_interval: Duration,
    last_poll: Option<Instant>,
    in_flight: bool,
    view: BoardView,
    resolver: Arc<KeyResolver>,
    msg_tx: UnboundedSender<BoardMsg>,
    msg_rx: UnboundedReceiver<BoardMsg>,
}

impl BoardService {
    pub fn new(
        api: Arc<dyn QueueApi>,
        org: OrganizationId,
        poll_interval: Duration,
        resolver: Arc<KeyResolver>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            api,
            org,
            poll_interval,
            last_poll: None,
            in_flight: false,
            view: BoardView::default(),
            resolver,
            msg_tx,
            msg_rx,
        }
    }

    fn queue(&self, msg: BoardMsg) {
        let _ = self.msg_tx.send(msg);
    }

    fn process_message(&mut self, msg: BoardMsg) -> ServiceMsg {
        match msg {
            BoardMsg::Refresh => {
                if self.in_flight {
                    return ServiceMsg::Idle;
                }
                self.in_flight = true;
                self.last_poll = Some(Instant::now());
                FetchDisplayStatusCmd::new(self.api.clone(), self.org, self.msg_tx.clone()).into()
            }
            BoardMsg::Loaded(rows) => {
                debug!(org = %self.org, rows = rows.len(), "Board refreshed");
                self.in_flight = false;
                self.view.replace(rows);
                ServiceMsg::Idle
            }
            BoardMsg::Failed(error) => {
                warn!(org = %self.org, %error, "Board refresh failed");
                self.in_flight = false;
                self.view.mark_stale();
                ServiceMsg::Idle
            }
            BoardMsg::Close => ServiceMsg::Close,
        }
    }

    fn poll_due(&self) -> bool {
        !self.in_flight
            && self
                .last_poll
                .is_none_or(|at| at.elapsed() >= self.poll_interval)
    }
}

impl Service for BoardService {
    fn init(&mut self) {
        self.queue(BoardMsg::Refresh);
    }

    fn handle_tick(&mut self) {
        if self.poll_due() {
            self.queue(BoardMsg::Refresh);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()> {
        if self.resolver.matches_kiosk(&key, KioskAction::Reload) {
            self.queue(BoardMsg::Refresh);
            return EventResult::Consumed;
        }
        if self.resolver.matches_global(&key, GlobalAction::Back) {
            self.queue(BoardMsg::Close);
            return EventResult::Consumed;
        }
        EventResult::Ignored
    }

    fn update(&mut self) -> Result<ServiceMsg> {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match self.process_message(msg) {
                ServiceMsg::Idle => {}
                other => return Ok(other),
            }
        }
        Ok(ServiceMsg::Idle)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.view.render(frame, area, theme);
    }

    fn breadcrumbs(&self) -> Vec<String> {
        vec!["Board".to_string(), format!("Organization {}", self.org)]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        vec![
            Keybinding::hint(self.resolver.display_kiosk(KioskAction::Reload), "Refresh"),
            Keybinding::hint(self.resolver.display_global(GlobalAction::Back), "Close board"),
        ]
    }

    fn status(&self) -> Vec<(&'static str, String)> {
        let refreshed = self
            .view
            .refreshed_at()
            .map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S").to_string());
        vec![
            ("org", self.org.to_string()),
            ("services", self.view.rows().len().to_string()),
            ("refreshed", refreshed),
        ]
    }
}
