use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;
use crate::commands::Command;
use crate::ui::{EventResult, Keybinding};

pub enum ServiceMsg {
    /// Nothing for the App to do.
    Idle,
    /// Spawn these commands.
    Run(Vec<Box<dyn Command>>),
    /// Show a message the client has to acknowledge.
    Alert(String),
    /// The service is done; the App exits.
    Close,
}

impl<T: Command> From<T> for ServiceMsg {
    fn from(value: T) -> Self {
        Self::Run(vec![Box::new(value)])
    }
}

/// A full-screen mode of the application: the kiosk or the display board.
///
/// The App calls, in order:
///
/// 1. `init()` once at startup, then `update()`
/// 2. for each event, `handle_tick()` or `handle_key()` followed by `update()`
/// 3. `update()` whenever a command finishes
pub trait Service {
    /// Queue startup messages.
    fn init(&mut self) {}

    fn handle_tick(&mut self) {}

    fn handle_key(&mut self, key: KeyEvent) -> EventResult<()>;

    /// Drain the message queue.
    ///
    /// # Errors
    /// Returns an error if processing a message failed. The App shows it and
    /// keeps running.
    fn update(&mut self) -> Result<ServiceMsg>;

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    fn breadcrumbs(&self) -> Vec<String>;

    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }

    /// `(label, value)` pairs for the status bar.
    fn status(&self) -> Vec<(&'static str, String)> {
        vec![]
    }
}
