pub mod components;
pub mod widgets;

mod alert;
mod help;
mod status_bar;

pub use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::Theme;

pub use alert::{AlertDialog, AlertEvent};
pub use components::{ColumnDef, Table, TableEvent, TableRow, TextInput, TextInputEvent};
pub use help::{HelpEvent, HelpOverlay, Keybinding};
pub use status_bar::StatusBar;
pub use widgets::Spinner;

/// Result of handling an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult<E> {
    /// Input was not handled, parent should process it.
    Ignored,
    /// Input was consumed but produced no event.
    Consumed,
    /// Input was consumed and produced an event.
    Event(E),
}

impl<E> EventResult<E> {
    pub const fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

impl<E> From<E> for EventResult<E> {
    fn from(event: E) -> Self {
        Self::Event(event)
    }
}

/// Reusable widget that handles keys and emits generic outputs.
///
/// Components know nothing about queues; screens translate their outputs
/// into kiosk messages.
pub trait Component {
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        _ = key;
        Ok(EventResult::Ignored)
    }

    /// Called on each tick for animations.
    fn handle_tick(&mut self) {}

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
}

/// Full-page view that connects components to a service's messages.
pub trait Screen {
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>>;

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    fn handle_tick(&mut self) {}

    /// Breadcrumb segments for navigation context.
    fn breadcrumbs(&self) -> Vec<String> {
        vec![]
    }

    fn keybindings(&self) -> Vec<Keybinding> {
        vec![]
    }
}
