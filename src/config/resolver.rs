use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{DialogAction, GlobalAction, KioskAction, NavAction, SearchAction};
use crate::config::keybindings::{KeybindingsConfig, KioskKeybindings};
use crate::config::key::KeyBinding;

/// Maps key events to configured actions.
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    fn global(&self, action: GlobalAction) -> &KeyBinding {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => &kb.quit,
            GlobalAction::Help => &kb.help,
            GlobalAction::Back => &kb.back,
        }
    }

    fn nav(&self, action: NavAction) -> &KeyBinding {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => &kb.up,
            NavAction::Down => &kb.down,
            NavAction::PageUp => &kb.page_up,
            NavAction::PageDown => &kb.page_down,
            NavAction::Home => &kb.home,
            NavAction::End => &kb.end,
            NavAction::Select => &kb.select,
        }
    }

    fn search(&self, action: SearchAction) -> &KeyBinding {
        let kb = &self.keybindings.search;
        match action {
            SearchAction::Toggle => &kb.toggle,
            SearchAction::Exit => &kb.exit,
        }
    }

    fn kiosk(&self, action: KioskAction) -> &KeyBinding {
        let KioskKeybindings { reset, reload } = &self.keybindings.kiosk;
        match action {
            KioskAction::Reset => reset,
            KioskAction::Reload => reload,
        }
    }

    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        self.global(action).matches(event)
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        self.global(action).display()
    }

    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        self.nav(action).matches(event)
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        self.nav(action).display()
    }

    pub fn matches_search(&self, event: &KeyEvent, action: SearchAction) -> bool {
        self.search(action).matches(event)
    }

    pub fn display_search(&self, action: SearchAction) -> String {
        self.search(action).display()
    }

    pub fn matches_kiosk(&self, event: &KeyEvent, action: KioskAction) -> bool {
        self.kiosk(action).matches(event)
    }

    pub fn display_kiosk(&self, action: KioskAction) -> String {
        self.kiosk(action).display()
    }

    pub fn matches_dialog(&self, event: &KeyEvent, action: DialogAction) -> bool {
        match action {
            DialogAction::Dismiss => self.keybindings.dialog.dismiss.matches(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn resolver() -> KeyResolver {
        KeyResolver::new(Arc::new(KeybindingsConfig::default()))
    }

    #[test]
    fn test_reset_needs_ctrl() {
        let resolver = resolver();
        let ctrl_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        let plain_r = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);

        assert!(resolver.matches_kiosk(&ctrl_r, KioskAction::Reset));
        assert!(!resolver.matches_kiosk(&plain_r, KioskAction::Reset));
        assert!(resolver.matches_kiosk(&plain_r, KioskAction::Reload));
    }

    #[test]
    fn test_display_joins_alternatives() {
        let resolver = resolver();
        assert_eq!(resolver.display_nav(NavAction::Down), "j/Down");
        assert_eq!(resolver.display_kiosk(KioskAction::Reset), "ctrl+r");
    }
}
