pub mod actions;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::load;
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Catppuccin Mocha".to_string(),
        }
    }
}

/// Where the SmartQ backend lives and how often the board polls it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub poll_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.base_url, "http://localhost:5000");
        assert_eq!(config.server.poll_interval_secs, 5);
        assert_eq!(config.theme.name, "Catppuccin Mocha");
    }

    #[test]
    fn test_partial_server_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            base_url = "https://queue.example.rw"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "https://queue.example.rw");
        assert_eq!(config.server.poll_interval_secs, 5);
    }

    #[test]
    fn test_keybinding_override() {
        let config: AppConfig = toml::from_str(
            r#"
            [keybindings.kiosk]
            reset = "F5"
            "#,
        )
        .unwrap();
        let f5 = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        assert!(config.keybindings.kiosk.reset.matches(&f5));
        // Untouched sections keep their defaults.
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(config.keybindings.global.quit.matches(&q));
    }
}
