use crate::storage::Storage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const THEME_STORAGE_KEY: &str = "theme";

/// Theme chosen on the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Theme actually applied once `System` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveTheme {
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn resolve(self, system_prefers_dark: bool) -> EffectiveTheme {
        match self {
            Theme::Light => EffectiveTheme::Light,
            Theme::Dark => EffectiveTheme::Dark,
            Theme::System if system_prefers_dark => EffectiveTheme::Dark,
            Theme::System => EffectiveTheme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{other}' (expected light, dark or system)")),
        }
    }
}

impl EffectiveTheme {
    pub fn is_dark(self) -> bool {
        self == EffectiveTheme::Dark
    }

    /// Value for the `theme-color` meta tag.
    pub fn meta_color(self) -> &'static str {
        match self {
            EffectiveTheme::Dark => "#121212",
            EffectiveTheme::Light => "#F9FAFB",
        }
    }
}

/// Persisted theme preference, stored as the bare mode name.
#[derive(Clone)]
pub struct ThemeStore {
    storage: Arc<dyn Storage>,
    theme: Arc<RwLock<Theme>>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let theme = match storage.get_item(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring stored theme: {}", e);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::error!("Failed to read theme from storage: {}", e);
                Theme::default()
            }
        };
        Self {
            storage,
            theme: Arc::new(RwLock::new(theme)),
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.read()
    }

    /// Applies `theme` for this session and persists it when possible.
    pub fn set_theme(&self, theme: Theme) {
        *self.theme.write() = theme;
        if let Err(e) = self.storage.set_item(THEME_STORAGE_KEY, theme.as_str()) {
            log::error!("Failed to save theme to storage: {}", e);
        }
    }

    pub fn effective(&self, system_prefers_dark: bool) -> EffectiveTheme {
        self.theme().resolve(system_prefers_dark)
    }
}
