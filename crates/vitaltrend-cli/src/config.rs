use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;
use vitaltrend_core::{parse_days_param, Window};

static CONFIG: OnceLock<VitaltrendConfig> = OnceLock::new();

pub const DEFAULT_DAYS_ENV: &str = "VITALTREND_DEFAULT_DAYS";
const DEFAULT_GAP_MARKER: &str = "-";

/// `<config_dir>/vitaltrend/config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VitaltrendConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowConfig {
    pub default_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    /// Printed in place of a day without data.
    pub gap_marker: Option<String>,
}

impl VitaltrendConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vitaltrend").join("config.toml"))
    }

    fn read() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn load() -> &'static VitaltrendConfig {
        CONFIG.get_or_init(Self::read)
    }

    /// Window length used when `--days` is not given.
    /// Priority: VITALTREND_DEFAULT_DAYS env var > config.toml > 7.
    /// Both sources go through the same 7-or-30 selector.
    pub fn default_days(&self) -> u32 {
        if let Ok(raw) = std::env::var(DEFAULT_DAYS_ENV) {
            return parse_days_param(Some(&raw));
        }
        match self.window.default_days {
            Some(days) => parse_days_param(Some(&days.to_string())),
            None => Window::DEFAULT_DAYS,
        }
    }

    pub fn gap_marker(&self) -> &str {
        self.display
            .gap_marker
            .as_deref()
            .filter(|marker| !marker.is_empty())
            .unwrap_or(DEFAULT_GAP_MARKER)
    }
}
