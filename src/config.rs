use crate::error::{Result, ResultExt as _};
use crate::history::DEFAULT_MAX_HISTORY;
use crate::io::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MAX_HISTORY_ENV: &str = "TIDYFRAME_MAX_HISTORY";

/// Settings for a [`crate::store::DatasetStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of history entries kept (at least 1)
    pub max_history: usize,
    /// Rows scanned to infer CSV column types
    pub infer_schema_length: usize,
    /// Lines sampled when sniffing the CSV separator
    pub sniff_lines: usize,
    /// Whether CSV import tries to parse date-like strings
    pub try_parse_dates: bool,
    /// Rows returned by a page request with `limit == 0`
    pub default_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            infer_schema_length: 10_000,
            sniff_lines: 10,
            try_parse_dates: true,
            default_page_size: 100,
        }
    }
}

impl StoreConfig {
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history.max(1);
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            infer_schema_length: self.infer_schema_length,
            sniff_lines: self.sniff_lines,
            try_parse_dates: self.try_parse_dates,
        }
    }

    /// Reads a JSON config file; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config.normalized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).context("Failed to write config")?;
        Ok(())
    }

    /// The user config file if present (defaults otherwise), then the
    /// environment override for the history depth.
    pub fn load_default() -> Self {
        let mut config = match get_config_path() {
            Some(path) if path.exists() => Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        };

        if let Ok(raw) = std::env::var(MAX_HISTORY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) => config = config.with_max_history(depth),
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid {MAX_HISTORY_ENV}"),
            }
        }

        config.normalized()
    }

    fn normalized(mut self) -> Self {
        self.max_history = self.max_history.max(1);
        self.sniff_lines = self.sniff_lines.max(1);
        if self.default_page_size == 0 {
            self.default_page_size = Self::default().default_page_size;
        }
        self
    }
}

/// `<config_dir>/tidyframe/config.json`
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tidyframe").join("config.json"))
}
