//! Configuration loading and parsing

use anyhow::{Context, Result};
use etw_export::{parse_keyword, CategoryRegistry, ExportConfig, Keyword};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

/// The simulated controller session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Keyword as passed to a trace controller, e.g. "0x8000000000000009"
    pub keyword: Option<String>,
    /// Alternative to `keyword`: category names to enable
    #[serde(default)]
    pub categories: Vec<String>,
    /// Whether a consumer is attached at all
    #[serde(default = "default_true")]
    pub listener_active: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keyword: None,
            categories: Vec::new(),
            listener_active: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Where exported events go (default: stdout)
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// One scripted trace event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventConfig {
    /// Single-character phase code ("B", "E", "X", "I", ...)
    pub phase: String,
    pub category_group: String,
    pub name: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub args: Vec<ArgConfig>,
    /// How many times the event is emitted
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    /// Follow each emission with a "Complete End" event
    #[serde(default)]
    pub complete_end: bool,
}

fn default_repeat() -> usize {
    1
}

/// A scripted argument; tables and arrays become convertable values
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArgConfig {
    pub name: String,
    pub value: toml::Value,
}

impl SessionConfig {
    /// Resolve the keyword the session should run with
    ///
    /// An explicit keyword wins over a category list. `None` means the
    /// session does not select any keyword.
    pub fn resolve_keyword(&self, registry: &CategoryRegistry) -> Result<Option<Keyword>> {
        if let Some(text) = &self.keyword {
            let keyword = parse_keyword(text)?;
            return Ok(Some(keyword));
        }
        if !self.categories.is_empty() {
            let keyword = registry
                .keyword_for(&self.categories)
                .context("Failed to build keyword from session categories")?;
            return Ok(Some(keyword));
        }
        Ok(None)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .export
        .validate()
        .with_context(|| format!("Invalid [export] section in {:?}", path))?;

    Ok(config)
}
