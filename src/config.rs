use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::model::issue::LabelSpec;
use crate::sync::pacing::PacingConfig;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub csv: PathBuf,
    /// Named at the bottom of every issue body.
    pub source_note: String,
    /// Seconds to wait after the intro message before touching the tracker.
    pub grace_secs: u64,
    pub journal: bool,
    pub tracker: TrackerConfig,
    pub label: LabelSpec,
    pub pacing: PacingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("BACKLOG.csv"),
            source_note: "BACKLOG.md".into(),
            grace_secs: 3,
            journal: true,
            tracker: TrackerConfig::default(),
            label: LabelSpec::default(),
            pacing: PacingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerKind {
    #[default]
    Gh,
    GithubApi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub kind: TrackerKind,
    /// `owner/name`; the gh backend falls back to the current checkout.
    pub repo: Option<String>,
    pub gh_bin: String,
    pub token: Option<String>,
    pub api_url: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kind: TrackerKind::Gh,
            repo: None,
            gh_bin: "gh".into(),
            token: None,
            api_url: "https://api.github.com".into(),
        }
    }
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".backlog-sync")
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
        .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))
}

pub fn parse_config(contents: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}
