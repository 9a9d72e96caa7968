//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use att_core::{ScheduleBook, ValidationError, parse_utc_offset};
use chrono::{FixedOffset, Local, Offset};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Path to the zone schedule (TOML).
    pub schedule_path: PathBuf,
    /// Venue UTC offset such as `+09:00`. Defaults to this machine's offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("schedule_path", &self.schedule_path)
            .field("utc_offset", &self.utc_offset)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("att.db"),
            schedule_path: config_dir.join("schedule.toml"),
            utc_offset: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ATT_*)
        figment = figment.merge(Env::prefixed("ATT_"));

        figment.extract()
    }

    /// The venue time zone used for breaks, session hours and calendar days.
    pub fn venue_offset(&self) -> Result<FixedOffset, ValidationError> {
        match &self.utc_offset {
            Some(offset) => parse_utc_offset(offset),
            None => Ok(Local::now().offset().fix()),
        }
    }
}

/// Loads the zone schedule from a TOML file.
///
/// A missing file yields an empty schedule so scans can be recorded before
/// the program is configured.
#[expect(
    clippy::result_large_err,
    reason = "figment::Error is large but only returned at startup"
)]
pub fn load_schedule(path: &Path) -> Result<ScheduleBook, figment::Error> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "schedule file not found, no zones are scheduled");
        return Ok(ScheduleBook::default());
    }
    Figment::from(Toml::file(path)).extract()
}

/// Returns the platform-specific config directory for att.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("att"))
}

/// Returns the platform-specific data directory for att.
///
/// On Linux: `~/.local/share/att`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("att"))
}
