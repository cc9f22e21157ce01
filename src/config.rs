//! # Configuration
//!
//! Settings resolve in order: defaults → config file → CLI flags.
//!
//! The config file lives at `<config dir>/postfeed/config.toml` and every field
//! is optional. A missing file means defaults; a malformed one is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BASE_URL, DEFAULT_RESPONSE_DELAY};
use crate::error::Result;
use crate::store::DEFAULT_STALE_AFTER;
use crate::ui::transition::DEFAULT_TRANSITION;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub response_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    pub stale_after_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub transition_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Values given on the command line. `None` leaves the file/default value.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub response_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub response_delay: Duration,
    pub stale_after: Duration,
    pub transition: Duration,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// Loading
// ============================================================================

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "postfeed")
}

/// Path to the config file.
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Default path of the log file.
pub fn default_log_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join("postfeed.log"))
}

/// Load config from the default location, or defaults if there is none.
pub fn load_config() -> Result<FeedConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(FeedConfig::default()),
    }
}

/// Load config from a specific file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<FeedConfig> {
    if !path.exists() {
        return Ok(FeedConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: FeedConfig = toml::from_str(&contents)?;
    Ok(config)
}

// ============================================================================
// Resolution
// ============================================================================

impl FeedConfig {
    /// Apply CLI overrides and fill in defaults.
    pub fn resolve(self, overrides: &Overrides) -> ResolvedConfig {
        let base_url = overrides
            .base_url
            .clone()
            .or(self.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let response_delay = overrides
            .response_delay_ms
            .or(self.api.response_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RESPONSE_DELAY);

        let stale_after = self
            .cache
            .stale_after_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_STALE_AFTER);

        let transition = self
            .ui
            .transition_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TRANSITION);

        let log_level = overrides
            .log_level
            .as_deref()
            .or(self.log.level.as_deref())
            .and_then(|level| LevelFilter::from_str(level).ok())
            .unwrap_or(LevelFilter::Info);

        ResolvedConfig {
            base_url,
            response_delay,
            stale_after,
            transition,
            log_level,
            log_file: self.log.file.or_else(default_log_path),
        }
    }
}
