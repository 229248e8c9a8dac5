//! # Scanner Configuration
//!
//! Configuration for the scan station.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ESCS_SETTLE_MS=150                                                 │
//! │     ESCS_LOOKUP_ENABLED=false                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/checkout/scanner.toml (Linux)                            │
//! │     ~/Library/Application Support/com.escs.checkout/scanner.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [scanner]
//! settle_window_ms = 200     # quiet period that ends a scan
//! min_scan_interval_ms = 500 # duplicate-scan suppression window
//!
//! [lookup]
//! enabled = true
//! base_url = "https://openlibrary.org"
//! timeout_ms = 5000
//!
//! [store]
//! database_path = "/var/lib/escs/escs.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ScanError, ScanResult};
use escs_core::{DEFAULT_LOOKUP_TIMEOUT_MS, DEFAULT_MIN_SCAN_INTERVAL_MS, DEFAULT_SETTLE_WINDOW_MS};

// =============================================================================
// Limits
// =============================================================================

/// A scanner types a whole code in well under a second.
pub const MAX_SETTLE_WINDOW_MS: u64 = 2_000;

pub const MAX_MIN_SCAN_INTERVAL_MS: u64 = 10_000;

pub const MAX_LOOKUP_TIMEOUT_MS: u64 = 60_000;

// =============================================================================
// Scanner Settings
// =============================================================================

/// Keystroke debouncing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Quiet period after the last keystroke that completes a scan.
    #[serde(default = "default_settle_window")]
    pub settle_window_ms: u64,

    /// Dispatches closer together than this are treated as a double read.
    #[serde(default = "default_min_scan_interval")]
    pub min_scan_interval_ms: u64,
}

fn default_settle_window() -> u64 {
    DEFAULT_SETTLE_WINDOW_MS
}

fn default_min_scan_interval() -> u64 {
    DEFAULT_MIN_SCAN_INTERVAL_MS
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            settle_window_ms: default_settle_window(),
            min_scan_interval_ms: default_min_scan_interval(),
        }
    }
}

impl ScannerSettings {
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn min_scan_interval(&self) -> Duration {
        Duration::from_millis(self.min_scan_interval_ms)
    }
}

// =============================================================================
// Lookup Settings
// =============================================================================

/// External bibliographic lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupSettings {
    /// When false the resolver chain skips straight from the catalogs to
    /// the placeholder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_lookup_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_lookup_timeout() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings {
            enabled: true,
            base_url: default_base_url(),
            timeout_ms: default_lookup_timeout(),
        }
    }
}

impl LookupSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite file. Falls back to `escs.db` in the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Scan Config
// =============================================================================

/// Complete scan station configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub lookup: LookupSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScanResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ScanResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScanError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.scanner.settle_window_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "settle_window_ms must be greater than 0".into(),
            ));
        }

        if self.scanner.settle_window_ms > MAX_SETTLE_WINDOW_MS {
            return Err(ScanError::InvalidConfig(format!(
                "settle_window_ms must be at most {}, got: {}",
                MAX_SETTLE_WINDOW_MS, self.scanner.settle_window_ms
            )));
        }

        if self.scanner.min_scan_interval_ms > MAX_MIN_SCAN_INTERVAL_MS {
            return Err(ScanError::InvalidConfig(format!(
                "min_scan_interval_ms must be at most {}, got: {}",
                MAX_MIN_SCAN_INTERVAL_MS, self.scanner.min_scan_interval_ms
            )));
        }

        if self.lookup.timeout_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "lookup timeout_ms must be greater than 0".into(),
            ));
        }

        if self.lookup.timeout_ms > MAX_LOOKUP_TIMEOUT_MS {
            return Err(ScanError::InvalidConfig(format!(
                "lookup timeout_ms must be at most {}, got: {}",
                MAX_LOOKUP_TIMEOUT_MS, self.lookup.timeout_ms
            )));
        }

        let url = &self.lookup.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ScanError::InvalidConfig(format!(
                "Lookup URL must start with http:// or https://, got: {}",
                url
            )));
        }

        Ok(())
    }

    /// Applies `ESCS_*` overrides read through `var`.
    ///
    /// Unparseable numeric or boolean values are logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_var::<u64>(&var, "ESCS_SETTLE_MS") {
            debug!(settle_window_ms = ms, "Overriding settle window from environment");
            self.scanner.settle_window_ms = ms;
        }

        if let Some(ms) = parse_var::<u64>(&var, "ESCS_MIN_INTERVAL_MS") {
            self.scanner.min_scan_interval_ms = ms;
        }

        if let Some(raw) = var("ESCS_LOOKUP_ENABLED") {
            match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.lookup.enabled = true,
                "0" | "false" | "no" | "off" => self.lookup.enabled = false,
                _ => warn!(value = %raw, "Unknown ESCS_LOOKUP_ENABLED value"),
            }
        }

        if let Some(url) = var("ESCS_LOOKUP_URL") {
            debug!(url = %url, "Overriding lookup URL from environment");
            self.lookup.base_url = url;
        }

        if let Some(ms) = parse_var::<u64>(&var, "ESCS_LOOKUP_TIMEOUT_MS") {
            self.lookup.timeout_ms = ms;
        }

        if let Some(path) = var("ESCS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }
    }

    /// Configured database file, or the platform default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.store.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "escs", "checkout")
                .map(|dirs| dirs.data_dir().join("escs.db"))
        })
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "escs", "checkout")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }
}

fn parse_var<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}
