//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/laca/config.toml)
//! 3. Environment variables (LACA_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "LACA";

/// Default quiescence window before a debounced write
pub const DEFAULT_SAVE_DELAY_MS: u64 = 500;

/// Default time the "saved" status stays visible
pub const DEFAULT_SAVED_DISPLAY_MS: u64 = 1200;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite db, legacy blob)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where exported PDFs go (defaults to the current directory)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Quiescence window for debounced saves, in milliseconds
    #[serde(default = "default_save_delay_ms")]
    pub save_delay_ms: u64,

    /// How long the "saved" status is shown, in milliseconds
    #[serde(default = "default_saved_display_ms")]
    pub saved_display_ms: u64,

    /// Import the legacy blob automatically on startup
    #[serde(default = "default_true")]
    pub auto_migrate: bool,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: None,
            save_delay_ms: DEFAULT_SAVE_DELAY_MS,
            saved_display_ms: DEFAULT_SAVED_DISPLAY_MS,
            auto_migrate: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LACA_DATA_DIR, LACA_SAVE_DELAY_MS, ...)
    /// 2. Config file (~/.config/laca/config.toml or LACA_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_EXPORT_DIR", ENV_PREFIX)) {
            self.export_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // Unparseable numbers are ignored rather than failing startup
        if let Some(ms) = env_millis("SAVE_DELAY_MS") {
            self.save_delay_ms = ms;
        }
        if let Some(ms) = env_millis("SAVED_DISPLAY_MS") {
            self.saved_display_ms = ms;
        }

        if let Ok(val) = std::env::var(format!("{}_AUTO_MIGRATE", ENV_PREFIX)) {
            self.auto_migrate = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LACA_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("laca")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("laca.db")
    }

    /// Directory holding legacy flat-storage blobs
    pub fn legacy_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Directory exports are written to
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }
}

fn env_millis(suffix: &str) -> Option<u64> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix))
        .ok()
        .and_then(|val| val.trim().parse().ok())
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("laca")
}

fn default_save_delay_ms() -> u64 {
    DEFAULT_SAVE_DELAY_MS
}

fn default_saved_display_ms() -> u64 {
    DEFAULT_SAVED_DISPLAY_MS
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    // Serializes tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    pub const ENV_VARS: &[&str] = &[
        "LACA_DATA_DIR",
        "LACA_EXPORT_DIR",
        "LACA_SAVE_DELAY_MS",
        "LACA_SAVED_DISPLAY_MS",
        "LACA_AUTO_MIGRATE",
    ];

    /// Guard that locks env access and saves/restores env vars
    pub struct EnvGuard<'a> {
        _lock: MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard<'_> {
        pub fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }
}
