//! TOML-based configuration for the device client.
//!
//! Reads `ClientConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\MakcuClient\config.toml`
//! - Linux:    `~/.config/makcu-client/config.toml`
//! - macOS:    `~/Library/Application Support/MakcuClient/config.toml`
//!
//! Example:
//!
//! ```toml
//! [backend]
//! executable = "/opt/makcu/makcu-cpp"
//! command_timeout_ms = 1000
//!
//! [device]
//! port = "COM3"
//! high_performance = true
//! smooth_segments = 10
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing table, or a
//! missing key all fall back to the values in `ClientConfig::default()`.
//!
//! The environment variable [`EXECUTABLE_ENV_VAR`] overrides
//! `backend.executable`; it is the only environment-driven setting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the backend executable explicitly.
pub const EXECUTABLE_ENV_VAR: &str = "MAKCU_CPP_PATH";

/// Lower bound applied to `backend.command_timeout_ms`.
pub const MIN_COMMAND_TIMEOUT_MS: u64 = 100;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the backend lives and how long synchronous commands may take.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Explicit backend path; probed before the default candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// Base directory for the relative candidates.  Defaults to the
    /// working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_root: Option<PathBuf>,
    /// Upper bound on a synchronous command (`connect`, `status`, `version`).
    #[serde(default = "default_timeout_ms")]
    pub command_timeout_ms: u64,
}

/// Device session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Serial port to open.  Empty lets the backend auto-detect.
    #[serde(default)]
    pub port: String,
    /// Whether to request high-performance mode after connecting.
    #[serde(default = "default_true")]
    pub high_performance: bool,
    /// Segment count used by smooth moves when the caller does not pick one.
    #[serde(default = "default_smooth_segments")]
    pub smooth_segments: u32,
}

/// `tracing` filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `"error"`, `"warn"`, `"info"`, `"debug"` or `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_timeout_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_smooth_segments() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            executable: None,
            search_root: None,
            command_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            high_performance: default_true(),
            smooth_segments: default_smooth_segments(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl BackendConfig {
    /// Synchronous command timeout as a [`Duration`], never below
    /// [`MIN_COMMAND_TIMEOUT_MS`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.max(MIN_COMMAND_TIMEOUT_MS))
    }
}

impl DeviceConfig {
    /// The configured port, or `None` for auto-detection.
    pub fn port(&self) -> Option<&str> {
        let port = self.port.trim();
        if port.is_empty() {
            None
        } else {
            Some(port)
        }
    }
}

impl ClientConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Applies an explicit backend path taken from the environment.
    ///
    /// Empty values are ignored.
    pub fn with_executable_override(mut self, value: Option<&str>) -> Self {
        if let Some(path) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.backend.executable = Some(PathBuf::from(path));
        }
        self
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `ClientConfig` from `path`, returning defaults if the file does not
/// exist, then applies the [`EXECUTABLE_ENV_VAR`] override.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => ClientConfig::from_toml(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ClientConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    let env = std::env::var(EXECUTABLE_ENV_VAR).ok();
    Ok(cfg.with_executable_override(env.as_deref()))
}

/// Loads `ClientConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`]; additionally [`ConfigError::NoPlatformConfigDir`].
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Resolves the platform config directory for the client.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MakcuClient"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("makcu-client"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MakcuClient")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
