//! Bridge Configuration
//!
//! Handles parsing and management of sqlite-bridge.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sqlite::OpenFlags;

/// File searched for by [`BridgeConfig::find_and_load`].
pub const CONFIG_FILE_NAME: &str = "sqlite-bridge.toml";

/// Shared object opened when nothing else is configured.
pub const DEFAULT_LIBRARY: &str = "libsqlite3.so.0";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching sqlite-bridge.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BridgeConfig {
    /// Which shared object to open
    #[serde(default)]
    pub library: LibraryConfig,

    /// Defaults for new connections
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl BridgeConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Configuration for the current directory; defaults on any error.
    pub fn discover() -> Self {
        let found = std::env::current_dir()
            .map_err(ConfigError::Io)
            .and_then(|cwd| Self::find_and_load(&cwd));
        match found {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable {}", CONFIG_FILE_NAME);
                Self::default()
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Shared object selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// File name or path of the shared object
    #[serde(default = "default_library_name")]
    pub name: String,

    /// Directories tried, in order, before the dynamic linker's own search
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_library_name() -> String {
    DEFAULT_LIBRARY.to_string()
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            name: default_library_name(),
            search_paths: Vec::new(),
        }
    }
}

/// Connection defaults, applied by callers after `open_v2`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// Lock wait passed to `busy_timeout`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<i32>,

    #[serde(default = "default_flags")]
    pub flags: Vec<OpenFlagName>,
}

fn default_flags() -> Vec<OpenFlagName> {
    vec![OpenFlagName::Readwrite, OpenFlagName::Create]
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: None,
            flags: default_flags(),
        }
    }
}

impl ConnectionConfig {
    /// Combined bit set for `open_v2`
    pub fn open_flags(&self) -> OpenFlags {
        self.flags
            .iter()
            .fold(OpenFlags::empty(), |acc, flag| acc | flag.to_flags())
    }
}

/// Open flag as written in the config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpenFlagName {
    Readonly,
    Readwrite,
    Create,
    Uri,
    Memory,
    Nomutex,
    Fullmutex,
}

impl OpenFlagName {
    pub fn to_flags(self) -> OpenFlags {
        match self {
            OpenFlagName::Readonly => OpenFlags::READONLY,
            OpenFlagName::Readwrite => OpenFlags::READWRITE,
            OpenFlagName::Create => OpenFlags::CREATE,
            OpenFlagName::Uri => OpenFlags::URI,
            OpenFlagName::Memory => OpenFlags::MEMORY,
            OpenFlagName::Nomutex => OpenFlags::NOMUTEX,
            OpenFlagName::Fullmutex => OpenFlags::FULLMUTEX,
        }
    }
}
