//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (applied through the `set_*` methods)
//!
//! # Config Locations
//!
//! An explicit `--config` path is used as-is and must exist. Otherwise the
//! first existing file of:
//! 1. `$VDB_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/verdant/config.toml`
//! 3. `~/.verdant/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use verdant::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("data dir: {}", config.data_dir().display());
//! println!("author: {}", config.author());
//! ```

pub mod schema;

pub use schema::{FileConfig, RelayConfig};

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::paths::DataPaths;

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default commit author.
pub const DEFAULT_AUTHOR: &str = "user";
/// Default relay address.
pub const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:8080";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Effective configuration: file contents plus CLI overrides.
///
/// Accessors apply defaults for anything left unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file, with overrides applied
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// With `explicit`, that file is read and must exist. Without it, the
    /// standard locations are searched and a missing file means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read, parsed or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => candidate_paths(
                std::env::var_os("VDB_CONFIG"),
                std::env::var_os("XDG_CONFIG_HOME"),
                dirs::home_dir(),
            )
            .into_iter()
            .find(|p| p.exists()),
        };

        match path {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read, parse and validate one config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        debug!(path = %path.display(), "loaded config");
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Get the canonical path for the config file: `~/.verdant/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".verdant/config.toml"))
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed.
    pub fn write(path: &Path, config: &FileConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |source| ConfigError::WriteError {
            path: temp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // CLI overrides
    // =========================================================================

    /// Override the data directory.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.file.data_dir = Some(dir);
    }

    /// Override the store document.
    pub fn set_store_file(&mut self, file: PathBuf) {
        self.file.store_file = Some(file);
    }

    /// Override the author.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty or multi-line author.
    pub fn set_author(&mut self, author: String) -> Result<(), ConfigError> {
        schema::validate_author(&author)?;
        self.file.author = Some(author);
        Ok(())
    }

    /// Override the relay address.
    pub fn set_relay_addr(&mut self, addr: SocketAddr) {
        self.file.relay.get_or_insert_with(RelayConfig::default).addr = Some(addr.to_string());
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Data directory. Defaults to `data`.
    pub fn data_dir(&self) -> PathBuf {
        self.file
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Path routing for the data directory.
    pub fn paths(&self) -> DataPaths {
        DataPaths::new(self.data_dir())
    }

    /// Store document. Defaults to `<data_dir>/mydb.json`.
    pub fn store_file(&self) -> PathBuf {
        self.file
            .store_file
            .clone()
            .unwrap_or_else(|| self.paths().default_store_path())
    }

    /// Commit author. Defaults to "user".
    pub fn author(&self) -> &str {
        self.file.author.as_deref().unwrap_or(DEFAULT_AUTHOR)
    }

    /// Relay address. Defaults to `127.0.0.1:8080`.
    pub fn relay_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self
            .file
            .relay
            .as_ref()
            .and_then(|r| r.addr.as_deref())
            .unwrap_or(DEFAULT_RELAY_ADDR);
        schema::parse_addr(addr)
    }

    /// Path the config was loaded from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Config file candidates in search order.
fn candidate_paths(
    config_env: Option<OsString>,
    xdg_config_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = config_env {
        paths.push(PathBuf::from(path));
    }
    if let Some(xdg) = xdg_config_home {
        paths.push(PathBuf::from(xdg).join("verdant/config.toml"));
    }
    if let Some(home) = home {
        paths.push(home.join(".verdant/config.toml"));
    }
    paths
}
