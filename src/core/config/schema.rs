//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Validation
//!
//! Values are validated after parsing: the author must be a single
//! non-empty line, paths must be non-empty, and the relay address must parse
//! as a socket address.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of a config file.
///
/// # Example
///
/// ```toml
/// data_dir = "data"
/// store_file = "data/mydb.json"
/// author = "alice"
///
/// [relay]
/// addr = "127.0.0.1:8080"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the commit log, tags and the default store
    pub data_dir: Option<PathBuf>,

    /// Store document (default: `<data_dir>/mydb.json`)
    pub store_file: Option<PathBuf>,

    /// Author recorded on commits
    pub author: Option<String>,

    /// Relay server settings
    pub relay: Option<RelayConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(author) = &self.author {
            validate_author(author)?;
        }

        for (field, path) in [("data_dir", &self.data_dir), ("store_file", &self.store_file)] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", field)));
            }
        }

        if let Some(relay) = &self.relay {
            relay.validate()?;
        }

        Ok(())
    }
}

/// Relay server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Listen / connect address (e.g. "127.0.0.1:8080")
    pub addr: Option<String>,
}

impl RelayConfig {
    /// Validate the relay settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(addr) = &self.addr {
            parse_addr(addr)?;
        }
        Ok(())
    }
}

/// Check that an author is a single non-empty line.
pub fn validate_author(author: &str) -> Result<(), ConfigError> {
    if author.trim().is_empty() {
        return Err(ConfigError::InvalidValue("author cannot be empty".to_string()));
    }
    if author.contains(['\n', '\r']) {
        return Err(ConfigError::InvalidValue(
            "author must be a single line".to_string(),
        ));
    }
    Ok(())
}

/// Parse a relay address.
pub fn parse_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    addr.parse()
        .map_err(|e| ConfigError::InvalidValue(format!("invalid relay address '{}': {}", addr, e)))
}
