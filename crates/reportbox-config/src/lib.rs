//! Reportbox Config
//!
//! This crate contains the serializable configuration for reportbox: where
//! archives are stored, which uploads count as archives, and how the HTTP
//! server listens.
//!
//! Configuration is loaded from a JSON file; every field has a default, so an
//! empty object is a valid configuration:
//!
//! ```json
//! {
//!   "store": { "root": "/var/lib/reportbox" },
//!   "server": { "bind": "127.0.0.1:8080", "max_upload_bytes": 10485760 }
//! }
//! ```
//!
//! Command line flags override file values.

mod error;
mod server;
mod store;

pub use error::ConfigError;
pub use server::ServerConfig;
pub use store::StoreConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub server: ServerConfig,
}

impl Config {
  /// Parse configuration from a JSON string.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Read and parse a JSON configuration file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }
}
