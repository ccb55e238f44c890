use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Default request body limit: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
  /// Address to listen on.
  pub bind: SocketAddr,

  /// Largest accepted request body, in bytes.
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
    }
  }
}
