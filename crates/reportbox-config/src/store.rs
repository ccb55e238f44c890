use std::path::PathBuf;

use reportbox_artifact::{ArchivePolicy, ZIP_CONTENT_TYPE, ZIP_EXTENSION};
use serde::{Deserialize, Serialize};

/// Archive storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
  /// Directory that holds every stored archive. Defaults to the system
  /// temporary directory.
  pub root: PathBuf,

  /// Media type that marks an upload as an archive.
  pub content_type: String,

  /// File extension that marks an upload as an archive, e.g. ".zip".
  pub extension: String,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      root: std::env::temp_dir(),
      content_type: ZIP_CONTENT_TYPE.to_string(),
      extension: ZIP_EXTENSION.to_string(),
    }
  }
}

impl StoreConfig {
  pub fn policy(&self) -> ArchivePolicy {
    ArchivePolicy::new(self.content_type.clone(), &self.extension)
  }
}
