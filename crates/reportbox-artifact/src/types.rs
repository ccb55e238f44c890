use std::path::PathBuf;

use bytes::Bytes;

/// An inbound archive upload, as handed over by a transport adapter.
#[derive(Debug, Clone)]
pub struct Upload {
  /// Opaque report identifier supplied by the caller.
  pub identifier: String,
  /// Original file name, if the client sent one.
  pub filename: Option<String>,
  /// Declared media type, if the client sent one.
  pub content_type: Option<String>,
  /// Archive bytes.
  pub content: Bytes,
}

impl Upload {
  pub fn new(identifier: impl Into<String>, content: impl Into<Bytes>) -> Self {
    Self {
      identifier: identifier.into(),
      filename: None,
      content_type: None,
      content: content.into(),
    }
  }

  pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
    self.filename = Some(filename.into());
    self
  }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = Some(content_type.into());
    self
  }
}

/// Result of a successful store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
  /// Sanitized identifier used as the file name prefix.
  pub identifier: String,
  /// Sanitized file name used as the file name suffix.
  pub filename: String,
  /// Absolute path of the stored file.
  pub path: PathBuf,
}

/// An artifact read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Name of the stored file, e.g. `report-123-sample.zip`.
  pub filename: String,
  /// Size in bytes.
  pub size: u64,
  pub content: Bytes,
}
