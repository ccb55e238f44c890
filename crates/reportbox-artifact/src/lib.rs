//! Reportbox Artifact
//!
//! This crate provides the archive store behind reportbox. Uploaded archives are
//! keyed by an opaque report identifier and persisted as flat files under a
//! single root directory, named `<identifier>-<filename>` after both parts have
//! been sanitized. The file name is the only index: retrieval scans the root for
//! the first file carrying the identifier's prefix.
//!
//! The [`Store`] trait defines the storage operations. [`FsStore`] implements it
//! on the local filesystem, and the [`validate`] module holds the pure input
//! checks that run before any I/O happens.

mod fs;
mod types;
pub mod validate;

pub use fs::FsStore;
pub use types::{Artifact, StoredArtifact, Upload};
pub use validate::{ArchivePolicy, Charset, DEFAULT_FILENAME, ZIP_CONTENT_TYPE, ZIP_EXTENSION};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Error type for archive storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A required field was empty or whitespace only.
  #[error("{field} is required")]
  MissingRequiredField { field: &'static str },

  /// The upload was rejected by validation.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// No stored artifact matches the identifier.
  #[error("no artifact found for identifier '{identifier}'")]
  NotFound { identifier: String },

  /// Creating, writing or reading a file failed.
  #[error("storage failure at {}: {source}", path.display())]
  Storage {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  pub(crate) fn storage(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Storage {
      path: path.to_path_buf(),
      source,
    }
  }

  /// Whether the error was caused by the caller's input rather than the
  /// environment.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      Error::MissingRequiredField { .. } | Error::InvalidInput(_)
    )
  }
}

/// Archive storage trait.
///
/// Validation happens inside the store so that every caller gets the same
/// checks, and so that invalid input never reaches the backend.
#[async_trait]
pub trait Store: Send + Sync {
  /// Validate and persist an upload, returning where it was stored.
  async fn put(&self, upload: Upload) -> Result<StoredArtifact, Error>;

  /// Retrieve the first artifact stored under an identifier.
  ///
  /// When several artifacts share the identifier, which one is returned
  /// depends on the backend's enumeration order.
  async fn get(&self, identifier: &str) -> Result<Artifact, Error>;

  /// List the names of every artifact stored under an identifier.
  async fn list(&self, identifier: &str) -> Result<Vec<String>, Error>;
}
