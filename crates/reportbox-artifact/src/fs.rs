use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, error, info, instrument};

use crate::validate::{self, ArchivePolicy, Charset};
use crate::{Artifact, Error, Store, StoredArtifact, Upload};

/// Separator between the identifier and file name segments.
const SEPARATOR: char = '-';

/// Filesystem-based archive store.
///
/// All artifacts live directly under one root directory:
/// ```text
/// {root}/
/// ├── report-123-sample.zip
/// ├── report-123-second.zip
/// └── other_id-upload.zip
/// ```
/// Writes go to a hidden staging file first and are renamed into place, so
/// readers never see a partially written archive.
pub struct FsStore {
  root: PathBuf,
  policy: ArchivePolicy,
}

impl FsStore {
  /// Create a new filesystem store rooted at the given directory.
  ///
  /// The directory is created on the first successful upload.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      policy: ArchivePolicy::default(),
    }
  }

  /// Replace the archive policy (media type and extension).
  pub fn with_policy(mut self, policy: ArchivePolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Get the root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn policy(&self) -> &ArchivePolicy {
    &self.policy
  }

  /// Compute where an upload with these raw inputs would be stored.
  ///
  /// Both segments are sanitized, so the result is always a direct child of
  /// the root.
  pub fn artifact_path(&self, identifier: &str, filename: &str) -> PathBuf {
    let identifier = validate::sanitize_token(identifier, Charset::Identifier);
    let filename = validate::sanitize_token(filename, Charset::Filename);
    self.root.join(artifact_name(&identifier, &filename))
  }

  /// Validate an upload and derive where it will be stored.
  ///
  /// Synchronous and free of filesystem calls: every rejection happens here,
  /// before `put` creates the root or writes anything.
  pub fn prepare(&self, upload: &Upload) -> Result<StoredArtifact, Error> {
    let identifier = validate::require_non_blank(&upload.identifier, "identifier")?;
    validate::is_acceptable_upload(
      &upload.content,
      upload.content_type.as_deref(),
      upload.filename.as_deref(),
      &self.policy,
    )?;

    let identifier = validate::sanitize_token(identifier, Charset::Identifier);
    let filename = validate::sanitize_token(
      validate::default_filename(upload.filename.as_deref()),
      Charset::Filename,
    );

    let path = std::path::absolute(self.root.join(artifact_name(&identifier, &filename)))
      .map_err(Error::storage(&self.root))?;

    Ok(StoredArtifact {
      identifier,
      filename,
      path,
    })
  }

  async fn put_inner(&self, upload: &Upload) -> Result<StoredArtifact, Error> {
    let stored = self.prepare(upload)?;

    fs::create_dir_all(&self.root)
      .await
      .map_err(Error::storage(&self.root))?;

    publish(&stored.path, upload.content.clone())
      .await
      .map_err(Error::storage(&stored.path))?;

    Ok(stored)
  }

  async fn get_inner(&self, identifier: &str) -> Result<Artifact, Error> {
    let identifier = validate::require_non_blank(identifier, "identifier")?;
    let prefix = artifact_prefix(identifier);

    let not_found = || Error::NotFound {
      identifier: identifier.to_string(),
    };

    let (filename, path) = self
      .scan(&prefix, true)
      .await?
      .into_iter()
      .next()
      .ok_or_else(not_found)?;

    // The file can be removed out-of-band between the scan and the read.
    let content = match fs::read(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
      Err(e) => return Err(Error::storage(&path)(e)),
    };

    Ok(Artifact {
      filename,
      size: content.len() as u64,
      content: Bytes::from(content),
    })
  }

  /// Linear scan of the root for regular files named `{prefix}*{extension}`,
  /// in directory order. A missing root yields no matches.
  async fn scan(&self, prefix: &str, first_only: bool) -> Result<Vec<(String, PathBuf)>, Error> {
    let mut matches = Vec::new();

    let mut entries = match fs::read_dir(&self.root).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(matches),
      Err(e) => return Err(Error::storage(&self.root)(e)),
    };

    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(Error::storage(&self.root))?
    {
      let name = match entry.file_name().into_string() {
        Ok(n) => n,
        Err(_) => continue,
      };

      if !name.starts_with(prefix) || !self.policy.matches_filename(&name) {
        continue;
      }

      let path = entry.path();
      let file_type = entry.file_type().await.map_err(Error::storage(&path))?;
      if !file_type.is_file() {
        continue;
      }

      matches.push((name, path));
      if first_only {
        break;
      }
    }

    Ok(matches)
  }
}

#[async_trait]
impl Store for FsStore {
  #[instrument(
    name = "artifact_put",
    skip(self, upload),
    fields(
      identifier = %upload.identifier,
      filename = upload.filename.as_deref().unwrap_or_default(),
      size = upload.content.len(),
    )
  )]
  async fn put(&self, upload: Upload) -> Result<StoredArtifact, Error> {
    let result = self.put_inner(&upload).await;

    match &result {
      Ok(stored) => {
        info!(path = %stored.path.display(), "artifact stored");
      }
      Err(Error::Storage { path, source }) => {
        error!(path = %path.display(), error = %source, "failed to store artifact");
      }
      Err(e) => {
        debug!(error = %e, "upload rejected");
      }
    }

    result
  }

  #[instrument(name = "artifact_get", skip(self))]
  async fn get(&self, identifier: &str) -> Result<Artifact, Error> {
    let result = self.get_inner(identifier).await;

    match &result {
      Ok(artifact) => {
        info!(filename = %artifact.filename, size = artifact.size, "artifact retrieved");
      }
      Err(Error::Storage { path, source }) => {
        error!(path = %path.display(), error = %source, "failed to read artifact");
      }
      Err(e) => {
        debug!(error = %e, "artifact not retrieved");
      }
    }

    result
  }

  #[instrument(name = "artifact_list", skip(self))]
  async fn list(&self, identifier: &str) -> Result<Vec<String>, Error> {
    let identifier = validate::require_non_blank(identifier, "identifier")?;
    let matches = self.scan(&artifact_prefix(identifier), false).await?;
    Ok(matches.into_iter().map(|(name, _)| name).collect())
  }
}

fn artifact_name(identifier: &str, filename: &str) -> String {
  format!("{identifier}{SEPARATOR}{filename}")
}

fn artifact_prefix(identifier: &str) -> String {
  let mut prefix = validate::sanitize_token(identifier, Charset::Identifier);
  prefix.push(SEPARATOR);
  prefix
}

/// Write `content` to a staging file next to `path`, then rename it onto
/// `path`. An existing file at `path` is replaced.
///
/// The staging write runs as one blocking task that owns the guard. If the
/// caller is cancelled mid-write the task still finishes, and the guard it
/// returns is dropped with the detached output, removing the staging file.
async fn publish(path: &Path, content: Bytes) -> std::io::Result<()> {
  let staging = Staging::new(path);

  let staging = tokio::task::spawn_blocking(move || staging.write(&content))
    .await
    .map_err(std::io::Error::other)??;

  fs::rename(&staging.path, path).await?;
  staging.disarm();
  Ok(())
}

/// Staging file that is removed on drop unless it was renamed into place.
///
/// The name is fixed-length and independent of the target, so any target
/// name that fits the filesystem also fits its staging file.
struct Staging {
  path: PathBuf,
  armed: bool,
}

impl Staging {
  fn new(target: &Path) -> Self {
    let name = format!(".{}.part", uuid::Uuid::new_v4().simple());
    Self {
      path: target.with_file_name(name),
      armed: true,
    }
  }

  fn write(self, content: &[u8]) -> std::io::Result<Self> {
    let mut file = std::fs::File::create(&self.path)?;
    file.write_all(content)?;
    file.sync_all()?;
    Ok(self)
  }

  fn disarm(mut self) {
    self.armed = false;
  }
}

impl Drop for Staging {
  fn drop(&mut self) {
    // A single unlink; outside the rename path this runs on the blocking pool.
    if self.armed {
      let _ = std::fs::remove_file(&self.path);
    }
  }
}
