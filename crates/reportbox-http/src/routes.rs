//! Upload and download routes.

use axum::Router;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use reportbox_artifact::Upload;
use reportbox_artifact::validate::{Charset, sanitize_token};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the archive.
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying the report identifier.
pub const REPORT_ID_FIELD: &str = "reportId";

/// Body of a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
  /// Absolute path of the stored archive.
  pub path: String,
}

pub fn router() -> Router<AppState> {
  Router::new()
    .route("/api/upload", post(upload))
    .route("/api/download/{report_id}", get(download))
    .route("/health", get(health))
}

async fn health() -> &'static str {
  "ok"
}

struct FilePart {
  filename: Option<String>,
  content_type: Option<String>,
  content: Bytes,
}

async fn upload(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<axum::Json<UploadResponse>, ApiError> {
  let mut report_id = None;
  let mut file = None;

  while let Some(field) = multipart.next_field().await? {
    let name = field.name().map(str::to_string);
    match name.as_deref() {
      Some(REPORT_ID_FIELD) => report_id = Some(field.text().await?),
      Some(FILE_FIELD) => {
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let content = field.bytes().await?;
        file = Some(FilePart {
          filename,
          content_type,
          content,
        });
      }
      _ => {}
    }
  }

  let file = file.ok_or_else(|| ApiError::BadRequest(format!("{FILE_FIELD} is required")))?;

  debug!(
    report_id = report_id.as_deref().unwrap_or_default(),
    filename = file.filename.as_deref().unwrap_or_default(),
    "upload received"
  );

  let upload = Upload {
    identifier: report_id.unwrap_or_default(),
    filename: file.filename,
    content_type: file.content_type,
    content: file.content,
  };

  let stored = state.store.put(upload).await?;

  Ok(axum::Json(UploadResponse {
    path: stored.path.to_string_lossy().into_owned(),
  }))
}

async fn download(
  State(state): State<AppState>,
  Path(report_id): Path<String>,
) -> Result<Response, ApiError> {
  let artifact = state.store.get(&report_id).await?;

  // Files placed in the root out-of-band may carry any name.
  let filename = sanitize_token(&artifact.filename, Charset::Filename);
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    .map_err(|e| ApiError::Internal(e.to_string()))?;

  let headers = [
    (
      header::CONTENT_TYPE,
      HeaderValue::from_static("application/octet-stream"),
    ),
    (header::CONTENT_DISPOSITION, disposition),
  ];

  Ok((headers, artifact.content).into_response())
}
