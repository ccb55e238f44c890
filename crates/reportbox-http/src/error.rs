//! Maps store errors to HTTP responses.
//!
//! Storage failures are reported to the client without details; the store
//! has already logged the path and cause.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Error returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request is malformed at the HTTP level.
  #[error("{0}")]
  BadRequest(String),

  /// The multipart body could not be read.
  #[error(transparent)]
  Multipart(#[from] MultipartError),

  /// A response could not be built.
  #[error("internal error: {0}")]
  Internal(String),

  /// The store rejected or failed the operation.
  #[error(transparent)]
  Store(#[from] reportbox_artifact::Error),
}

impl ApiError {
  fn status_and_message(&self) -> (StatusCode, String) {
    use reportbox_artifact::Error as StoreError;

    match self {
      ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
      ApiError::Internal(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error".to_string(),
      ),
      ApiError::Multipart(e) => (e.status(), e.body_text()),
      ApiError::Store(e) => match e {
        StoreError::MissingRequiredField { .. } | StoreError::InvalidInput(_) => {
          (StatusCode::BAD_REQUEST, e.to_string())
        }
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Storage { .. } => (
          StatusCode::INTERNAL_SERVER_ERROR,
          "failed to access storage".to_string(),
        ),
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = self.status_and_message();
    let body = serde_json::json!({
      "error": {
        "code": status.as_u16(),
        "message": message,
      }
    });
    (status, axum::Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;
  use reportbox_artifact::Error as StoreError;

  #[test]
  fn test_status_mapping() {
    let cases = [
      (
        ApiError::from(StoreError::MissingRequiredField {
          field: "identifier",
        }),
        StatusCode::BAD_REQUEST,
      ),
      (
        ApiError::from(StoreError::InvalidInput("nope".into())),
        StatusCode::BAD_REQUEST,
      ),
      (
        ApiError::from(StoreError::NotFound {
          identifier: "r1".into(),
        }),
        StatusCode::NOT_FOUND,
      ),
      (
        ApiError::BadRequest("file is required".into()),
        StatusCode::BAD_REQUEST,
      ),
    ];

    for (error, expected) in cases {
      assert_eq!(error.status_and_message().0, expected);
    }
  }

  #[test]
  fn test_storage_failure_hides_path() {
    let error = ApiError::from(StoreError::Storage {
      path: PathBuf::from("/secret/location/r1-a.zip"),
      source: std::io::Error::other("disk on fire"),
    });

    let (status, message) = error.status_and_message();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!message.contains("/secret"));
    assert!(!message.contains("disk on fire"));
  }
}
