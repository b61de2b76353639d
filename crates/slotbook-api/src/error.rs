//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// An error returned by an API handler.
///
/// Client-facing variants carry the message sent in the `{"error": ...}`
/// body. [`ApiError::Internal`] keeps its cause for the log only.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("method not allowed")]
  MethodNotAllowed,

  #[error("internal error: {0}")]
  Internal(#[source] slotbook_core::Error),
}

impl From<slotbook_core::Error> for ApiError {
  fn from(e: slotbook_core::Error) -> Self {
    use slotbook_core::Error as Core;
    match e {
      Core::Validation(m) => Self::BadRequest(m),
      e if e.is_not_found() => Self::NotFound(e.to_string()),
      e if e.is_conflict() => Self::Conflict(e.to_string()),
      e => Self::Internal(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    debug!(error = %rejection, "rejected request body");
    Self::BadRequest("Invalid JSON body".into())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    debug!(error = %rejection, "rejected query string");
    Self::BadRequest("Invalid query string".into())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::MethodNotAllowed => {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_owned())
      }
      ApiError::Internal(e) => {
        error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
