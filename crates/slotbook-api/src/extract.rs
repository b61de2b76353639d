//! Request extractors that reject with [`ApiError`] instead of axum's
//! plain-text rejections.

use axum::{
  extract::{FromRequestParts, Path},
  http::request::Parts,
};

use crate::error::ApiError;

/// A numeric `{id}` path segment. Anything that is not an integer is
/// treated as an unknown endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Id(pub i64);

impl<S> FromRequestParts<S> for Id
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<i64>::from_request_parts(parts, state)
      .await
      .map_err(|_| ApiError::NotFound("Endpoint not found".into()))?;
    Ok(Self(id))
  }
}
