//! JSON REST API for slotbook.
//!
//! Exposes an axum [`Router`] backed by a [`BookingService`] over any
//! [`slotbook_core::store::Store`]. TLS, auth and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(slotbook_api::api_router(service.clone()))
//! ```

pub mod error;
pub mod extract;
pub mod participants;
pub mod reservations;
pub mod slots;

use axum::{
  Router,
  routing::{get, put},
};
use slotbook_core::{booking::BookingService, notify::Notifier, store::Store};

pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(service: BookingService<S, N>) -> Router<()>
where
  S: Store + 'static,
  N: Notifier,
{
  Router::new()
    // Slots
    .route("/slots", get(slots::list::<S, N>).post(slots::create::<S, N>))
    .route("/slots/all", get(slots::list_all::<S, N>))
    .route("/slots/{id}/toggle", put(slots::toggle::<S, N>))
    .route("/slots/{id}/reservations", get(slots::reservations::<S, N>))
    // Reservations
    .route(
      "/reservations",
      get(reservations::list::<S, N>).post(reservations::create::<S, N>),
    )
    .route("/reservations/{id}/cancel", put(reservations::cancel::<S, N>))
    // Participants
    .route(
      "/participants",
      get(participants::list::<S, N>).post(participants::create::<S, N>),
    )
    .route("/participants/{id}/reservations", get(participants::reservations::<S, N>))
    .fallback(endpoint_not_found)
    .method_not_allowed_fallback(method_not_allowed)
    .with_state(service)
}

async fn endpoint_not_found() -> ApiError { ApiError::NotFound("Endpoint not found".into()) }

async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }
