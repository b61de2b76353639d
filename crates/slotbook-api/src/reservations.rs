//! Handlers for `/reservations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reservations` | Active reservations with participant and slot details |
//! | `POST` | `/reservations` | Body: [`CreateBody`]; returns the new reservation id |
//! | `PUT`  | `/reservations/:id/cancel` | 404 if unknown; repeat cancels succeed |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use slotbook_core::{
  booking::BookingService,
  notify::Notifier,
  reservation::ReservationDetail,
  store::Store,
};

use crate::{error::ApiError, extract::Id};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /reservations`
pub async fn list<S, N>(
  State(svc): State<BookingService<S, N>>,
) -> Result<Json<Vec<ReservationDetail>>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let details = svc
    .run("list_active_reservations", svc.store().list_active_reservations())
    .await?;
  Ok(Json(details))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Fields are optional so that a missing one is reported in the usual
/// `{"error": ...}` shape.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub slot_id:           Option<i64>,
  pub participant_name:  Option<String>,
  pub participant_email: Option<String>,
}

/// `POST /reservations`
pub async fn create<S, N>(
  State(svc): State<BookingService<S, N>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let Json(body) = body?;
  let (Some(slot_id), Some(name), Some(email)) =
    (body.slot_id, body.participant_name, body.participant_email)
  else {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  };

  let booking = svc.book(slot_id, &name, &email).await?;
  Ok(Json(json!({ "success": true, "reservation_id": booking.reservation.id })))
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

/// `PUT /reservations/:id/cancel`
pub async fn cancel<S, N>(
  State(svc): State<BookingService<S, N>>,
  Id(id): Id,
) -> Result<Json<Value>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  svc.cancel(id).await?;
  Ok(Json(json!({ "success": true })))
}
