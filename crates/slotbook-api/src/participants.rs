//! Handlers for `/participants` endpoints.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use slotbook_core::{
  Error,
  booking::BookingService,
  notify::Notifier,
  participant::ParticipantSummary,
  reservation::ReservationDetail,
  store::Store,
};

use crate::{error::ApiError, extract::Id};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:  Option<String>,
  pub email: Option<String>,
}

/// `POST /participants` registers a participant, or renames the one that
/// already owns the email.
pub async fn create<S, N>(
  State(svc): State<BookingService<S, N>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let Json(body) = body?;
  let (Some(name), Some(email)) = (body.name, body.email) else {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  };

  let id = svc.register_participant(&name, &email).await?;
  Ok(Json(json!({ "success": true, "participant_id": id })))
}

/// `GET /participants`
pub async fn list<S, N>(
  State(svc): State<BookingService<S, N>>,
) -> Result<Json<Vec<ParticipantSummary>>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let summaries = svc
    .run(
      "list_participants_with_reservation_count",
      svc.store().list_participants_with_reservation_count(),
    )
    .await?;
  Ok(Json(summaries))
}

/// `GET /participants/:id/reservations`
pub async fn reservations<S, N>(
  State(svc): State<BookingService<S, N>>,
  Id(id): Id,
) -> Result<Json<Vec<ReservationDetail>>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  svc
    .run("get_participant", svc.store().get_participant(id))
    .await?
    .ok_or(Error::ParticipantNotFound(id))?;

  let details = svc
    .run(
      "list_participant_reservations",
      svc.store().list_participant_reservations(id),
    )
    .await?;
  Ok(Json(details))
}
