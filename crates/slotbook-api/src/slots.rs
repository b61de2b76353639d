//! Handlers for `/slots` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/slots` | Available slots; `?date=YYYY-MM-DD` returns that day's summaries |
//! | `GET`  | `/slots/all` | Every slot with its active reservation count |
//! | `POST` | `/slots` | Body: `{"date":"2025-08-08","start_time":"09:00"}`; 201 |
//! | `PUT`  | `/slots/:id/toggle` | Flip availability; 404 if unknown |
//! | `GET`  | `/slots/:id/reservations` | Active reservations on the slot |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use slotbook_core::{
  Error,
  booking::BookingService,
  notify::Notifier,
  reservation::ReservationDetail,
  slot::{NewSlot, SlotSummary},
  store::Store,
};

use crate::{error::ApiError, extract::Id};

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|_| ApiError::BadRequest(format!("Invalid date: {raw:?}")))
}

/// Accepts `HH:MM` as well as `HH:MM:SS`.
fn parse_time(raw: &str) -> Result<NaiveTime, ApiError> {
  let raw_trimmed = raw.trim();
  NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M"))
    .map_err(|_| ApiError::BadRequest(format!("Invalid time: {raw:?}")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub date: Option<String>,
}

/// `GET /slots[?date=YYYY-MM-DD]`
pub async fn list<S, N>(
  State(svc): State<BookingService<S, N>>,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let Query(params) = query?;
  match params.date.as_deref() {
    Some(raw) => {
      let date = parse_date(raw)?;
      let summaries = svc
        .run("list_slots_for_date", svc.store().list_slots_for_date(date))
        .await?;
      Ok(Json(summaries).into_response())
    }
    None => {
      let slots = svc
        .run("list_available_slots", svc.store().list_available_slots())
        .await?;
      Ok(Json(slots).into_response())
    }
  }
}

/// `GET /slots/all`
pub async fn list_all<S, N>(
  State(svc): State<BookingService<S, N>>,
) -> Result<Json<Vec<SlotSummary>>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let summaries = svc
    .run(
      "list_slots_with_reservation_count",
      svc.store().list_slots_with_reservation_count(),
    )
    .await?;
  Ok(Json(summaries))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub date:       Option<String>,
  pub start_time: Option<String>,
}

/// `POST /slots`
pub async fn create<S, N>(
  State(svc): State<BookingService<S, N>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let Json(body) = body?;
  let (Some(date), Some(start_time)) = (body.date, body.start_time) else {
    return Err(ApiError::BadRequest("Missing required fields".into()));
  };

  let new_slot = NewSlot {
    date:       parse_date(&date)?,
    start_time: parse_time(&start_time)?,
  };
  let slot = svc.run("create_slot", svc.store().create_slot(new_slot)).await?;
  tracing::info!(slot_id = slot.id, date = %slot.date, start_time = %slot.start_time, "slot created");

  Ok((StatusCode::CREATED, Json(json!({ "success": true, "slot": slot }))))
}

// ─── Toggle ───────────────────────────────────────────────────────────────────

/// `PUT /slots/:id/toggle`
pub async fn toggle<S, N>(
  State(svc): State<BookingService<S, N>>,
  Id(id): Id,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  let is_available = svc.toggle_availability(id).await?;
  Ok(Json(json!({ "success": true, "is_available": is_available })))
}

// ─── Reservations ─────────────────────────────────────────────────────────────

/// `GET /slots/:id/reservations`
pub async fn reservations<S, N>(
  State(svc): State<BookingService<S, N>>,
  Id(id): Id,
) -> Result<Json<Vec<ReservationDetail>>, ApiError>
where
  S: Store + 'static,
  N: Notifier,
{
  svc
    .run("get_slot", svc.store().get_slot(id))
    .await?
    .ok_or(Error::SlotNotFound(id))?;

  let details = svc
    .run(
      "list_active_reservations_for_slot",
      svc.store().list_active_reservations_for_slot(id),
    )
    .await?;
  Ok(Json(details))
}
