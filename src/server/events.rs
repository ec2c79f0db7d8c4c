//! Event and registration handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use super::extract::{Payload, PathParam};
use super::AppState;
use crate::error::AppResult;
use crate::identity::RequestIdentity;
use crate::storage::EventInput;

pub async fn list_events(State(state): State<AppState>) -> impl IntoResponse { Json(state.store.list_events()) }

pub async fn get_event(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.get_event(id)?))
}

pub async fn create_event(
    State(state): State<AppState>,
    identity: RequestIdentity,
    Payload(input): Payload<EventInput>,
) -> AppResult<impl IntoResponse> {
    let event = state.store.create_event(identity.subject_id, input)?;
    Ok((StatusCode::CREATED, Json(event)))
}

// The role gate only says the caller is an organizer; the store checks it is
// this event's organizer.
pub async fn update_event(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
    Payload(input): Payload<EventInput>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.update_event(id, identity.subject_id, input)?))
}

pub async fn delete_event(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    state.store.delete_event(id, identity.subject_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn register(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
) -> AppResult<impl IntoResponse> {
    let registration = state.store.register(id, identity.subject_id)?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn cancel_registration(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    state.store.cancel_registration(id, identity.subject_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's identity as resolved by the guard, plus their registrations.
pub async fn me(State(state): State<AppState>, identity: RequestIdentity) -> impl IntoResponse {
    Json(json!({
        "id": identity.subject_id,
        "role": identity.role,
        "registrations": state.store.registrations_for(identity.subject_id),
    }))
}
