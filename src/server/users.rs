//! Account, login and subscription handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::extract::{Payload, PathParam, QueryParams};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{LoginRequest, RequestIdentity, Role};
use crate::storage::{NewUser, Plan, UserUpdate};
use crate::validation::{require_cpf, require_email, require_strong_password};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `plan` stays a string so an unknown value gets the same message as a missing one.
#[derive(Debug, Default, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub plan: Option<String>,
}

impl PlanRequest {
    fn required(&self) -> AppResult<Plan> {
        match self.plan.as_deref() {
            Some(p) => p.parse(),
            None => Err(AppError::user("invalid_plan", "Plan must be monthly or annual")),
        }
    }

    fn optional(&self) -> AppResult<Option<Plan>> { self.plan.as_deref().map(str::parse).transpose() }
}

pub async fn create_user(State(state): State<AppState>, Payload(new): Payload<NewUser>) -> AppResult<impl IntoResponse> {
    if new.name.trim().is_empty() || new.email.trim().is_empty() || new.password.is_empty() || new.cpf.trim().is_empty() {
        return Err(AppError::user("missing_fields", "All fields are required"));
    }
    require_email(new.email.trim())?;
    require_cpf(&new.cpf)?;
    require_strong_password(&new.password)?;
    let user = state.store.create_user(new)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(State(state): State<AppState>, Payload(req): Payload<LoginRequest>) -> AppResult<impl IntoResponse> {
    let resp = state.provider.login(&req)?;
    Ok(Json(resp))
}

pub async fn list_users(State(state): State<AppState>, QueryParams(q): QueryParams<ListQuery>) -> impl IntoResponse {
    Json(state.store.list_users(q.page.unwrap_or(1), q.limit.unwrap_or(10)))
}

pub async fn get_user(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.get_user(id)?))
}

pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    Payload(update): Payload<UserUpdate>,
) -> AppResult<impl IntoResponse> {
    if !update.password.is_empty() {
        require_strong_password(&update.password)?;
    }
    Ok(Json(state.store.update_user(id, update)?))
}

pub async fn delete_user(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<StatusCode> {
    state.store.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}

fn organizer_token(state: &AppState, identity: RequestIdentity) -> AppResult<String> {
    state
        .auth
        .codec()
        .issue(identity.subject_id, Role::Organizer)
        .map_err(|e| AppError::internal("token_signing_failed", e.to_string().as_str()))
}

/// Starts a subscription and returns a fresh credential carrying the
/// organizer role, since the caller's current one still says regular.
pub async fn subscribe(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
    Payload(req): Payload<PlanRequest>,
) -> AppResult<impl IntoResponse> {
    let plan = req.required()?;
    let subscription = state.store.subscribe(id, plan, Utc::now())?;
    let token = organizer_token(&state, identity)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Subscription created. User upgraded to organizer.",
            "subscription": subscription,
            "token": token,
        })),
    ))
}

pub async fn list_subscriptions(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<impl IntoResponse> {
    let subs = state.store.subscriptions_for(id);
    if subs.is_empty() {
        return Err(AppError::not_found("subscription_not_found", "No subscription found for this user"));
    }
    Ok(Json(subs))
}

pub async fn subscription_status(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.active_subscription(id, Utc::now())?))
}

/// Renews the latest subscription, optionally switching plan.
pub async fn renew_subscription(
    State(state): State<AppState>,
    identity: RequestIdentity,
    PathParam(id): PathParam<i64>,
    Payload(req): Payload<PlanRequest>,
) -> AppResult<impl IntoResponse> {
    let plan = req.optional()?;
    let subscription = state.store.renew_subscription(id, plan, Utc::now())?;
    let token = organizer_token(&state, identity)?;
    Ok(Json(json!({ "message": "Subscription renewed", "subscription": subscription, "token": token })))
}

pub async fn cancel_subscription(State(state): State<AppState>, PathParam(id): PathParam<i64>) -> AppResult<impl IntoResponse> {
    let subscription = state.store.cancel_subscription(id, Utc::now())?;
    Ok(Json(json!({ "message": "Subscription cancelled", "subscription": subscription })))
}
