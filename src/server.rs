//!
//! eventhub HTTP server
//! --------------------
//! Axum-based REST API for accounts, organizer subscriptions, events and
//! registrations.
//!
//! Responsibilities:
//! - Credential issuance at `/users/login`.
//! - A per-route `Policy` (authenticate, organizer, owner) enforced before
//!   the handler runs; see `guard`.
//! - Handlers delegating to the in-memory `Store`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post, put, MethodRouter};
use axum::{Json, Router};
use tracing::info;

use crate::config::AppConfig;
use crate::identity::{AuthProvider, Authenticator, LocalAuthProvider, Policy};
use crate::storage::Store;

pub mod extract;
pub mod guard;
pub mod users;
pub mod events;

use guard::guarded;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: Arc<Authenticator>,
    pub provider: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self { Self::with_store(config, Store::new()) }

    pub fn with_store(config: &AppConfig, store: Store) -> Self {
        let auth = Arc::new(config.authenticator());
        let provider = Arc::new(LocalAuthProvider::new(Arc::new(store.clone()), auth.clone()));
        Self { store, auth, provider }
    }
}

/// Build the full route table. Each protected route declares its policy here.
pub fn router(state: AppState) -> Router {
    let auth = state.auth.clone();
    let authenticated = |r: MethodRouter<AppState>| guarded(r, &auth, Policy::authenticated());
    let organizer = |r: MethodRouter<AppState>| guarded(r, &auth, Policy::organizer());
    let owner = |r: MethodRouter<AppState>| guarded(r, &auth, Policy::owner());

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({ "status": "ok" })) }))
        // accounts
        .route("/users", post(users::create_user))
        .route("/users", authenticated(get(users::list_users)))
        .route("/users/login", post(users::login))
        .route("/users/{id}", authenticated(get(users::get_user)))
        .route("/users/{id}", owner(put(users::update_user).delete(users::delete_user)))
        .route("/users/{id}/subscribe", owner(post(users::subscribe)))
        .route("/users/{id}/subscriptions", owner(get(users::list_subscriptions)))
        .route(
            "/users/{id}/subscription",
            owner(get(users::subscription_status).put(users::renew_subscription).delete(users::cancel_subscription)),
        )
        // events
        .route("/events", get(events::list_events))
        .route("/events", organizer(post(events::create_event)))
        .route("/events/{id}", get(events::get_event))
        .route("/events/{id}", organizer(put(events::update_event).delete(events::delete_event)))
        .route("/events/{id}/register", authenticated(post(events::register).delete(events::cancel_registration)))
        .route("/me", authenticated(get(events::me)))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "eventhub starting: http_port={}, token_ttl_secs={}, test_mode={}",
        config.http_port, config.token_ttl_secs, config.test_mode
    );
    let app = router(AppState::new(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("While binding HTTP listener on {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
