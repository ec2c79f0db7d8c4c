//! Route guard: evaluates a `Policy` before the handler and hands the
//! resolved `RequestIdentity` to it through request extensions.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use tracing::debug;
use uuid::Uuid;

use super::extract::PathParam;
use crate::error::AppError;
use crate::identity::{Authenticator, Capability, Policy, RequestContext, RequestIdentity};

#[derive(Clone)]
pub struct RouteGuard {
    auth: Arc<Authenticator>,
    policy: Arc<Policy>,
}

impl RouteGuard {
    pub fn new(auth: Arc<Authenticator>, policy: Policy) -> Self { Self { auth, policy: Arc::new(policy) } }

    fn admit(&self, mut ctx: RequestContext, request: &mut Request) -> Result<(), AppError> {
        ctx = ctx.with_request_id(Uuid::new_v4().to_string());
        debug!(target: "auth", request_id = ?ctx.request_id, path = %request.uri().path(), "evaluating route policy");
        let ctx = self.policy.evaluate(&self.auth, ctx)?;
        if let Some(identity) = ctx.identity {
            request.extensions_mut().insert(identity);
        }
        Ok(())
    }
}

/// Wrap `route` so every method on it runs `policy` first.
///
/// Policies that include the owner check read the `{id}` path segment, so they
/// must only be attached to routes that declare one.
pub fn guarded<S>(route: MethodRouter<S>, auth: &Arc<Authenticator>, policy: Policy) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let owned = policy.steps().contains(&Capability::Owner);
    let guard = RouteGuard::new(auth.clone(), policy);
    if owned {
        route.route_layer(from_fn_with_state(guard, enforce_owned))
    } else {
        route.route_layer(from_fn_with_state(guard, enforce))
    }
}

pub async fn enforce(State(guard): State<RouteGuard>, mut request: Request, next: Next) -> Result<Response, AppError> {
    let ctx = RequestContext::from_headers(request.headers());
    guard.admit(ctx, &mut request)?;
    Ok(next.run(request).await)
}

pub async fn enforce_owned(
    State(guard): State<RouteGuard>,
    PathParam(id): PathParam<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = RequestContext::from_headers(request.headers()).with_resource_id(id);
    guard.admit(ctx, &mut request)?;
    Ok(next.run(request).await)
}

/// Handlers behind a guard take the caller's identity as an extractor.
/// A missing identity means the route was registered without a guard.
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestIdentity>().copied().ok_or_else(|| {
            tracing::error!(target: "auth", path = %parts.uri.path(), "identity extractor used on an unguarded route");
            AppError::internal("identity_missing", "Request identity was not resolved for this route")
        })
    }
}
