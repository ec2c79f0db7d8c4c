//! Request gates and the per-route policy that chains them.
//!
//! Each gate is a plain function `RequestContext -> Result<RequestContext, AuthError>`.
//! A `Policy` is an ordered list of capabilities evaluated left to right; the
//! first failure short-circuits.

use thiserror::Error;
use tracing::{debug, warn};

use super::principal::RequestIdentity;
use super::request_context::RequestContext;
use super::token::{TokenCodec, TokenError};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no bearer credential supplied")]
    MissingCredential,
    #[error("credential rejected: {0}")]
    InvalidCredential(#[from] TokenError),
    #[error("caller is not an organizer")]
    InsufficientRole,
    #[error("caller does not own the addressed resource")]
    Forbidden,
}

impl AuthError {
    /// Wire message. Token failures share one message so callers cannot tell
    /// which check failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "Access denied. Token not provided.",
            AuthError::InvalidCredential(_) => "Invalid or expired token.",
            AuthError::InsufficientRole => "Access denied. Organizers only.",
            AuthError::Forbidden => "You do not have permission to modify this resource",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential(_) => "invalid_or_expired_credential",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::Forbidden => "forbidden",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => AppError::unauthorized(e.code(), e.public_message()),
            _ => AppError::forbidden(e.code(), e.public_message()),
        }
    }
}

/// Verifies credentials for the authentication gate.
#[derive(Debug)]
pub struct Authenticator {
    codec: TokenCodec,
    bypass_token: Option<String>,
}

impl Authenticator {
    pub fn new(codec: TokenCodec) -> Self { Self { codec, bypass_token: None } }

    /// Accept `token` verbatim as the synthetic identity. Only wired up by the
    /// configuration layer when test mode is on.
    pub fn with_bypass_token(mut self, token: impl Into<String>) -> Self {
        self.bypass_token = Some(token.into()).filter(|t| !t.is_empty());
        self
    }

    pub fn codec(&self) -> &TokenCodec { &self.codec }

    pub fn bypass_enabled(&self) -> bool { self.bypass_token.is_some() }

    fn resolve(&self, token: &str) -> Result<RequestIdentity, AuthError> {
        if self.bypass_token.as_deref() == Some(token) {
            warn!(target: "auth", "accepted test-mode bypass credential");
            return Ok(RequestIdentity::synthetic());
        }
        Ok(self.codec.verify(token)?)
    }
}

pub fn authenticate(ctx: RequestContext, auth: &Authenticator) -> Result<RequestContext, AuthError> {
    let Some(token) = ctx.bearer_token() else {
        return Err(AuthError::MissingCredential);
    };
    let identity = auth.resolve(token)?;
    debug!(target: "auth", subject_id = identity.subject_id, role = %identity.role, "authenticated");
    Ok(ctx.with_identity(identity))
}

pub fn require_organizer(ctx: RequestContext) -> Result<RequestContext, AuthError> {
    match ctx.identity {
        Some(id) if id.role.is_organizer() => Ok(ctx),
        _ => Err(AuthError::InsufficientRole),
    }
}

/// A resource id that does not parse is treated exactly like someone else's id.
pub fn require_owner(ctx: RequestContext) -> Result<RequestContext, AuthError> {
    let Some(identity) = ctx.identity else { return Err(AuthError::Forbidden); };
    let owner = ctx.resource_id.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    if owner == Some(identity.subject_id) { Ok(ctx) } else { Err(AuthError::Forbidden) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticate,
    Organizer,
    Owner,
}

impl Capability {
    pub fn check(self, ctx: RequestContext, auth: &Authenticator) -> Result<RequestContext, AuthError> {
        match self {
            Capability::Authenticate => authenticate(ctx, auth),
            Capability::Organizer => require_organizer(ctx),
            Capability::Owner => require_owner(ctx),
        }
    }
}

/// Ordered capability checks for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    steps: Vec<Capability>,
}

impl Policy {
    pub fn public() -> Self { Self::default() }
    pub fn authenticated() -> Self { Self { steps: vec![Capability::Authenticate] } }
    pub fn organizer() -> Self { Self::authenticated().then(Capability::Organizer) }
    pub fn owner() -> Self { Self::authenticated().then(Capability::Owner) }

    pub fn then(mut self, cap: Capability) -> Self {
        self.steps.push(cap);
        self
    }

    pub fn steps(&self) -> &[Capability] { &self.steps }

    pub fn evaluate(&self, auth: &Authenticator, ctx: RequestContext) -> Result<RequestContext, AuthError> {
        let request_id = ctx.request_id.clone();
        self.steps.iter().try_fold(ctx, |ctx, cap| cap.check(ctx, auth)).inspect_err(|e| {
            debug!(target: "auth", request_id = ?request_id, reason = %e, "request rejected");
        })
    }
}

#[cfg(test)]
#[path = "authorizer_tests.rs"]
mod authorizer_tests;
