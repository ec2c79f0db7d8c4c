use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::authorizer::Authenticator;
use super::principal::Role;
use crate::error::{AppError, AppResult};

/// What the login flow needs to know about an account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub password_hash: String,
    pub role: Role,
}

/// User-record lookup consumed by login.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<Account>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;
}

pub struct LocalAuthProvider {
    pub directory: Arc<dyn UserDirectory>,
    pub auth: Arc<Authenticator>,
}

impl LocalAuthProvider {
    pub fn new(directory: Arc<dyn UserDirectory>, auth: Arc<Authenticator>) -> Self { Self { directory, auth } }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::user("missing_fields", "Email and password are required"));
        }
        let invalid = || AppError::unauthorized("invalid_credentials", "Invalid credentials");
        let account = self.directory.find_by_email(req.email.trim()).ok_or_else(invalid)?;
        if !crate::security::verify_password(&account.password_hash, &req.password) {
            return Err(invalid());
        }
        let codec = self.auth.codec();
        let token = codec
            .issue(account.id, account.role)
            .map_err(|e| AppError::internal("token_signing_failed", e.to_string().as_str()))?;
        info!(target: "auth", subject_id = account.id, role = %account.role, "login");
        Ok(LoginResponse {
            token,
            expires_in: codec.ttl().num_seconds(),
        })
    }
}
