//! Process configuration, resolved once at startup from the environment.
//!
//! The signing secret has no default: a missing or empty secret stops the
//! process before it binds a port.

use thiserror::Error;
use tracing::warn;

use crate::identity::{Authenticator, TokenCodec, DEFAULT_TOKEN_TTL_SECS};

pub const DEFAULT_HTTP_PORT: u16 = 3000;

pub const ENV_HTTP_PORT: &str = "EVENTHUB_HTTP_PORT";
pub const ENV_JWT_SECRET: &str = "EVENTHUB_JWT_SECRET";
pub const ENV_JWT_SECRET_ALIAS: &str = "JWT_SECRET";
pub const ENV_TOKEN_TTL: &str = "EVENTHUB_TOKEN_TTL_SECS";
pub const ENV_TEST_MODE: &str = "EVENTHUB_TEST_MODE";
pub const ENV_BYPASS_TOKEN: &str = "EVENTHUB_BYPASS_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no signing secret configured; set EVENTHUB_JWT_SECRET")]
    MissingSecret,
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_port: u16,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub test_mode: bool,
    pub bypass_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("http_port", &self.http_port)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("test_mode", &self.test_mode)
            .field("bypass_token", &self.bypass_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Release builds ignore the bypass credential unless built with `test-bypass`.
pub const fn bypass_permitted() -> bool { cfg!(any(debug_assertions, feature = "test-bypass")) }

impl AppConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            jwt_secret: jwt_secret.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            test_mode: false,
            bypass_token: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_JWT_SECRET)
            .or_else(|| lookup(ENV_JWT_SECRET_ALIAS))
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let mut cfg = Self::new(secret);
        if let Some(v) = lookup(ENV_HTTP_PORT) {
            cfg.http_port = v.trim().parse().map_err(|_| ConfigError::Invalid { name: ENV_HTTP_PORT, value: v.clone() })?;
        }
        if let Some(v) = lookup(ENV_TOKEN_TTL) {
            cfg.token_ttl_secs = v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid { name: ENV_TOKEN_TTL, value: v.clone() })?;
        }
        if let Some(v) = lookup(ENV_TEST_MODE) {
            cfg.test_mode = parse_bool(&v).ok_or_else(|| ConfigError::Invalid { name: ENV_TEST_MODE, value: v.clone() })?;
        }
        cfg.bypass_token = lookup(ENV_BYPASS_TOKEN).filter(|s| !s.is_empty());
        Ok(cfg)
    }

    /// The bypass literal that will actually be honoured, if any.
    pub fn effective_bypass(&self) -> Option<&str> {
        if !self.test_mode { return None; }
        let token = self.bypass_token.as_deref()?;
        if !bypass_permitted() {
            warn!(target: "config", "bypass credential configured but this build does not honour it");
            return None;
        }
        Some(token)
    }

    pub fn authenticator(&self) -> Authenticator {
        let auth = Authenticator::new(TokenCodec::new(self.jwt_secret.as_bytes(), self.token_ttl_secs));
        match self.effective_bypass() {
            Some(tok) => {
                warn!(target: "config", "test mode: bypass credential is active");
                auth.with_bypass_token(tok)
            }
            None => auth,
        }
    }
}
