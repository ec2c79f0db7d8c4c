use axum::http::HeaderMap;

use super::RequestIdentity;

/// Everything the gates look at for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw `Authorization` header value, if any
    pub authorization: Option<String>,
    /// Path segment naming the owner of the addressed resource
    pub resource_id: Option<String>,
    /// Filled in by the authentication gate
    pub identity: Option<RequestIdentity>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let authorization = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        Self { authorization, ..Default::default() }
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_identity(mut self, identity: RequestIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Token part of `Authorization: Bearer <token>`: the second
    /// whitespace-separated segment, whatever the scheme word says.
    pub fn bearer_token(&self) -> Option<&str> {
        let raw = self.authorization.as_deref()?;
        raw.split_whitespace().nth(1).filter(|t| !t.is_empty())
    }
}
