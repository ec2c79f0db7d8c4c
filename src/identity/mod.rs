//! Credentials, caller identity and the gates that authorize each request.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod request_context;
mod authorizer;
mod provider;

pub use principal::{RequestIdentity, Role};
pub use token::{Claims, TokenCodec, TokenError, DEFAULT_TOKEN_TTL_SECS};
pub use request_context::RequestContext;
pub use authorizer::{authenticate, require_organizer, require_owner, AuthError, Authenticator, Capability, Policy};
pub use provider::{Account, AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse, UserDirectory};
