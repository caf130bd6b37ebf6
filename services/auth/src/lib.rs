//! Authentication for the concierge services
//!
//! Users sign in with email and password and receive an HS256 bearer token.
//! [`SessionAuthenticator`] verifies credentials against the user table,
//! issues tokens, and resolves presented tokens back to their users through
//! an in-process session registry.

pub mod authenticator;
pub mod jwt;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod session;
pub mod validation;

pub use authenticator::{AuthError, IssuedToken, SessionAuthenticator};
pub use jwt::{JwtConfig, JwtService};
pub use models::{NewUser, User};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use repositories::UserRepository;
