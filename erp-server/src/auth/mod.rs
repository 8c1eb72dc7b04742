//! Authentication and authorization
//!
//! - [`JwtService`] issues and validates access tokens
//! - [`CurrentUser`] is the authenticated caller, available as an extractor
//! - [`require_auth`] / [`require_permission`] guard routers
//! - [`rate_limit`] throttles the login route per client IP

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod permissions;
pub mod rate_limit;

pub use jwt::{CurrentUser, JwtError, JwtService};
pub use middleware::{require_auth, require_permission};
