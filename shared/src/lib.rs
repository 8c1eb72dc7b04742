//! Shared types for the print-shop ERP
//!
//! Domain models, error codes and request/response helpers used by the
//! server and mirrored by the frontend.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use request::{PaginationQuery, SearchQuery};
pub use response::PaginatedResponse;
