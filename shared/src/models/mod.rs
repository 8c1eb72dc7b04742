//! Data models
//!
//! Shared between the server and its API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (PostgreSQL BIGSERIAL), timestamps are Unix millis.

pub mod company;
pub mod dashboard;
pub mod department;
pub mod inventory;
pub mod job_card;
pub mod material;
pub mod prepress;
pub mod process;
pub mod product;
pub mod purchase_order;
pub mod role;
pub mod user;

// Re-exports
pub use company::*;
pub use dashboard::*;
pub use inventory::*;
pub use job_card::*;
pub use material::*;
pub use prepress::*;
pub use process::*;
pub use product::*;
pub use purchase_order::*;
pub use role::*;
pub use user::*;
