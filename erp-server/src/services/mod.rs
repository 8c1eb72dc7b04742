//! Multi-step operations
//!
//! Anything that must read, check and write inside one transaction lives
//! here; handlers call these and the plain `db` functions directly.

pub mod inventory;
pub mod jobs;
pub mod prepress;
pub mod purchasing;
pub mod workflow;
