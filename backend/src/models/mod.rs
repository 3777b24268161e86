//! Domain models used by the backend
//!
//! Re-exports the shared crate's models and common types

pub use shared::models::*;
pub use shared::types::*;
