//! Shared types and models for the Hirafic artisan marketplace
//!
//! This crate contains the domain types shared between the backend service
//! and any other component that speaks its JSON API.

pub mod geo;
pub mod models;
pub mod types;
pub mod validation;

pub use geo::*;
pub use models::*;
pub use types::*;
pub use validation::*;
