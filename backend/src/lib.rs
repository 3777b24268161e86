//! Hirafic marketplace backend
//!
//! Clients find artisans near them, book them and report issues. The
//! binary in `main.rs` wires this library to PostgreSQL, the geocoding
//! service and SMTP.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::{Geocoder, Mailer};
use services::NotificationService;
use store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.mailer.clone(), self.config.mail.operations_mailbox.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Hirafic Marketplace API v1.0"
}
