//! Route definitions for the Hirafic marketplace

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        // Artisan directory (public)
        .route("/artisans", get(handlers::list_artisans))
        // Protected routes
        .merge(client_routes(state.clone()))
        .merge(artisan_routes(state.clone()))
        .merge(booking_routes(state.clone()))
        .merge(account_routes(state))
}

/// Client profile and nearby search routes (protected)
fn client_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/client/:username",
            get(handlers::get_client).put(handlers::update_client),
        )
        .route(
            "/client/:username/nearby_artisans",
            get(handlers::nearby_artisans).post(handlers::search_nearby_artisans),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Artisan profile routes (protected)
fn artisan_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/artisan/:username",
            get(handlers::get_artisan).put(handlers::update_artisan),
        )
        .route("/location", get(handlers::get_location))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Booking and report routes (protected)
fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/book_artisan", post(handlers::book_artisan))
        .route("/bookings", get(handlers::list_bookings))
        .route(
            "/bookings/:booking_id/status",
            patch(handlers::update_booking_status),
        )
        .route("/report", post(handlers::submit_report))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Account management routes (protected)
fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/delete_account", delete(handlers::delete_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
