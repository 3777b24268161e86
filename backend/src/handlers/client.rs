//! Client profile and nearby search handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::artisan::{artisan_listing, ArtisanListing};
use crate::middleware::{AuthUser, CurrentUser};
use crate::models::{ClientProfile, Profile, Role};
use crate::services::{profile::UpdateProfileInput, NearbyService, PageRequest, ProfileService};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NearbyQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub distance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyBody {
    pub distance: Option<f64>,
}

pub async fn get_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<ClientProfile>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    Ok(Json(service.client(&user, &username).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Json(body): Json<UpdateProfileInput>,
) -> AppResult<Json<Profile>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    let profile = service.update(&user, &username, Role::Client, body).await?;
    Ok(Json(profile))
}

/// `GET` variant; the radius may come in the query string
pub async fn nearby_artisans(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<ArtisanListing>> {
    let radius_km = query.distance;
    run_search(&state, &user, &username, radius_km, &query).await
}

/// `POST` variant with `{"distance": km}` in the body. An empty body falls
/// back to the query string.
pub async fn search_nearby_artisans(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<NearbyQuery>,
    body: Bytes,
) -> AppResult<Json<ArtisanListing>> {
    let body = parse_nearby_body(&body)?;
    let radius_km = body.distance.or(query.distance);
    run_search(&state, &user, &username, radius_km, &query).await
}

fn parse_nearby_body(raw: &[u8]) -> AppResult<NearbyBody> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(NearbyBody::default());
    }
    serde_json::from_slice(raw)
        .map_err(|e| AppError::InvalidInput(format!("Invalid request body: {}", e)))
}

async fn run_search(
    state: &AppState,
    user: &AuthUser,
    username: &str,
    radius_km: Option<f64>,
    query: &NearbyQuery,
) -> AppResult<Json<ArtisanListing>> {
    let radius_km = radius_km.unwrap_or(state.config.search.default_radius_km);
    let request = PageRequest {
        page: query.page,
        per_page: query.per_page,
    };
    // Reject bad paging before doing any geocoding
    request.resolve(state.config.search.default_per_page)?;

    let service = NearbyService::new(state.store.clone(), state.geocoder.clone());
    let artisans = service.search(user, username, radius_km).await?;

    Ok(Json(artisan_listing(
        artisans,
        request,
        state.config.search.default_per_page,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_means_no_distance() {
        assert_eq!(parse_nearby_body(b"").unwrap().distance, None);
        assert_eq!(parse_nearby_body(b" \n").unwrap().distance, None);
        assert_eq!(parse_nearby_body(b"{}").unwrap().distance, None);
        assert_eq!(parse_nearby_body(br#"{"distance": 12.5}"#).unwrap().distance, Some(12.5));
    }

    #[test]
    fn test_malformed_body_is_invalid_input() {
        let bodies: [&[u8]; 3] = [br#"{"distance":"far"}"#, b"{distance", b"5"];
        for raw in bodies {
            assert!(matches!(parse_nearby_body(raw), Err(AppError::InvalidInput(_))));
        }
    }
}
