//! Artisan profile and directory handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{ArtisanProfile, Presented, Profile, Role};
use crate::services::{present, profile::UpdateProfileInput, PageRequest, ProfileService};
use crate::AppState;

/// Public view of an artisan in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtisanSummary {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub location: String,
    pub specialization: String,
    pub skills: String,
    pub hourly_rate: Option<Decimal>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<ArtisanProfile> for ArtisanSummary {
    fn from(artisan: ArtisanProfile) -> Self {
        Self {
            username: artisan.name,
            email: artisan.email,
            phone_number: artisan.phone_number,
            location: artisan.location,
            specialization: artisan.specialization,
            skills: artisan.skills,
            hourly_rate: artisan.hourly_rate,
            latitude: artisan.latitude,
            longitude: artisan.longitude,
        }
    }
}

/// A bare list, or one page of it when `page` was requested
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ArtisanListing {
    All(Vec<ArtisanSummary>),
    Page {
        artisans: Vec<ArtisanSummary>,
        total_pages: u32,
        current_page: u32,
    },
}

impl From<Presented<ArtisanSummary>> for ArtisanListing {
    fn from(presented: Presented<ArtisanSummary>) -> Self {
        match presented {
            Presented::All(artisans) => ArtisanListing::All(artisans),
            Presented::Paged(page) => ArtisanListing::Page {
                artisans: page.items,
                total_pages: page.total_pages,
                current_page: page.current_page,
            },
        }
    }
}

/// Sort by username and page the artisans as requested
pub fn artisan_listing(
    artisans: Vec<ArtisanProfile>,
    request: PageRequest,
    default_per_page: u32,
) -> AppResult<ArtisanListing> {
    let summaries = artisans.into_iter().map(ArtisanSummary::from).collect();
    let presented = present(
        summaries,
        |artisan: &ArtisanSummary| artisan.username.as_str(),
        request,
        default_per_page,
    )?;
    Ok(presented.into())
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        PageRequest {
            page: query.page,
            per_page: query.per_page,
        }
    }
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub long: f64,
}

/// Public directory of every artisan
pub async fn list_artisans(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ArtisanListing>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    let artisans = service.directory().await?;

    Ok(Json(artisan_listing(
        artisans,
        PageRequest::from(&query),
        state.config.search.default_per_page,
    )?))
}

pub async fn get_artisan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<ArtisanProfile>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    Ok(Json(service.artisan(&user, &username).await?))
}

pub async fn update_artisan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Json(body): Json<UpdateProfileInput>,
) -> AppResult<Json<Profile>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    let profile = service.update(&user, &username, Role::Artisan, body).await?;
    Ok(Json(profile))
}

/// Coordinates of the calling artisan
pub async fn get_location(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<LocationResponse>> {
    let service = ProfileService::new(state.store.clone(), state.geocoder.clone());
    let coordinates = service.artisan_location(&user).await?;

    Ok(Json(LocationResponse {
        lat: coordinates.latitude,
        long: coordinates.longitude,
    }))
}
