//! Nearby-artisan search
//!
//! A linear scan over every artisan, keeping those whose great-circle
//! distance from the client is within the radius.

use std::sync::Arc;

use shared::{great_circle_km, validate_radius_km};

use crate::error::{AppError, AppResult};
use crate::external::Geocoder;
use crate::middleware::AuthUser;
use crate::models::{ArtisanProfile, GpsCoordinates};
use crate::services::LocationService;
use crate::store::Store;

/// Keep the candidates within `radius_km` of `origin`, in input order.
///
/// A radius of zero only keeps exact matches. A negative or non-finite
/// radius is rejected.
pub fn find_nearby<T>(
    origin: GpsCoordinates,
    radius_km: f64,
    candidates: impl IntoIterator<Item = (T, GpsCoordinates)>,
) -> AppResult<Vec<T>> {
    validate_radius_km(radius_km).map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

    Ok(candidates
        .into_iter()
        .filter(|(_, position)| great_circle_km(origin, *position) <= radius_km)
        .map(|(candidate, _)| candidate)
        .collect())
}

/// Finds artisans around a client
#[derive(Clone)]
pub struct NearbyService {
    store: Arc<dyn Store>,
    locations: LocationService,
}

impl NearbyService {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            locations: LocationService::new(store.clone(), geocoder),
            store,
        }
    }

    /// Artisans within `radius_km` of the client named `username`.
    ///
    /// Only that client may search from their own location. The client's
    /// position must resolve; artisans whose location cannot be resolved
    /// are left out.
    pub async fn search(
        &self,
        caller: &AuthUser,
        username: &str,
        radius_km: f64,
    ) -> AppResult<Vec<ArtisanProfile>> {
        validate_radius_km(radius_km).map_err(|msg| AppError::InvalidInput(msg.to_string()))?;

        let mut client = self
            .store
            .find_client_by_name(username)
            .await?
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        if client.user_id != caller.user_id {
            return Err(AppError::Forbidden(
                "You can only search from your own profile".to_string(),
            ));
        }

        let origin = self.locations.ensure(&mut client).await?;

        let artisans = self.store.list_artisans().await?;
        let mut located = Vec::with_capacity(artisans.len());
        for mut artisan in artisans {
            if let Some(position) = self.locations.ensure_lenient(&mut artisan).await {
                located.push((artisan, position));
            }
        }

        let nearby = find_nearby(origin, radius_km, located)?;
        tracing::debug!(
            client = %client.name,
            radius_km,
            found = nearby.len(),
            "Nearby artisan search"
        );
        Ok(nearby)
    }
}
