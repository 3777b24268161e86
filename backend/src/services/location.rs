//! Profile coordinates
//!
//! Coordinates are resolved when a location is written and cached on the
//! profile. Reads reuse the cached pair and only call the geocoder when it
//! is still missing.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::external::Geocoder;
use crate::models::{ArtisanProfile, ClientProfile, GpsCoordinates, Profile, Role};
use crate::store::Store;

/// A profile with a free-text location and cached coordinates
pub trait Geolocated {
    fn role(&self) -> Role;
    fn profile_id(&self) -> Uuid;
    fn location(&self) -> &str;
    fn cached_coordinates(&self) -> Option<GpsCoordinates>;
    fn cache_coordinates(&mut self, coordinates: GpsCoordinates);
}

impl Geolocated for ClientProfile {
    fn role(&self) -> Role {
        Role::Client
    }

    fn profile_id(&self) -> Uuid {
        self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn cached_coordinates(&self) -> Option<GpsCoordinates> {
        self.coordinates()
    }

    fn cache_coordinates(&mut self, coordinates: GpsCoordinates) {
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
    }
}

impl Geolocated for ArtisanProfile {
    fn role(&self) -> Role {
        Role::Artisan
    }

    fn profile_id(&self) -> Uuid {
        self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn cached_coordinates(&self) -> Option<GpsCoordinates> {
        self.coordinates()
    }

    fn cache_coordinates(&mut self, coordinates: GpsCoordinates) {
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
    }
}

impl Geolocated for Profile {
    fn role(&self) -> Role {
        Profile::role(self)
    }

    fn profile_id(&self) -> Uuid {
        self.id()
    }

    fn location(&self) -> &str {
        Profile::location(self)
    }

    fn cached_coordinates(&self) -> Option<GpsCoordinates> {
        self.coordinates()
    }

    fn cache_coordinates(&mut self, coordinates: GpsCoordinates) {
        self.set_coordinates(coordinates);
    }
}

/// Geocodes profiles and persists the result
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationService {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    /// Geocode the profile's current location and store the result.
    ///
    /// On failure nothing is written and the profile is left as it was.
    pub async fn resolve<P: Geolocated + Send>(&self, profile: &mut P) -> AppResult<GpsCoordinates> {
        let coordinates = self.geocoder.geocode(profile.location()).await?;

        let saved = self
            .store
            .save_coordinates(
                profile.role(),
                profile.profile_id(),
                profile.location(),
                coordinates,
            )
            .await?;
        if !saved {
            // Location was edited while we were looking it up
            tracing::debug!(
                profile_id = %profile.profile_id(),
                "Profile location changed during geocoding; result not cached"
            );
        }

        profile.cache_coordinates(coordinates);
        Ok(coordinates)
    }

    /// Cached coordinates, geocoding only when none are stored yet
    pub async fn ensure<P: Geolocated + Send>(&self, profile: &mut P) -> AppResult<GpsCoordinates> {
        match profile.cached_coordinates() {
            Some(coordinates) => Ok(coordinates),
            None => self.resolve(profile).await,
        }
    }

    /// Like [`ensure`](Self::ensure) but a failed lookup only logs
    pub async fn ensure_lenient<P: Geolocated + Send>(
        &self,
        profile: &mut P,
    ) -> Option<GpsCoordinates> {
        match self.ensure(profile).await {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                tracing::warn!(
                    profile_id = %profile.profile_id(),
                    location = %profile.location(),
                    error = %e,
                    "Could not resolve profile location"
                );
                None
            }
        }
    }

    /// Geocode after a location was written; a failure leaves the
    /// coordinates empty for a later read to fill in
    pub async fn refresh_after_write<P: Geolocated + Send>(&self, profile: &mut P) {
        if let Err(e) = self.resolve(profile).await {
            tracing::warn!(
                profile_id = %profile.profile_id(),
                location = %profile.location(),
                error = %e,
                "Geocoding on write failed; coordinates left empty"
            );
        }
    }
}
