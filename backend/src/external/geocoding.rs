//! Address lookup client
//!
//! Resolves free-text locations through a Nominatim-compatible search
//! endpoint. One request per lookup, no retries.

use std::time::Duration;

use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GeocoderConfig;
use crate::error::{AppError, AppResult};
use crate::models::GpsCoordinates;

/// Resolves a location string to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `location`.
    ///
    /// Empty input is `InvalidInput`, no match is `NotFound`, and any
    /// transport, status or timeout failure is `UpstreamUnavailable`.
    async fn geocode(&self, location: &str) -> AppResult<GpsCoordinates>;
}

/// Nominatim search client
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

/// One element of the search response; coordinates come back as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> AppResult<Self> {
        Self::with_base_url(config, config.base_url.clone())
    }

    /// Create a client against a different endpoint (for testing)
    pub fn with_base_url(config: &GeocoderConfig, base_url: String) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build geocoder client: {}", e)))?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, location: &str) -> AppResult<GpsCoordinates> {
        let location = location.trim();
        if location.is_empty() {
            return Err(AppError::InvalidInput("Location must not be empty".to_string()));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "request failed" };
                tracing::warn!(location, error = %e, "Geocoding {}", reason);
                AppError::UpstreamUnavailable(format!("Geocoding service {}", reason))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(location, %status, "Geocoding service returned an error");
            return Err(AppError::UpstreamUnavailable(format!(
                "Geocoding service error: {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            tracing::warn!(location, error = %e, "Failed to read geocoding response");
            AppError::UpstreamUnavailable("Geocoding service response was cut short".to_string())
        })?;

        parse_first_match(&body, location)
    }
}

/// Take the first place of a search response
fn parse_first_match(body: &str, location: &str) -> AppResult<GpsCoordinates> {
    let places: Vec<Place> = serde_json::from_str(body).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Failed to parse geocoding response: {}", e))
    })?;

    let place = places.into_iter().next().ok_or_else(|| {
        AppError::NotFound(format!("Coordinates for location '{}'", location))
    })?;

    let latitude = place.lat.trim().parse::<f64>().map_err(|_| {
        AppError::UpstreamUnavailable(format!("Geocoding service sent bad latitude '{}'", place.lat))
    })?;
    let longitude = place.lon.trim().parse::<f64>().map_err(|_| {
        AppError::UpstreamUnavailable(format!(
            "Geocoding service sent bad longitude '{}'",
            place.lon
        ))
    })?;

    shared::validate_coordinates(latitude, longitude).map_err(|reason| {
        AppError::UpstreamUnavailable(format!(
            "Geocoding service sent an impossible position ({}, {}): {}",
            latitude, longitude, reason
        ))
    })?;

    Ok(GpsCoordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeocoderConfig {
        GeocoderConfig {
            base_url: "http://127.0.0.1:9/search".to_string(),
            user_agent: "Hirafic_Project/1.0".to_string(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_parse_first_match() {
        let body = r#"[
            {"place_id": 1, "lat": "36.7537703", "lon": "3.0587927", "display_name": "Alger"},
            {"place_id": 2, "lat": "0.0", "lon": "0.0"}
        ]"#;
        let coords = parse_first_match(body, "Algiers").unwrap();
        assert!((coords.latitude - 36.7537703).abs() < 1e-9);
        assert!((coords.longitude - 3.0587927).abs() < 1e-9);
    }

    #[test]
    fn test_no_match_is_not_found_and_names_location() {
        let err = parse_first_match("[]", "Atlantis").unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("Atlantis")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_off_globe_answer_is_upstream_failure() {
        let body = r#"[{"lat": "123.5", "lon": "3.05"}]"#;
        let err = parse_first_match(body, "Algiers").unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(ref m) if m.contains("Latitude")));
    }

    #[test]
    fn test_garbage_body_is_upstream_failure() {
        assert!(matches!(
            parse_first_match("<html>", "Oran"),
            Err(AppError::UpstreamUnavailable(_))
        ));
        assert!(matches!(
            parse_first_match(r#"[{"lat": "north", "lon": "1.0"}]"#, "Oran"),
            Err(AppError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_location_is_rejected_before_any_request() {
        let client = NominatimClient::new(&config()).unwrap();
        assert!(matches!(
            client.geocode("   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_upstream_failure() {
        let client = NominatimClient::new(&config()).unwrap();
        assert!(matches!(
            client.geocode("Constantine").await,
            Err(AppError::UpstreamUnavailable(_))
        ));
    }
}
