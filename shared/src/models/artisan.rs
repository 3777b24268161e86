//! Artisan (service provider) profile

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// Specialization given to artisans who have not picked one yet
pub const DEFAULT_SPECIALIZATION: &str = "None";

/// A service provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtisanProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub specialization: String,
    pub skills: String,
    pub hourly_rate: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl ArtisanProfile {
    pub fn coordinates(&self) -> Option<GpsCoordinates> {
        GpsCoordinates::from_parts(self.latitude, self.longitude)
    }
}
