//! Client (service requester) profile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// A service requester
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub location: String,
    /// Null until the location has been geocoded
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ClientProfile {
    pub fn coordinates(&self) -> Option<GpsCoordinates> {
        GpsCoordinates::from_parts(self.latitude, self.longitude)
    }
}
