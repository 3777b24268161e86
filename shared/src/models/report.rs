//! Issue reports filed by clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issue raised against a booking. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub client_id: Uuid,
    pub artisan_id: Uuid,
    pub booking_id: Uuid,
    pub issue: String,
    pub created_at: DateTime<Utc>,
}
