//! Booking models and status lifecycle

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ParseEnumError;

/// Wire format accepted for `completion_date`, e.g. `2025-01-31T09:30:00.000Z`
pub const COMPLETION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Title used when the client does not supply one
pub const DEFAULT_BOOKING_TITLE: &str = "Service request";

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BookingStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::Rejected => "Rejected",
            BookingStatus::Completed => "Completed",
        }
    }

    /// Allowed moves:
    ///
    /// - Pending -> Accepted | Rejected | Completed
    /// - Accepted -> Completed | Rejected
    /// - Rejected, Completed: terminal
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Completed)
                | (Accepted, Completed)
                | (Accepted, Rejected)
        )
    }

    /// Only completed bookings let an account be deleted
    pub fn is_settled(&self) -> bool {
        matches!(self, BookingStatus::Completed)
    }

    /// Accepting and rejecting are the provider's decision
    pub fn requires_artisan(&self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::Rejected)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Accepted" => Ok(BookingStatus::Accepted),
            "Rejected" => Ok(BookingStatus::Rejected),
            "Completed" => Ok(BookingStatus::Completed),
            other => Err(ParseEnumError {
                kind: "booking status",
                value: other.to_string(),
            }),
        }
    }
}

/// A service request from a client to an artisan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub artisan_id: Uuid,
    pub title: String,
    pub details: String,
    pub status: BookingStatus,
    pub request_date: DateTime<Utc>,
    /// Expected date while open, actual date once completed
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A booking with both parties' display names resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub client_name: String,
    pub artisan_name: String,
}

/// Parse a `completion_date` in [`COMPLETION_DATE_FORMAT`], interpreted as UTC.
pub fn parse_completion_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), COMPLETION_DATE_FORMAT).map(|naive| naive.and_utc())
}
