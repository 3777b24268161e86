//! User identity and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default profile picture assigned at registration
pub const DEFAULT_IMAGE_FILE: &str = "default.jpeg";

/// The two sides of the marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Artisan,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Artisan => "Artisan",
            Role::Client => "Client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored or submitted enum value is unknown
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Artisan" => Ok(Role::Artisan),
            "Client" => Ok(Role::Client),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Always stored lower-cased
    pub email: String,
    pub phone_number: String,
    pub role: Role,
    pub location: String,
    pub image_file: String,
    pub created_at: DateTime<Utc>,
}
