//! Domain models for the Hirafic marketplace

mod artisan;
mod booking;
mod client;
mod report;
mod user;

pub use artisan::*;
pub use booking::*;
pub use client::*;
pub use report::*;
pub use user::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// The role-specific half of an account. A user owns exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", content = "profile")]
pub enum Profile {
    Client(ClientProfile),
    Artisan(ArtisanProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Client(_) => Role::Client,
            Profile::Artisan(_) => Role::Artisan,
        }
    }

    /// Id of the profile row (not the user)
    pub fn id(&self) -> Uuid {
        match self {
            Profile::Client(client) => client.id,
            Profile::Artisan(artisan) => artisan.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Profile::Client(client) => &client.name,
            Profile::Artisan(artisan) => &artisan.name,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Profile::Client(client) => &client.location,
            Profile::Artisan(artisan) => &artisan.location,
        }
    }

    pub fn coordinates(&self) -> Option<GpsCoordinates> {
        match self {
            Profile::Client(client) => client.coordinates(),
            Profile::Artisan(artisan) => artisan.coordinates(),
        }
    }

    /// Overwrite the cached coordinates on whichever profile this is
    pub fn set_coordinates(&mut self, coordinates: GpsCoordinates) {
        let (latitude, longitude) = match self {
            Profile::Client(client) => (&mut client.latitude, &mut client.longitude),
            Profile::Artisan(artisan) => (&mut artisan.latitude, &mut artisan.longitude),
        };
        *latitude = Some(coordinates.latitude);
        *longitude = Some(coordinates.longitude);
    }
}

/// A user together with their role-specific profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub user: User,
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn client() -> ClientProfile {
        ClientProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: "0612345678".to_string(),
            location: "Rabat".to_string(),
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_role_matches_variant() {
        let profile = Profile::Client(client());
        assert_eq!(profile.role(), Role::Client);
        assert_eq!(profile.name(), "alice");
    }

    #[test]
    fn test_set_coordinates() {
        let mut profile = Profile::Client(client());
        assert!(profile.coordinates().is_none());

        profile.set_coordinates(GpsCoordinates::new(34.02, -6.84));
        assert_eq!(profile.coordinates(), Some(GpsCoordinates::new(34.02, -6.84)));
    }
}
