//! Client and artisan profiles
//!
//! A profile can only be read or edited by its owner. Views fill in
//! missing coordinates when they can; edits that change the location
//! geocode the new one.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::external::Geocoder;
use crate::middleware::AuthUser;
use crate::models::{Account, ArtisanProfile, ClientProfile, GpsCoordinates, Profile, Role};
use crate::services::LocationService;
use crate::store::{AccountUpdate, Store};

/// Profile edit; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub specialization: Option<String>,
    pub skills: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    locations: LocationService,
}

fn invalid(field: &str) -> impl FnOnce(&'static str) -> AppError + '_ {
    move |message| AppError::field(field, message)
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            locations: LocationService::new(store.clone(), geocoder),
            store,
        }
    }

    pub async fn client(&self, caller: &AuthUser, username: &str) -> AppResult<ClientProfile> {
        let mut client = self.owned_account(caller, username, Role::Client).await?;
        self.locations.ensure_lenient(&mut client.profile).await;
        match client.profile {
            Profile::Client(profile) => Ok(profile),
            Profile::Artisan(_) => Err(AppError::Forbidden("Not a client account".to_string())),
        }
    }

    pub async fn artisan(&self, caller: &AuthUser, username: &str) -> AppResult<ArtisanProfile> {
        let mut artisan = self.owned_account(caller, username, Role::Artisan).await?;
        self.locations.ensure_lenient(&mut artisan.profile).await;
        match artisan.profile {
            Profile::Artisan(profile) => Ok(profile),
            Profile::Client(_) => Err(AppError::Forbidden("Not an artisan account".to_string())),
        }
    }

    /// Apply an edit to the caller's own profile
    pub async fn update(
        &self,
        caller: &AuthUser,
        username: &str,
        role: Role,
        input: UpdateProfileInput,
    ) -> AppResult<Profile> {
        let current = self.owned_account(caller, username, role).await?;

        let username = input
            .username
            .map(|u| u.trim().to_string())
            .unwrap_or_else(|| current.user.username.clone());
        shared::validate_username(&username).map_err(invalid("username"))?;

        let email = input
            .email
            .map(|e| shared::normalize_email(&e))
            .unwrap_or_else(|| current.user.email.clone());
        shared::validate_email(&email).map_err(invalid("email"))?;

        let phone_number = input
            .phone_number
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| current.user.phone_number.clone());
        shared::validate_phone_number(&phone_number).map_err(invalid("phone_number"))?;

        let location = input
            .location
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| current.profile.location().to_string());
        shared::validate_location(&location).map_err(invalid("location"))?;

        if let Some(rate) = input.hourly_rate {
            shared::validate_hourly_rate(rate).map_err(invalid("hourly_rate"))?;
        }

        let location_changed = location != current.profile.location();
        let (specialization, skills, hourly_rate) = match role {
            Role::Artisan => (input.specialization, input.skills, input.hourly_rate),
            Role::Client => (None, None, None),
        };

        let mut updated = self
            .store
            .update_account(
                caller.user_id,
                AccountUpdate {
                    username,
                    email,
                    phone_number,
                    location,
                    specialization,
                    skills,
                    hourly_rate,
                },
            )
            .await?;

        tracing::info!(user_id = %caller.user_id, location_changed, "Profile updated");

        if location_changed {
            self.locations.refresh_after_write(&mut updated.profile).await;
        }
        Ok(updated.profile)
    }

    /// The calling artisan's coordinates
    pub async fn artisan_location(&self, caller: &AuthUser) -> AppResult<GpsCoordinates> {
        let mut account = self.caller_account(caller).await?;
        if account.profile.role() != Role::Artisan {
            return Err(AppError::Forbidden(
                "Only artisans have a service location".to_string(),
            ));
        }
        self.locations.ensure(&mut account.profile).await
    }

    /// Every artisan on the platform. An empty directory is `NotFound`.
    pub async fn directory(&self) -> AppResult<Vec<ArtisanProfile>> {
        let artisans = self.store.list_artisans().await?;
        if artisans.is_empty() {
            return Err(AppError::NotFound("Artisans".to_string()));
        }
        Ok(artisans)
    }

    async fn caller_account(&self, caller: &AuthUser) -> AppResult<Account> {
        self.store
            .find_account(caller.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// The caller's account, provided `username` and `role` are theirs
    async fn owned_account(
        &self,
        caller: &AuthUser,
        username: &str,
        role: Role,
    ) -> AppResult<Account> {
        let account = self.caller_account(caller).await?;
        if account.profile.role() != role {
            return Err(AppError::Forbidden(format!(
                "This page is for {} accounts",
                role.as_str().to_lowercase()
            )));
        }
        if account.user.username != username {
            return Err(AppError::Forbidden(
                "You can only access your own profile".to_string(),
            ));
        }
        Ok(account)
    }
}
