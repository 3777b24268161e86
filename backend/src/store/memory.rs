//! In-process store used when `database.backend = "memory"`

use std::collections::HashMap;

use axum::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    active_bookings_conflict, AccountUpdate, Credentials, NewAccount, NewBooking, NewReport, Store,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    Account, ArtisanProfile, Booking, BookingDetails, BookingStatus, ClientProfile,
    GpsCoordinates, Profile, Report, Role, User, DEFAULT_IMAGE_FILE,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, Credentials>,
    clients: HashMap<Uuid, ClientProfile>,
    artisans: HashMap<Uuid, ArtisanProfile>,
    bookings: HashMap<Uuid, Booking>,
    reports: HashMap<Uuid, Report>,
}

impl Tables {
    fn profile_of(&self, user: &User) -> Option<Profile> {
        match user.role {
            Role::Client => self
                .clients
                .values()
                .find(|c| c.user_id == user.id)
                .cloned()
                .map(Profile::Client),
            Role::Artisan => self
                .artisans
                .values()
                .find(|a| a.user_id == user.id)
                .cloned()
                .map(Profile::Artisan),
        }
    }

    fn account(&self, user_id: Uuid) -> Option<Account> {
        let user = self.users.get(&user_id)?.user.clone();
        let profile = self.profile_of(&user)?;
        Some(Account { user, profile })
    }

    /// Enforce the unique columns of users and profiles, skipping `owner`
    fn check_unique(&self, username: &str, email: &str, owner: Option<Uuid>) -> AppResult<()> {
        let others = self.users.values().filter(|c| Some(c.user.id) != owner);
        for credentials in others {
            if credentials.user.username == username {
                return Err(AppError::DuplicateEntry("username".to_string()));
            }
            if credentials.user.email == email {
                return Err(AppError::DuplicateEntry("email".to_string()));
            }
        }
        Ok(())
    }

    fn details(&self, booking: &Booking) -> BookingDetails {
        BookingDetails {
            booking: booking.clone(),
            client_name: self
                .clients
                .get(&booking.client_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            artisan_name: self
                .artisans
                .get(&booking.artisan_id)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
        }
    }
}

/// Hash-map backed [`Store`]
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_account(&self, account: NewAccount) -> AppResult<Account> {
        let mut tables = self.tables.write().await;
        tables.check_unique(&account.username, &account.email, None)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: account.username.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
            role: account.role,
            location: account.location.clone(),
            image_file: DEFAULT_IMAGE_FILE.to_string(),
            created_at: now,
        };

        let profile = match account.role {
            Role::Client => {
                let client = ClientProfile {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    name: account.username,
                    email: account.email,
                    phone_number: account.phone_number,
                    location: account.location,
                    latitude: None,
                    longitude: None,
                    created_at: now,
                };
                tables.clients.insert(client.id, client.clone());
                Profile::Client(client)
            }
            Role::Artisan => {
                let artisan = ArtisanProfile {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    name: account.username,
                    email: account.email,
                    phone_number: account.phone_number,
                    location: account.location,
                    latitude: None,
                    longitude: None,
                    specialization: account.specialization,
                    skills: account.skills,
                    hourly_rate: account.hourly_rate,
                    created_at: now,
                };
                tables.artisans.insert(artisan.id, artisan.clone());
                Profile::Artisan(artisan)
            }
        };

        tables.users.insert(
            user.id,
            Credentials {
                user: user.clone(),
                password_hash: account.password_hash,
            },
        );

        Ok(Account { user, profile })
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|c| c.user.email == email).cloned())
    }

    async fn find_account(&self, user_id: Uuid) -> AppResult<Option<Account>> {
        Ok(self.tables.read().await.account(user_id))
    }

    async fn update_account(&self, user_id: Uuid, update: AccountUpdate) -> AppResult<Account> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::NotFound("User".to_string()));
        }
        tables.check_unique(&update.username, &update.email, Some(user_id))?;

        let role = match tables.users.get_mut(&user_id) {
            Some(credentials) => {
                let user = &mut credentials.user;
                user.username = update.username.clone();
                user.email = update.email.clone();
                user.phone_number = update.phone_number.clone();
                user.location = update.location.clone();
                user.role
            }
            None => return Err(AppError::NotFound("User".to_string())),
        };

        match role {
            Role::Client => {
                if let Some(client) = tables.clients.values_mut().find(|c| c.user_id == user_id) {
                    if client.location != update.location {
                        client.latitude = None;
                        client.longitude = None;
                    }
                    client.name = update.username;
                    client.email = update.email;
                    client.phone_number = update.phone_number;
                    client.location = update.location;
                }
            }
            Role::Artisan => {
                if let Some(artisan) = tables.artisans.values_mut().find(|a| a.user_id == user_id) {
                    if artisan.location != update.location {
                        artisan.latitude = None;
                        artisan.longitude = None;
                    }
                    artisan.name = update.username;
                    artisan.email = update.email;
                    artisan.phone_number = update.phone_number;
                    artisan.location = update.location;
                    if let Some(specialization) = update.specialization {
                        artisan.specialization = specialization;
                    }
                    if let Some(skills) = update.skills {
                        artisan.skills = skills;
                    }
                    if update.hourly_rate.is_some() {
                        artisan.hourly_rate = update.hourly_rate;
                    }
                }
            }
        }

        tables
            .account(user_id)
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))
    }

    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<ClientProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.clients.values().find(|c| c.email == email).cloned())
    }

    async fn find_client_by_name(&self, name: &str) -> AppResult<Option<ClientProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.clients.values().find(|c| c.name == name).cloned())
    }

    async fn find_artisan_by_email(&self, email: &str) -> AppResult<Option<ArtisanProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.artisans.values().find(|a| a.email == email).cloned())
    }

    async fn find_artisan_by_name(&self, name: &str) -> AppResult<Option<ArtisanProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.artisans.values().find(|a| a.name == name).cloned())
    }

    async fn list_artisans(&self) -> AppResult<Vec<ArtisanProfile>> {
        let tables = self.tables.read().await;
        let mut artisans: Vec<_> = tables.artisans.values().cloned().collect();
        artisans.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artisans)
    }

    async fn save_coordinates(
        &self,
        role: Role,
        profile_id: Uuid,
        location: &str,
        coordinates: GpsCoordinates,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let slot = match role {
            Role::Client => tables
                .clients
                .get_mut(&profile_id)
                .filter(|c| c.location == location)
                .map(|c| (&mut c.latitude, &mut c.longitude)),
            Role::Artisan => tables
                .artisans
                .get_mut(&profile_id)
                .filter(|a| a.location == location)
                .map(|a| (&mut a.latitude, &mut a.longitude)),
        };

        match slot {
            Some((latitude, longitude)) => {
                *latitude = Some(coordinates.latitude);
                *longitude = Some(coordinates.longitude);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tables = self.tables.write().await;
        if !tables.clients.contains_key(&booking.client_id) {
            return Err(AppError::NotFound("Client".to_string()));
        }
        if !tables.artisans.contains_key(&booking.artisan_id) {
            return Err(AppError::NotFound("Artisan".to_string()));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            client_id: booking.client_id,
            artisan_id: booking.artisan_id,
            title: booking.title,
            details: booking.details,
            status: BookingStatus::Pending,
            request_date: booking.request_date,
            completion_date: Some(booking.completion_date),
            created_at: Utc::now(),
        };
        tables.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings(&self, role: Role, profile_id: Uuid) -> AppResult<Vec<BookingDetails>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| match role {
                Role::Client => b.client_id == profile_id,
                Role::Artisan => b.artisan_id == profile_id,
            })
            .map(|b| tables.details(b))
            .collect();
        bookings.sort_by(|a, b| b.booking.request_date.cmp(&a.booking.request_date));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        completion_date: Option<DateTime<Utc>>,
    ) -> AppResult<Booking> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        if booking.status != expected {
            return Err(AppError::InvalidStateTransition(format!(
                "Booking is now {}, cannot move it to {}",
                booking.status, status
            )));
        }
        booking.status = status;
        if completion_date.is_some() {
            booking.completion_date = completion_date;
        }
        Ok(booking.clone())
    }

    async fn insert_report(&self, report: NewReport) -> AppResult<Report> {
        let mut tables = self.tables.write().await;
        if !tables.bookings.contains_key(&report.booking_id) {
            return Err(AppError::NotFound("Booking".to_string()));
        }

        let report = Report {
            id: Uuid::new_v4(),
            client_id: report.client_id,
            artisan_id: report.artisan_id,
            booking_id: report.booking_id,
            issue: report.issue,
            created_at: Utc::now(),
        };
        tables.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let account = tables
            .account(user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let profile_id = account.profile.id();
        let owns = |b: &Booking| match account.profile {
            Profile::Client(_) => b.client_id == profile_id,
            Profile::Artisan(_) => b.artisan_id == profile_id,
        };

        let open = tables
            .bookings
            .values()
            .filter(|b| owns(*b) && !b.status.is_settled())
            .count();
        if open > 0 {
            return Err(active_bookings_conflict(open));
        }

        let doomed: Vec<Uuid> = tables
            .bookings
            .values()
            .filter(|b| owns(*b))
            .map(|b| b.id)
            .collect();

        tables.reports.retain(|_, r| {
            !doomed.contains(&r.booking_id) && r.client_id != profile_id && r.artisan_id != profile_id
        });
        tables.bookings.retain(|id, _| !doomed.contains(id));
        match account.profile {
            Profile::Client(_) => {
                tables.clients.remove(&profile_id);
            }
            Profile::Artisan(_) => {
                tables.artisans.remove(&profile_id);
            }
        }
        tables.users.remove(&user_id);

        Ok(())
    }
}
