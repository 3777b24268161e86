//! Persistence layer
//!
//! Services talk to a [`Store`]; every method is one atomic unit of work.
//! [`PgStore`] runs each multi-row change inside a single transaction and
//! [`MemoryStore`] holds a write lock for the duration of the change.

use axum::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Account, ArtisanProfile, Booking, BookingDetails, BookingStatus, ClientProfile,
    GpsCoordinates, Report, Role, User,
};

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Everything needed to create a user and their profile
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub location: String,
    pub role: Role,
    pub specialization: String,
    pub skills: String,
    pub hourly_rate: Option<Decimal>,
}

/// Profile edit. Artisan-only fields are ignored for clients and left
/// untouched when `None`.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub location: String,
    pub specialization: Option<String>,
    pub skills: Option<String>,
    pub hourly_rate: Option<Decimal>,
}

/// A user row with its password hash, only used for login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub client_id: Uuid,
    pub artisan_id: Uuid,
    pub title: String,
    pub details: String,
    pub request_date: DateTime<Utc>,
    pub completion_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub client_id: Uuid,
    pub artisan_id: Uuid,
    pub booking_id: Uuid,
    pub issue: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user and the profile matching its role. Username and email
    /// clashes surface as `DuplicateEntry`.
    async fn create_account(&self, account: NewAccount) -> AppResult<Account>;

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>>;

    async fn find_account(&self, user_id: Uuid) -> AppResult<Option<Account>>;

    /// Update user and profile together. A changed location clears the
    /// cached coordinates.
    async fn update_account(&self, user_id: Uuid, update: AccountUpdate) -> AppResult<Account>;

    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<ClientProfile>>;

    async fn find_client_by_name(&self, name: &str) -> AppResult<Option<ClientProfile>>;

    async fn find_artisan_by_email(&self, email: &str) -> AppResult<Option<ArtisanProfile>>;

    async fn find_artisan_by_name(&self, name: &str) -> AppResult<Option<ArtisanProfile>>;

    async fn list_artisans(&self) -> AppResult<Vec<ArtisanProfile>>;

    /// Cache coordinates on a profile, but only if its location is still
    /// `location`. Returns whether a row was updated.
    async fn save_coordinates(
        &self,
        role: Role,
        profile_id: Uuid,
        location: &str,
        coordinates: GpsCoordinates,
    ) -> AppResult<bool>;

    /// Insert a booking in `Pending`
    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking>;

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>>;

    /// Bookings owned by a profile, newest request first
    async fn list_bookings(&self, role: Role, profile_id: Uuid) -> AppResult<Vec<BookingDetails>>;

    /// Move a booking from `expected` to `status`. Fails with
    /// `InvalidStateTransition` if the stored status is no longer `expected`.
    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        completion_date: Option<DateTime<Utc>>,
    ) -> AppResult<Booking>;

    async fn insert_report(&self, report: NewReport) -> AppResult<Report>;

    /// Delete a user, their profile, its bookings and any reports on them.
    /// Fails with `Conflict` while any of the bookings is not completed.
    async fn delete_account(&self, user_id: Uuid) -> AppResult<()>;
}

/// Error returned when an account still has open bookings
pub(crate) fn active_bookings_conflict(open: usize) -> crate::error::AppError {
    crate::error::AppError::Conflict {
        resource: "account".to_string(),
        message: format!(
            "Account cannot be deleted while it has {} active booking(s)",
            open
        ),
    }
}
