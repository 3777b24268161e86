//! PostgreSQL store

use axum::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    active_bookings_conflict, AccountUpdate, Credentials, NewAccount, NewBooking, NewReport, Store,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    Account, ArtisanProfile, Booking, BookingDetails, BookingStatus, ClientProfile,
    GpsCoordinates, Profile, Report, Role, User,
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, phone_number, role, location, image_file, created_at";
const CLIENT_COLUMNS: &str =
    "id, user_id, name, email, phone_number, location, latitude, longitude, created_at";
const ARTISAN_COLUMNS: &str = "id, user_id, name, email, phone_number, location, latitude, longitude, \
     specialization, skills, hourly_rate, created_at";
const BOOKING_COLUMNS: &str =
    "id, client_id, artisan_id, title, details, status, request_date, completion_date, created_at";

/// sqlx-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    phone_number: String,
    role: String,
    location: String,
    image_file: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_credentials(self) -> AppResult<Credentials> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Credentials {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                phone_number: self.phone_number,
                role,
                location: self.location,
                image_file: self.image_file,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        })
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    email: String,
    phone_number: String,
    location: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for ClientProfile {
    fn from(row: ClientRow) -> Self {
        ClientProfile {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ArtisanRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    email: String,
    phone_number: String,
    location: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    specialization: String,
    skills: String,
    hourly_rate: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<ArtisanRow> for ArtisanProfile {
    fn from(row: ArtisanRow) -> Self {
        ArtisanProfile {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            specialization: row.specialization,
            skills: row.skills,
            hourly_rate: row.hourly_rate,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    client_id: Uuid,
    artisan_id: Uuid,
    title: String,
    details: String,
    status: String,
    request_date: DateTime<Utc>,
    completion_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> AppResult<Self> {
        Ok(Booking {
            id: row.id,
            client_id: row.client_id,
            artisan_id: row.artisan_id,
            title: row.title,
            details: row.details,
            status: row
                .status
                .parse::<BookingStatus>()
                .map_err(|e| AppError::Internal(e.to_string()))?,
            request_date: row.request_date,
            completion_date: row.completion_date,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BookingDetailsRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    client_name: String,
    artisan_name: String,
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: Uuid,
    client_id: Uuid,
    artisan_id: Uuid,
    booking_id: Uuid,
    issue: String,
    created_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            client_id: row.client_id,
            artisan_id: row.artisan_id,
            booking_id: row.booking_id,
            issue: row.issue,
            created_at: row.created_at,
        }
    }
}

/// Turn unique-constraint violations into `DuplicateEntry` naming the column
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("username") || c.contains("name_key") => "username",
                Some(c) if c.contains("email") => "email",
                _ => "record",
            };
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::DatabaseError(err)
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn load_profile(
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
    ) -> AppResult<Option<Profile>> {
        let profile = match user.role {
            Role::Client => sqlx::query_as::<_, ClientRow>(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients WHERE user_id = $1"
            ))
            .bind(user.id)
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| Profile::Client(row.into())),
            Role::Artisan => sqlx::query_as::<_, ArtisanRow>(&format!(
                "SELECT {ARTISAN_COLUMNS} FROM artisans WHERE user_id = $1"
            ))
            .bind(user.id)
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| Profile::Artisan(row.into())),
        };
        Ok(profile)
    }

    async fn load_account(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> AppResult<Option<Account>> {
        let Some(row) = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        else {
            return Ok(None);
        };

        let user = row.into_credentials()?.user;
        let profile = Self::load_profile(tx, &user).await?;
        Ok(profile.map(|profile| Account { user, profile }))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_account(&self, account: NewAccount) -> AppResult<Account> {
        // Start transaction
        let mut tx = self.db.begin().await?;

        let user_row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, phone_number, role, location)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.phone_number)
        .bind(account.role.as_str())
        .bind(&account.location)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;
        let user = user_row.into_credentials()?.user;

        // Create the role-specific profile in the same transaction
        let profile = match account.role {
            Role::Client => {
                let row = sqlx::query_as::<_, ClientRow>(&format!(
                    r#"
                    INSERT INTO clients (user_id, name, email, phone_number, location)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING {CLIENT_COLUMNS}
                    "#
                ))
                .bind(user.id)
                .bind(&account.username)
                .bind(&account.email)
                .bind(&account.phone_number)
                .bind(&account.location)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_unique_violation)?;
                Profile::Client(row.into())
            }
            Role::Artisan => {
                let row = sqlx::query_as::<_, ArtisanRow>(&format!(
                    r#"
                    INSERT INTO artisans (user_id, name, email, phone_number, location,
                                          specialization, skills, hourly_rate)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING {ARTISAN_COLUMNS}
                    "#
                ))
                .bind(user.id)
                .bind(&account.username)
                .bind(&account.email)
                .bind(&account.phone_number)
                .bind(&account.location)
                .bind(&account.specialization)
                .bind(&account.skills)
                .bind(account.hourly_rate)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_unique_violation)?;
                Profile::Artisan(row.into())
            }
        };

        // Commit transaction
        tx.commit().await?;

        Ok(Account { user, profile })
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .map(UserRow::into_credentials)
        .transpose()
    }

    async fn find_account(&self, user_id: Uuid) -> AppResult<Option<Account>> {
        let mut tx = self.db.begin().await?;
        let account = Self::load_account(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn update_account(&self, user_id: Uuid, update: AccountUpdate) -> AppResult<Account> {
        let mut tx = self.db.begin().await?;

        let role = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE users
            SET username = $2, email = $3, phone_number = $4, location = $5
            WHERE id = $1
            RETURNING role
            "#,
        )
        .bind(user_id)
        .bind(&update.username)
        .bind(&update.email)
        .bind(&update.phone_number)
        .bind(&update.location)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_unique_violation)?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?
        .parse::<Role>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

        // Coordinates belong to the old location string; drop them when it changes
        match role {
            Role::Client => {
                sqlx::query(
                    r#"
                    UPDATE clients
                    SET name = $2, email = $3, phone_number = $4,
                        latitude = CASE WHEN location = $5 THEN latitude END,
                        longitude = CASE WHEN location = $5 THEN longitude END,
                        location = $5
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(&update.username)
                .bind(&update.email)
                .bind(&update.phone_number)
                .bind(&update.location)
                .execute(&mut *tx)
                .await
                .map_err(map_unique_violation)?;
            }
            Role::Artisan => {
                sqlx::query(
                    r#"
                    UPDATE artisans
                    SET name = $2, email = $3, phone_number = $4,
                        latitude = CASE WHEN location = $5 THEN latitude END,
                        longitude = CASE WHEN location = $5 THEN longitude END,
                        location = $5,
                        specialization = COALESCE($6, specialization),
                        skills = COALESCE($7, skills),
                        hourly_rate = COALESCE($8, hourly_rate)
                    WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(&update.username)
                .bind(&update.email)
                .bind(&update.phone_number)
                .bind(&update.location)
                .bind(&update.specialization)
                .bind(&update.skills)
                .bind(update.hourly_rate)
                .execute(&mut *tx)
                .await
                .map_err(map_unique_violation)?;
            }
        }

        let account = Self::load_account(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        tx.commit().await?;
        Ok(account)
    }

    async fn find_client_by_email(&self, email: &str) -> AppResult<Option<ClientProfile>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_client_by_name(&self, name: &str) -> AppResult<Option<ClientProfile>> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_artisan_by_email(&self, email: &str) -> AppResult<Option<ArtisanProfile>> {
        let row = sqlx::query_as::<_, ArtisanRow>(&format!(
            "SELECT {ARTISAN_COLUMNS} FROM artisans WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_artisan_by_name(&self, name: &str) -> AppResult<Option<ArtisanProfile>> {
        let row = sqlx::query_as::<_, ArtisanRow>(&format!(
            "SELECT {ARTISAN_COLUMNS} FROM artisans WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_artisans(&self) -> AppResult<Vec<ArtisanProfile>> {
        let rows = sqlx::query_as::<_, ArtisanRow>(&format!(
            "SELECT {ARTISAN_COLUMNS} FROM artisans ORDER BY name ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn save_coordinates(
        &self,
        role: Role,
        profile_id: Uuid,
        location: &str,
        coordinates: GpsCoordinates,
    ) -> AppResult<bool> {
        let table = match role {
            Role::Client => "clients",
            Role::Artisan => "artisans",
        };

        let result = sqlx::query(&format!(
            "UPDATE {table} SET latitude = $1, longitude = $2 WHERE id = $3 AND location = $4"
        ))
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .bind(profile_id)
        .bind(location)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_booking(&self, booking: NewBooking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (client_id, artisan_id, title, details, status,
                                  request_date, completion_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.client_id)
        .bind(booking.artisan_id)
        .bind(&booking.title)
        .bind(&booking.details)
        .bind(BookingStatus::Pending.as_str())
        .bind(booking.request_date)
        .bind(booking.completion_date)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.db)
        .await?
        .map(Booking::try_from)
        .transpose()
    }

    async fn list_bookings(&self, role: Role, profile_id: Uuid) -> AppResult<Vec<BookingDetails>> {
        let owner_column = match role {
            Role::Client => "b.client_id",
            Role::Artisan => "b.artisan_id",
        };

        let rows = sqlx::query_as::<_, BookingDetailsRow>(&format!(
            r#"
            SELECT b.id, b.client_id, b.artisan_id, b.title, b.details, b.status,
                   b.request_date, b.completion_date, b.created_at,
                   c.name AS client_name, a.name AS artisan_name
            FROM bookings b
            JOIN clients c ON c.id = b.client_id
            JOIN artisans a ON a.id = b.artisan_id
            WHERE {owner_column} = $1
            ORDER BY b.request_date DESC
            "#
        ))
        .bind(profile_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BookingDetails {
                    booking: row.booking.try_into()?,
                    client_name: row.client_name,
                    artisan_name: row.artisan_name,
                })
            })
            .collect()
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        completion_date: Option<DateTime<Utc>>,
    ) -> AppResult<Booking> {
        let updated = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = $3, completion_date = COALESCE($4, completion_date)
            WHERE id = $1 AND status = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(completion_date)
        .fetch_optional(&self.db)
        .await?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                // Either gone or moved on since it was read
                let current = self
                    .find_booking(booking_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;
                Err(AppError::InvalidStateTransition(format!(
                    "Booking is now {}, cannot move it to {}",
                    current.status, status
                )))
            }
        }
    }

    async fn insert_report(&self, report: NewReport) -> AppResult<Report> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO reports (client_id, artisan_id, booking_id, issue)
            VALUES ($1, $2, $3, $4)
            RETURNING id, client_id, artisan_id, booking_id, issue, created_at
            "#,
        )
        .bind(report.client_id)
        .bind(report.artisan_id)
        .bind(report.booking_id)
        .bind(&report.issue)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let account = Self::load_account(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let (profile_table, owner_column) = match account.profile.role() {
            Role::Client => ("clients", "client_id"),
            Role::Artisan => ("artisans", "artisan_id"),
        };
        let profile_id = account.profile.id();

        // Lock the profile so no booking can be attached while we check
        sqlx::query(&format!("SELECT id FROM {profile_table} WHERE id = $1 FOR UPDATE"))
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        let open = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM bookings WHERE {owner_column} = $1 AND status <> $2"
        ))
        .bind(profile_id)
        .bind(BookingStatus::Completed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if open > 0 {
            tx.rollback().await?;
            return Err(active_bookings_conflict(open as usize));
        }

        // Dependents first; the foreign keys cascade too but this keeps the
        // order explicit regardless of schema drift
        sqlx::query(&format!(
            r#"
            DELETE FROM reports
            WHERE {owner_column} = $1
               OR booking_id IN (SELECT id FROM bookings WHERE {owner_column} = $1)
            "#
        ))
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!("DELETE FROM bookings WHERE {owner_column} = $1"))
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(&format!("DELETE FROM {profile_table} WHERE id = $1"))
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
