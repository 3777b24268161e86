//! Authentication service for registration, login, tokens and account removal

use std::borrow::Cow;
use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::Geocoder;
use crate::middleware::AuthUser;
use crate::models::{Account, Role, DEFAULT_SPECIALIZATION};
use crate::services::LocationService;
use crate::store::{NewAccount, Store};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    locations: LocationService,
    jwt_secret: String,
    access_token_expiry: i64,
    password_hash_cost: u32,
}

fn field_error(code: &'static str, result: Result<(), &'static str>) -> Result<(), ValidationError> {
    result.map_err(|message| {
        let mut error = ValidationError::new(code);
        error.message = Some(Cow::Borrowed(message));
        error
    })
}

fn check_username(username: &str) -> Result<(), ValidationError> {
    field_error("username", shared::validate_username(username))
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    field_error("email", shared::validate_email(email))
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    field_error("password", shared::validate_password(password))
}

fn check_phone_number(phone: &str) -> Result<(), ValidationError> {
    field_error("phone_number", shared::validate_phone_number(phone))
}

fn check_location(location: &str) -> Result<(), ValidationError> {
    field_error("location", shared::validate_location(location))
}

fn check_hourly_rate(rate: &Decimal) -> Result<(), ValidationError> {
    field_error("hourly_rate", shared::validate_hourly_rate(*rate))
}

/// Registration form. Missing fields arrive empty and fail validation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterInput {
    #[validate(custom = "check_username")]
    pub username: String,
    #[validate(custom = "check_email")]
    pub email: String,
    #[validate(custom = "check_password")]
    pub password: String,
    pub confirm_password: String,
    #[validate(custom = "check_phone_number")]
    pub phone_number: String,
    #[validate(custom = "check_location")]
    pub location: String,
    pub role: String,
    pub specialization: Option<String>,
    pub skills: Option<String>,
    #[validate(custom = "check_hourly_rate")]
    pub hourly_rate: Option<Decimal>,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Access token handed out at login
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Result of a successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub tokens: AuthTokens,
    pub account: Account,
}

/// Check a bearer token and return its claims
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>, config: &Config) -> Self {
        Self {
            locations: LocationService::new(store.clone(), geocoder),
            store,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            password_hash_cost: config.auth.password_hash_cost,
        }
    }

    /// Create a user with its client or artisan profile, then geocode the
    /// new profile's location
    pub async fn register(&self, input: RegisterInput) -> AppResult<Account> {
        input.validate()?;

        if input.password != input.confirm_password {
            return Err(AppError::field("confirm_password", "Passwords must match"));
        }
        let role = input
            .role
            .trim()
            .parse::<Role>()
            .map_err(|_| AppError::field("role", "Role must be Artisan or Client"))?;

        // bcrypt is CPU-bound; keep it off the async workers
        let password = input.password;
        let cost = self.password_hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let (specialization, skills, hourly_rate) = match role {
            Role::Artisan => (
                input
                    .specialization
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_SPECIALIZATION.to_string()),
                input.skills.unwrap_or_default().trim().to_string(),
                input.hourly_rate,
            ),
            Role::Client => (DEFAULT_SPECIALIZATION.to_string(), String::new(), None),
        };

        let mut account = self
            .store
            .create_account(NewAccount {
                username: input.username.trim().to_string(),
                email: shared::normalize_email(&input.email),
                password_hash,
                phone_number: input.phone_number.trim().to_string(),
                location: input.location.trim().to_string(),
                role,
                specialization,
                skills,
                hourly_rate,
            })
            .await?;

        tracing::info!(user_id = %account.user.id, role = %role, "User registered");

        self.locations.refresh_after_write(&mut account.profile).await;
        Ok(account)
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let credentials = self
            .store
            .find_credentials_by_email(&shared::normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_string();
        let password_hash = credentials.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify(password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let account = self
            .store
            .find_account(credentials.user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        let tokens = self.generate_token(&account)?;
        tracing::info!(user_id = %account.user.id, "User logged in");

        Ok(LoginOutcome { tokens, account })
    }

    /// Delete the caller's user, profile and bookings. Refused while any
    /// booking is still open.
    pub async fn delete_account(&self, caller: &AuthUser) -> AppResult<()> {
        self.store.delete_account(caller.user_id).await?;
        tracing::info!(user_id = %caller.user_id, "Account deleted");
        Ok(())
    }

    fn generate_token(&self, account: &Account) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.user.id.to_string(),
            username: account.user.username.clone(),
            role: account.user.role,
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}

impl Claims {
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))
    }
}
