//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{Account, ArtisanProfile, ClientProfile, Profile};
use crate::services::{auth::RegisterInput, AuthService};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artisan: Option<ArtisanProfile>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(flatten)]
    pub account: Account,
}

/// Register endpoint handler
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let auth_service = AuthService::new(state.store.clone(), state.geocoder.clone(), &state.config);
    let account = auth_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Your account has been created! You are now able to log in".to_string(),
            account,
        }),
    ))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth_service = AuthService::new(state.store.clone(), state.geocoder.clone(), &state.config);
    let outcome = auth_service.login(&body.email, &body.password).await?;

    let (client, artisan) = match outcome.account.profile {
        Profile::Client(client) => (Some(client), None),
        Profile::Artisan(artisan) => (None, Some(artisan)),
    };

    Ok(Json(LoginResponse {
        access_token: outcome.tokens.access_token,
        token_type: outcome.tokens.token_type,
        expires_in: outcome.tokens.expires_in,
        client,
        artisan,
    }))
}
