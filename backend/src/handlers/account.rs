//! Account removal

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AuthService;
use crate::AppState;

/// Delete the caller's account once all of its bookings are completed
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let auth_service = AuthService::new(state.store.clone(), state.geocoder.clone(), &state.config);
    auth_service.delete_account(&user).await?;

    Ok(Json(json!({ "message": "Account deleted successfully" })))
}
