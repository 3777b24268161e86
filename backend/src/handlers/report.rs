//! Issue report handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Report;
use crate::services::{report::CreateReportInput, ReportService};
use crate::AppState;

#[derive(Serialize)]
pub struct ReportCreatedResponse {
    pub message: String,
    pub report: Report,
}

pub async fn submit_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateReportInput>,
) -> AppResult<(StatusCode, Json<ReportCreatedResponse>)> {
    let service = ReportService::new(state.store.clone(), state.notifications());
    let report = service.create(&user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportCreatedResponse {
            message: "Your report has been submitted".to_string(),
            report,
        }),
    ))
}
