//! Issue reports filed by clients against a booking

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::Report;
use crate::services::NotificationService;
use crate::store::{NewReport, Store};

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateReportInput {
    pub client_name: Option<String>,
    pub artisan_name: Option<String>,
    pub issue: Option<String>,
    pub booking_id: Option<Uuid>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Record an issue and forward it to the operations mailbox
    pub async fn create(&self, caller: &AuthUser, input: CreateReportInput) -> AppResult<Report> {
        let issue = input
            .issue
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .ok_or_else(|| AppError::InvalidInput("issue is required".to_string()))?;
        let client_name = input
            .client_name
            .ok_or_else(|| AppError::InvalidInput("client_name is required".to_string()))?;
        let artisan_name = input
            .artisan_name
            .ok_or_else(|| AppError::InvalidInput("artisan_name is required".to_string()))?;
        let booking_id = input
            .booking_id
            .ok_or_else(|| AppError::InvalidInput("booking_id is required".to_string()))?;

        let client = self
            .store
            .find_client_by_name(client_name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
        if client.user_id != caller.user_id {
            return Err(AppError::Forbidden(
                "You can only report issues on your own bookings".to_string(),
            ));
        }

        let artisan = self
            .store
            .find_artisan_by_name(artisan_name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Artisan".to_string()))?;
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        if booking.client_id != client.id || booking.artisan_id != artisan.id {
            return Err(AppError::InvalidInput(
                "Booking does not belong to this client and artisan".to_string(),
            ));
        }

        let report = self
            .store
            .insert_report(NewReport {
                client_id: client.id,
                artisan_id: artisan.id,
                booking_id: booking.id,
                issue,
            })
            .await?;

        tracing::info!(report_id = %report.id, booking_id = %booking.id, "Issue reported");
        self.notifications.issue_reported(&client, &artisan, &report);

        Ok(report)
    }
}
