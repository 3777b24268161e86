//! Email notifications for bookings and issue reports
//!
//! Messages are sent from a spawned task once the triggering write has
//! committed. Delivery failures are logged and dropped; nothing is retried.

use std::sync::Arc;

use crate::external::{EmailMessage, Mailer};
use crate::models::{ArtisanProfile, Booking, ClientProfile, Report};

/// Timestamp layout used in message bodies
const BODY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders and dispatches notification emails
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    operations_mailbox: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, operations_mailbox: impl Into<String>) -> Self {
        Self {
            mailer,
            operations_mailbox: operations_mailbox.into(),
        }
    }

    /// Tell the artisan about a new booking
    pub fn booking_created(&self, client: &ClientProfile, artisan: &ArtisanProfile, booking: &Booking) {
        self.dispatch(booking_email(client, artisan, booking));
    }

    /// Forward an issue report to the operations mailbox
    pub fn issue_reported(&self, client: &ClientProfile, artisan: &ArtisanProfile, report: &Report) {
        self.dispatch(report_email(
            &self.operations_mailbox,
            client,
            artisan,
            report,
        ));
    }

    fn dispatch(&self, message: EmailMessage) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            let to = message.to.clone();
            let subject = message.subject.clone();
            match mailer.send(message).await {
                Ok(()) => tracing::info!(%to, %subject, "Notification sent"),
                Err(e) => tracing::warn!(%to, %subject, error = %e, "Notification not delivered"),
            }
        });
    }
}

/// New-booking message for the artisan
pub fn booking_email(client: &ClientProfile, artisan: &ArtisanProfile, booking: &Booking) -> EmailMessage {
    let completion = booking
        .completion_date
        .map(|date| date.format(BODY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "not set".to_string());

    let body = format!(
        "Hello {artisan},\n\
         \n\
         You have received a new booking from {client}.\n\
         You can contact the client at {phone},\n\
         or at this email address {email}.\n\
         \n\
         Booking: {title}\n\
         {details}\n\
         \n\
         Requested Date:\n    {requested}\n\
         \n\
         Expected Completion Date:\n    {completion}\n\
         \n\
         Please view the booking details in your dashboard.\n\
         \n\
         Best regards,\n\
         Your HIRAFIC Booking Team\n",
        artisan = artisan.name,
        client = client.name,
        phone = client.phone_number,
        email = client.email,
        title = booking.title,
        details = booking.details,
        requested = booking.request_date.format(BODY_DATE_FORMAT),
        completion = completion,
    );

    EmailMessage {
        to: artisan.email.clone(),
        subject: format!("HIRAFIC: New Booking from {}", client.name),
        body,
    }
}

/// Issue-report message for the operations team
pub fn report_email(
    operations_mailbox: &str,
    client: &ClientProfile,
    artisan: &ArtisanProfile,
    report: &Report,
) -> EmailMessage {
    let body = format!(
        "A new issue has been reported.\n\
         \n\
         Client: {client}\n\
         Artisan: {artisan}\n\
         Booking ID: {booking}\n\
         \n\
         Issue:\n\
         {issue}\n",
        client = client.name,
        artisan = artisan.name,
        booking = report.booking_id,
        issue = report.issue,
    );

    EmailMessage {
        to: operations_mailbox.to_string(),
        subject: format!("HIRAFIC: Issue reported by {}", client.name),
        body,
    }
}
