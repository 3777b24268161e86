//! Booking lifecycle
//!
//! Creation validates the requested completion date before anything else,
//! stores a `Pending` booking and hands the artisan notification off to
//! [`NotificationService`]. Status changes follow
//! [`BookingStatus::can_transition_to`].

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{
    parse_completion_date, Account, Booking, BookingDetails, BookingStatus, Profile,
    COMPLETION_DATE_FORMAT, DEFAULT_BOOKING_TITLE,
};
use crate::services::NotificationService;
use crate::store::{NewBooking, Store};

/// Booking service
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

/// Booking request as submitted; every field is checked by the service
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingInput {
    pub client_email: Option<String>,
    pub artisan_email: Option<String>,
    pub title: Option<String>,
    pub details: Option<String>,
    pub completion_date: Option<String>,
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("{} is required", field)))
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Create a booking for the calling client
    pub async fn create(
        &self,
        caller: &AuthUser,
        input: CreateBookingInput,
    ) -> AppResult<BookingDetails> {
        // Date checks come first so a past date is always reported as such
        let raw_date = required(input.completion_date, "completion_date")?;
        let completion_date = parse_completion_date(&raw_date).map_err(|_| {
            AppError::InvalidInput(format!(
                "Invalid completion_date '{}', expected format {}",
                raw_date, COMPLETION_DATE_FORMAT
            ))
        })?;
        let now = Utc::now();
        if completion_date < now {
            return Err(AppError::ValidationError(
                "Completion date cannot be in the past".to_string(),
            ));
        }

        let client_email = shared::normalize_email(&required(input.client_email, "client_email")?);
        let artisan_email =
            shared::normalize_email(&required(input.artisan_email, "artisan_email")?);
        let details = input
            .details
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_BOOKING_TITLE.to_string());

        let client = self
            .store
            .find_client_by_email(&client_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
        let artisan = self
            .store
            .find_artisan_by_email(&artisan_email)
            .await?
            .ok_or_else(|| AppError::NotFound("Artisan".to_string()))?;

        if client.user_id != caller.user_id {
            return Err(AppError::Forbidden(
                "You can only book on behalf of your own client profile".to_string(),
            ));
        }

        let booking = self
            .store
            .insert_booking(NewBooking {
                client_id: client.id,
                artisan_id: artisan.id,
                title,
                details,
                request_date: now,
                completion_date,
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            client = %client.name,
            artisan = %artisan.name,
            "Booking created"
        );

        // Stored already; delivery happens in the background
        self.notifications.booking_created(&client, &artisan, &booking);

        Ok(BookingDetails {
            booking,
            client_name: client.name,
            artisan_name: artisan.name,
        })
    }

    /// The caller's bookings, newest first. An empty list is `NotFound`.
    pub async fn list(&self, caller: &AuthUser) -> AppResult<Vec<BookingDetails>> {
        let account = self.caller_account(caller).await?;

        let bookings = self
            .store
            .list_bookings(account.profile.role(), account.profile.id())
            .await?;

        if bookings.is_empty() {
            return Err(AppError::NotFound("Bookings".to_string()));
        }
        Ok(bookings)
    }

    /// Move a booking to `status` on behalf of one of its parties
    pub async fn update_status(
        &self,
        caller: &AuthUser,
        booking_id: Uuid,
        status: &str,
    ) -> AppResult<Booking> {
        let next = status
            .trim()
            .parse::<BookingStatus>()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking".to_string()))?;

        let account = self.caller_account(caller).await?;
        let is_party = match &account.profile {
            Profile::Client(client) => booking.client_id == client.id,
            Profile::Artisan(artisan) => booking.artisan_id == artisan.id,
        };
        if !is_party {
            return Err(AppError::Forbidden(
                "You are not a party to this booking".to_string(),
            ));
        }

        if next.requires_artisan() && !matches!(account.profile, Profile::Artisan(_)) {
            return Err(AppError::Forbidden(format!(
                "Only the artisan can mark a booking {}",
                next
            )));
        }

        if !booking.status.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move booking from {} to {}",
                booking.status, next
            )));
        }

        let completion_date = (next == BookingStatus::Completed).then(Utc::now);
        let updated = self
            .store
            .update_booking_status(booking.id, booking.status, next, completion_date)
            .await?;

        tracing::info!(
            booking_id = %updated.id,
            from = %booking.status,
            to = %updated.status,
            "Booking status changed"
        );
        Ok(updated)
    }

    async fn caller_account(&self, caller: &AuthUser) -> AppResult<Account> {
        self.store
            .find_account(caller.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::external::LogMailer;
    use crate::models::Role;
    use crate::store::{MemoryStore, NewAccount};

    fn service(store: Arc<dyn Store>) -> BookingService {
        let notifications = NotificationService::new(Arc::new(LogMailer), "ops@example.com");
        BookingService::new(store, notifications)
    }

    fn new_account(username: &str, role: Role) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            phone_number: "0555000000".to_string(),
            location: "Algiers".to_string(),
            role,
            specialization: "None".to_string(),
            skills: String::new(),
            hourly_rate: None,
        }
    }

    async fn seed(store: &Arc<dyn Store>) -> (AuthUser, AuthUser) {
        let alice = store.create_account(new_account("alice", Role::Client)).await.unwrap();
        let bob = store.create_account(new_account("bob", Role::Artisan)).await.unwrap();
        (AuthUser::from(&alice.user), AuthUser::from(&bob.user))
    }

    fn input(completion_date: String) -> CreateBookingInput {
        CreateBookingInput {
            client_email: Some("alice@example.com".to_string()),
            artisan_email: Some("bob@example.com".to_string()),
            title: None,
            details: Some("Fix the door".to_string()),
            completion_date: Some(completion_date),
        }
    }

    fn format_date(offset: Duration) -> String {
        (Utc::now() + offset).format(COMPLETION_DATE_FORMAT).to_string()
    }

    #[tokio::test]
    async fn test_create_and_transition() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (alice, bob) = seed(&store).await;
        let service = service(store);

        let created = service
            .create(&alice, input(format_date(Duration::days(30))))
            .await
            .unwrap();
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.title, DEFAULT_BOOKING_TITLE);
        assert_eq!(created.artisan_name, "bob");

        // Clients cannot accept their own requests
        let err = service
            .update_status(&alice, created.booking.id, "Accepted")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let accepted = service
            .update_status(&bob, created.booking.id, "Accepted")
            .await
            .unwrap();
        assert_eq!(accepted.status, BookingStatus::Accepted);

        let completed = service
            .update_status(&alice, created.booking.id, "Completed")
            .await
            .unwrap();
        assert_eq!(completed.status, BookingStatus::Completed);
        assert!(completed.completion_date.unwrap() <= Utc::now());

        let err = service
            .update_status(&bob, created.booking.id, "Rejected")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[tokio::test]
    async fn test_date_checks_come_first() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (alice, _) = seed(&store).await;
        let service = service(store);

        let mut past = input(format_date(-Duration::days(1)));
        past.artisan_email = Some("nobody@example.com".to_string());
        let err = service.create(&alice, past).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .create(&alice, input("next tuesday".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cannot_book_for_someone_else() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (_, bob) = seed(&store).await;
        let service = service(store);

        let err = service
            .create(&bob, input(format_date(Duration::days(3))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_details_are_optional() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (alice, _) = seed(&store).await;
        let service = service(store);

        let mut request = input(format_date(Duration::days(2)));
        request.details = None;
        let created = service.create(&alice, request).await.unwrap();
        assert_eq!(created.booking.details, "");
        assert_eq!(created.booking.status, BookingStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_status_changes_apply_once() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (alice, bob) = seed(&store).await;
        let service = service(store.clone());

        let created = service
            .create(&alice, input(format_date(Duration::days(5))))
            .await
            .unwrap();
        let id = created.booking.id;

        let (complete, reject) = tokio::join!(
            service.update_status(&alice, id, "Completed"),
            service.update_status(&bob, id, "Rejected"),
        );

        // Both start from Pending, but Completed and Rejected are terminal
        assert!(complete.is_ok() != reject.is_ok());
        let (winner, loser) = if complete.is_ok() {
            (BookingStatus::Completed, reject)
        } else {
            (BookingStatus::Rejected, complete)
        };
        assert!(matches!(loser, Err(AppError::InvalidStateTransition(_))));

        let stored = store.find_booking(id).await.unwrap().unwrap();
        assert_eq!(stored.status, winner);
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_found() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let (alice, _) = seed(&store).await;
        let service = service(store);

        assert!(matches!(
            service.list(&alice).await,
            Err(AppError::NotFound(_))
        ));
    }
}
