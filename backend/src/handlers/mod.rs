//! HTTP request handlers

pub mod account;
pub mod artisan;
pub mod auth;
pub mod booking;
pub mod client;
pub mod health;
pub mod report;

pub use account::delete_account;
pub use artisan::{get_artisan, get_location, list_artisans, update_artisan};
pub use auth::{login, register};
pub use booking::{book_artisan, list_bookings, update_booking_status};
pub use client::{get_client, nearby_artisans, search_nearby_artisans, update_client};
pub use health::health_check;
pub use report::submit_report;
