//! External service integrations

pub mod geocoding;
pub mod mailer;

pub use geocoding::{Geocoder, NominatimClient};
pub use mailer::{EmailMessage, LogMailer, Mailer, SmtpMailer};
