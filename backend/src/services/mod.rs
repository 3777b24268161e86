//! Business logic services for the Hirafic marketplace

pub mod auth;
pub mod booking;
pub mod location;
pub mod notification;
pub mod pagination;
pub mod profile;
pub mod proximity;
pub mod report;

pub use auth::AuthService;
pub use booking::BookingService;
pub use location::{Geolocated, LocationService};
pub use notification::NotificationService;
pub use pagination::{present, PageRequest};
pub use profile::ProfileService;
pub use proximity::{find_nearby, NearbyService};
pub use report::ReportService;
