//! Validation utilities for the Hirafic marketplace

use rust_decimal::Decimal;

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check). Used for registration and profile
/// edits alike.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email format");
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err("Invalid email format"),
    }
}

/// Normalise an email for storage and lookup (emails are case-insensitive)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate username (2-20 characters, no whitespace)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if len < 2 {
        return Err("Username must be at least 2 characters");
    }
    if len > 20 {
        return Err("Username must be at most 20 characters");
    }
    if username.chars().any(char::is_whitespace) {
        return Err("Username cannot contain spaces");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate phone number
/// Accepts: 0612345678, 06-12-34-56-78, +212 612345678
pub fn validate_phone_number(phone: &str) -> Result<(), &'static str> {
    let phone = phone.trim();
    if phone.len() > 20 {
        return Err("Phone number is too long");
    }
    if !phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0))
    {
        return Err("Phone number may only contain digits, spaces, dashes and a leading +");
    }

    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must contain 7 to 15 digits");
    }
    Ok(())
}

/// Validate a free-text location (2-100 characters)
pub fn validate_location(location: &str) -> Result<(), &'static str> {
    let len = location.trim().chars().count();
    if len == 0 {
        return Err("Location is required");
    }
    if len < 2 {
        return Err("Location must be at least 2 characters");
    }
    if len > 100 {
        return Err("Location must not exceed 100 characters");
    }
    Ok(())
}

// ============================================================================
// Marketplace Validations
// ============================================================================

/// Validate an artisan hourly rate
pub fn validate_hourly_rate(rate: Decimal) -> Result<(), &'static str> {
    if rate < Decimal::ZERO {
        return Err("Hourly rate cannot be negative");
    }
    Ok(())
}

/// Validate a search radius in kilometres
pub fn validate_radius_km(radius_km: f64) -> Result<(), &'static str> {
    if !radius_km.is_finite() {
        return Err("Distance must be a finite number");
    }
    if radius_km < 0.0 {
        return Err("Distance cannot be negative");
    }
    Ok(())
}

/// Validate coordinates are on the globe
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), &'static str> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}
