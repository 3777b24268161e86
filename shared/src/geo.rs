//! Great-circle distance between coordinates

use crate::types::GpsCoordinates;

/// Mean Earth radius in kilometres (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance in kilometres using the haversine formula.
pub fn great_circle_km(from: GpsCoordinates, to: GpsCoordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // clamp guards against a > 1.0 from rounding on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
