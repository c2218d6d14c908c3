//! Great-circle distance math for itinerary coordinates.

use crate::models::Coordinate;
use thiserror::Error;

/// Mean Earth radius used by every distance in this crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Coordinate precondition failures.
///
/// Hitting one of these means the itinerary source broke its data contract,
/// so callers should reject the input instead of recovering.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("coordinate component is not finite (lat {lat}, lng {lng})")]
    NotFinite { lat: f64, lng: f64 },

    #[error("latitude {0} outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// Check that a latitude/longitude pair is usable.
pub fn validate_coordinate(lat: f64, lng: f64) -> Result<(), GeoError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(GeoError::NotFinite { lat, lng });
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::InvalidLatitude(lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeoError::InvalidLongitude(lng));
    }
    Ok(())
}

/// Calculate distance between two points in kilometers (Haversine formula).
///
/// # Arguments
/// * `a`, `b` - Points in decimal degrees
///
/// # Returns
/// Distance in kilometers
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Same as [`haversine_km`] but re-checks both endpoints first.
///
/// Use this on values that did not come through [`Coordinate::new`].
pub fn checked_distance_km(a: Coordinate, b: Coordinate) -> Result<f64, GeoError> {
    validate_coordinate(a.lat, a.lng)?;
    validate_coordinate(b.lat, b.lng)?;
    Ok(haversine_km(a, b))
}

/// Cumulative length of a polyline in kilometers. Zero for fewer than two points.
pub fn path_distance_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn south_west(&self) -> Coordinate {
        Coordinate {
            lat: self.min_lat,
            lng: self.min_lng,
        }
    }

    pub fn north_east(&self) -> Coordinate {
        Coordinate {
            lat: self.max_lat,
            lng: self.max_lng,
        }
    }
}

/// Bounding box of a set of points, `None` when empty.
pub fn bounds(points: &[Coordinate]) -> Option<Bounds> {
    let first = points.first()?;
    let mut bounds = Bounds {
        min_lat: first.lat,
        min_lng: first.lng,
        max_lat: first.lat,
        max_lng: first.lng,
    };
    for point in &points[1..] {
        bounds.min_lat = bounds.min_lat.min(point.lat);
        bounds.min_lng = bounds.min_lng.min(point.lng);
        bounds.max_lat = bounds.max_lat.max(point.lat);
        bounds.max_lng = bounds.max_lng.max(point.lng);
    }
    Some(bounds)
}
