//! Distance, bounding-box, and travel-time calculations over
//! latitude/longitude pairs.

use serde::{Deserialize, Serialize};

/// WGS84 equatorial radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Walking speed used when the caller has no better estimate (80 m/min).
pub const WALKING_SPEED_METERS_PER_MINUTE: f64 = 80.0;

/// Meters per degree of latitude on the flat-earth approximation.
const METERS_PER_DEGREE: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS_METERS / 360.0;

/// Errors produced when constructing a [`GeoLocation`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A WGS84-like coordinate in degrees.
///
/// Equality is exact floating-point equality. Use provider ids, not
/// geometry, to detect duplicate places. An absent location is modelled
/// as `Option<GeoLocation>`, so `(0, 0)` is an ordinary coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    /// Build a location, rejecting out-of-range or non-finite components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoLocation) -> f64 {
        distance_meters(self, other)
    }
}

/// Great-circle distance in meters via the spherical law of cosines.
///
/// The cosine is clamped into `[-1, 1]` first; rounding can push it just
/// past 1 for identical points, and `acos` would return NaN.
pub fn distance_meters(a: &GeoLocation, b: &GeoLocation) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let cos_angle = lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * delta_lng.cos();
    EARTH_RADIUS_METERS * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Whole minutes needed to travel from `a` to `b` at `speed_meters_per_minute`.
///
/// Rounds down. Returns 0 when the distance or the speed is not positive.
pub fn travel_time_minutes(a: &GeoLocation, b: &GeoLocation, speed_meters_per_minute: f64) -> u32 {
    let distance = distance_meters(a, b);
    if distance <= 0.0 || speed_meters_per_minute <= 0.0 || !speed_meters_per_minute.is_finite() {
        return 0;
    }
    (distance / speed_meters_per_minute).floor() as u32
}

/// An axis-aligned latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub min: GeoLocation,
    pub max: GeoLocation,
}

impl BoundingRect {
    /// Whether `location` lies inside the box, edges included.
    pub fn contains(&self, location: &GeoLocation) -> bool {
        (self.min.latitude..=self.max.latitude).contains(&location.latitude)
            && (self.min.longitude..=self.max.longitude).contains(&location.longitude)
    }
}

/// Approximate square of half-width `radius_meters` around `center`.
///
/// Flat-earth approximation for coarse range queries only; filter the
/// survivors with [`distance_meters`] afterwards. Results are clamped into
/// valid coordinate ranges.
pub fn bounding_rectangle(center: &GeoLocation, radius_meters: f64) -> BoundingRect {
    let radius = radius_meters.max(0.0);
    let delta_lat = radius / METERS_PER_DEGREE;
    let cos_lat = center.latitude.to_radians().cos();
    let delta_lng = if cos_lat.abs() < f64::EPSILON {
        180.0
    } else {
        radius / (METERS_PER_DEGREE * cos_lat)
    };

    BoundingRect {
        min: GeoLocation {
            latitude: (center.latitude - delta_lat).max(-90.0),
            longitude: (center.longitude - delta_lng).max(-180.0),
        },
        max: GeoLocation {
            latitude: (center.latitude + delta_lat).min(90.0),
            longitude: (center.longitude + delta_lng).min(180.0),
        },
    }
}
