//! Coordinate helpers: great-circle distance and the cache fingerprint.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Four decimal places of a degree, roughly 11 m at UK latitudes.
const FINGERPRINT_SCALE: f64 = 10_000.0;

/// Haversine distance in metres between two WGS84 points.
#[must_use]
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Cache address for a location query.
///
/// Latitude and longitude are quantized to four decimal places before being
/// combined with the radius, so every query that rounds to the same point
/// resolves to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn for_query(lat: f64, lng: f64, radius_m: u32) -> Self {
        Self(format!("{},{},{radius_m}", quantize(lat), quantize(lng)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

fn quantize(value: f64) -> f64 {
    // Adding 0.0 folds -0.0 into 0.0 so both print the same way.
    (value * FINGERPRINT_SCALE).round() / FINGERPRINT_SCALE + 0.0
}
