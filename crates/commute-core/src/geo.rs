//! Coordinates and great-circle distance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::lenient_f64;

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(deserialize_with = "lenient_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Distance to another point in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

impl FromStr for GeoPoint {
    type Err = String;

    /// Parse `"lat,lng"` (whitespace around either number is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", s))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| format!("invalid latitude: {:?}", lat.trim()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| format!("invalid longitude: {:?}", lng.trim()))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("coordinates out of range: {}, {}", lat, lng));
        }
        Ok(Self { lat, lng })
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero() {
        let p = GeoPoint::new(24.9537, 121.2256);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Taipei Main Station to Zhongli Station, roughly 33 km apart.
        let taipei = GeoPoint::new(25.0478, 121.5170);
        let zhongli = GeoPoint::new(24.9537, 121.2256);
        let d = haversine_km(taipei, zhongli);
        assert!(d > 30.0 && d < 36.0, "distance was {}", d);
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "distance was {}", d);
    }

    #[test]
    fn test_parse_geo_point() {
        let p: GeoPoint = " 25.0478 , 121.517 ".parse().unwrap();
        assert_eq!(p, GeoPoint::new(25.0478, 121.517));
        assert!("25.0".parse::<GeoPoint>().is_err());
        assert!("95,10".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn test_display_rounds_to_four_places() {
        assert_eq!(GeoPoint::new(25.047812, 121.51701).to_string(), "25.0478, 121.5170");
    }
}
