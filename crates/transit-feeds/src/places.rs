//! Place search for free-text destinations.

use async_trait::async_trait;
use commute_core::serde_helpers::{lenient_f64_opt, lenient_string};
use commute_core::GeoPoint;
use serde::Deserialize;

use crate::error::FeedError;

/// A geocoded place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceHit {
    pub display_name: String,
    pub coords: GeoPoint,
}

/// One entry of a Nominatim-style search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub display_name: String,
    #[serde(deserialize_with = "lenient_f64_opt")]
    pub lat: Option<f64>,
    #[serde(deserialize_with = "lenient_f64_opt")]
    pub lon: Option<f64>,
}

impl PlaceRecord {
    pub fn into_hit(self) -> Option<PlaceHit> {
        Some(PlaceHit {
            coords: GeoPoint::new(self.lat?, self.lon?),
            display_name: self.display_name,
        })
    }
}

/// Free-text geocoding.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Candidate places, best match first. Empty when nothing matched.
    async fn search_places(&self, query: &str) -> Result<Vec<PlaceHit>, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_records_accept_string_coordinates() {
        let records: Vec<PlaceRecord> = serde_json::from_str(
            r#"[{"display_name":"Taipei 101","lat":"25.0339","lon":"121.5645","importance":0.7},
                {"display_name":"nowhere"}]"#,
        )
        .unwrap();

        let hits: Vec<PlaceHit> = records.into_iter().filter_map(PlaceRecord::into_hit).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display_name, "Taipei 101");
        assert_eq!(hits[0].coords, GeoPoint::new(25.0339, 121.5645));
    }
}
