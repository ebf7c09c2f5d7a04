use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A point on the globe, always within the valid latitude/longitude range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `"lat,lng"`, the form the provider expects in query parameters
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Opaque place identifier issued by the mapping provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(String);

impl PlaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlaceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A place returned by a lookup, before its local time is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub place_id: PlaceId,
    pub address: String,
    pub position: Coordinate,
}

/// Time zone information and the local wall-clock time at a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeData {
    /// CLDR time zone id, e.g. "America/Los_Angeles"
    pub time_zone_id: String,
    /// Long form name, e.g. "Pacific Daylight Time"
    pub time_zone_name: String,
    /// Seconds since the epoch, already shifted by the zone's raw and DST offsets.
    /// This is local wall-clock time, not UTC.
    pub local_timestamp: i64,
}

/// A fully resolved location held by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub place_id: PlaceId,
    pub address: String,
    pub position: Coordinate,
    pub time_data: TimeData,
}

impl LocationRecord {
    pub fn new(place: ResolvedPlace, time_data: TimeData) -> Self {
        Self {
            place_id: place.place_id,
            address: place.address,
            position: place.position,
            time_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_coordinate_query_value() {
        let c = Coordinate::new(47.6062, -122.3321).unwrap();
        assert_eq!(c.to_query_value(), "47.6062,-122.3321");
    }

    #[test]
    fn test_coordinate_deserialize_validates() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude": 10.0, "longitude": 20.0}"#).unwrap();
        assert_eq!(ok.latitude(), 10.0);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 100.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_place_id_is_transparent() {
        let id = PlaceId::from("ChIJ123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ChIJ123\"");
        assert_eq!(id.to_string(), "ChIJ123");
    }
}
