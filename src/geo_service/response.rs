/// Latitude/longitude pair as returned by the Google Maps APIs
#[derive(serde::Deserialize, Debug, Clone, Copy)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Geometry {
    pub location: LatLng,
}

/// Response structure for the geocode endpoint (both forward and reverse)
#[derive(serde::Deserialize, Debug)]
pub struct GeocodeResponse {
    /// Matches ordered by the provider, best first
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct GeocodeResult {
    pub place_id: String,
    pub formatted_address: String,
    pub geometry: Geometry,
}

/// Response structure for the place autocomplete endpoint
#[derive(serde::Deserialize, Debug)]
pub struct AutocompleteResponse {
    /// Suggestions ordered by provider relevance
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Prediction {
    pub place_id: String,
    /// Human readable suggestion text, e.g. "Paris, France"
    #[serde(default)]
    pub description: String,
}

/// Response structure for the place details endpoint
#[derive(serde::Deserialize, Debug)]
pub struct PlaceDetailsResponse {
    pub result: Option<PlaceDetails>,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct PlaceDetails {
    pub place_id: Option<String>,
    pub formatted_address: String,
    pub geometry: Geometry,
}

/// Response structure for the time zone endpoint
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneResponse {
    /// Daylight saving offset in seconds (0 outside DST)
    pub dst_offset: i64,
    /// Offset from UTC in seconds, ignoring DST
    pub raw_offset: i64,
    pub time_zone_id: String,
    pub time_zone_name: String,
}
