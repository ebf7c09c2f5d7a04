use std::env;
use std::time::Duration;

use crate::error::GeoError;
use crate::types::Coordinate;

/// Base URL of the Google Maps web service APIs
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
/// Default time before a single API request is abandoned
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(3000);
/// Default bounded wait for the platform to report a position
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_millis(10_000);

const API_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";
const BASE_URL_VAR: &str = "GEOTIME_BASE_URL";
const TIMEOUT_VAR: &str = "GEOTIME_TIMEOUT_MS";
const LOCATION_TIMEOUT_VAR: &str = "GEOTIME_LOCATION_TIMEOUT_MS";
const DEVICE_POSITION_VAR: &str = "GEOTIME_DEVICE_POSITION";

/// Runtime settings for the geo/time client
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub location_timeout: Duration,
    /// Position reported by the stand-in platform location capability, if any
    pub device_position: Option<Coordinate>,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
            device_position: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    /// Loads the configuration from the process environment.
    ///
    /// `GOOGLE_MAPS_API_KEY` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, GeoError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GeoError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GeoError::EnvVarNotSet(API_KEY_VAR.to_string()))?;

        let mut config = Config::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            config = config.with_base_url(base_url);
        }
        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.request_timeout = parse_millis(TIMEOUT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(LOCATION_TIMEOUT_VAR) {
            config.location_timeout = parse_millis(LOCATION_TIMEOUT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(DEVICE_POSITION_VAR) {
            config.device_position = Some(parse_position(&raw)?);
        }

        Ok(config)
    }
}

fn parse_millis(name: &str, raw: &str) -> Result<Duration, GeoError> {
    match raw.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(GeoError::InvalidConfig(format!(
            "{} must be a positive number of milliseconds, got {:?}",
            name, raw
        ))),
    }
}

fn parse_position(raw: &str) -> Result<Coordinate, GeoError> {
    let invalid = || {
        GeoError::InvalidConfig(format!(
            "{} must look like \"lat,lng\", got {:?}",
            DEVICE_POSITION_VAR, raw
        ))
    };

    let (lat, lng) = raw.split_once(',').ok_or_else(invalid)?;
    let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let longitude: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Coordinate::new(latitude, longitude)
}
