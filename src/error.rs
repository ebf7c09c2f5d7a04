use thiserror::Error;

/// Errors surfaced to callers of the geo/time client and the registry
#[derive(Error, Debug)]
pub enum GeoError {
    /// The platform exposes no location capability at all
    #[error("Geolocation is not supported on this platform")]
    GeolocationUnsupported,

    /// The platform refused or failed to report a position in time
    #[error("Current location unavailable: {0}")]
    LocationUnavailable(String),

    /// The provider returned no candidate for a text query
    #[error("Cannot find any matching locations for: {0}")]
    NoMatchFound(String),

    /// Transport failure, timeout or non-success reply from the remote API
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Error when environment variable is not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Error when a configuration value cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GeoError {
    /// Whether the user can reasonably retry the action that produced this error.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            GeoError::LocationUnavailable(_) | GeoError::NoMatchFound(_) | GeoError::Upstream(_)
        )
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::Upstream(UpstreamError::Request(err.without_url()))
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Upstream(UpstreamError::Parse(err))
    }
}

/// Causes of a failed remote call
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{endpoint} request timed out after {millis}ms")]
    Timeout { endpoint: &'static str, millis: u64 },

    #[error("{endpoint} request failed with status {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    /// The HTTP call succeeded but the provider reported a non-OK status
    #[error("{endpoint} returned status {status}: {message}")]
    ProviderStatus {
        endpoint: &'static str,
        status: String,
        message: String,
    },

    #[error("{endpoint} returned no results")]
    EmptyResult { endpoint: &'static str },

    #[error("{endpoint} returned an out-of-range position ({latitude}, {longitude})")]
    InvalidPosition {
        endpoint: &'static str,
        latitude: f64,
        longitude: f64,
    },

    /// Wrapper for reqwest errors
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Wrapper for JSON deserialization errors
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),
}
