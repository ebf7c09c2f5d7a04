use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GeoError;
use crate::geo_service::{Endpoint, GeoService, to_coordinate};
use crate::geolocation::{GeolocationProvider, PositionError};
use crate::types::{Coordinate, PlaceId, ResolvedPlace, TimeData};

/// Source of "now" used when asking for time zone offsets
pub type Clock = fn() -> DateTime<Utc>;

/// Anything that can compute the local wall-clock time at a coordinate.
#[async_trait]
pub trait LocalTimeResolver: Send + Sync {
    async fn resolve_local_time(&self, position: Coordinate) -> Result<TimeData, GeoError>;
}

/// Composes the remote lookups into the operations the UI calls.
///
/// Each operation either returns a fully populated value or fails as a whole;
/// there is no retry and nothing is cached.
#[derive(Clone)]
pub struct GeoTimeClient {
    service: GeoService,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    location_timeout: Duration,
    clock: Clock,
}

impl GeoTimeClient {
    pub fn new(config: &Config) -> Self {
        Self {
            service: GeoService::new(config),
            geolocation: None,
            location_timeout: config.location_timeout,
            clock: Utc::now,
        }
    }

    /// Attaches the platform location capability. Without one,
    /// [`resolve_current_location`](Self::resolve_current_location) fails with
    /// `GeolocationUnsupported`.
    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Finds the device position and reverse geocodes it.
    pub async fn resolve_current_location(&self) -> Result<ResolvedPlace, GeoError> {
        let provider = self
            .geolocation
            .as_ref()
            .ok_or(GeoError::GeolocationUnsupported)?;

        info!("Acquiring current position");
        let position = match tokio::time::timeout(self.location_timeout, provider.current_position())
            .await
        {
            Ok(Ok(position)) => position,
            Ok(Err(PositionError::PermissionDenied)) => {
                warn!("Location permission denied");
                return Err(GeoError::LocationUnavailable(
                    PositionError::PermissionDenied.to_string(),
                ));
            }
            Ok(Err(e)) => {
                warn!("Failed to acquire position: {}", e);
                return Err(GeoError::LocationUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!("Position not reported within {:?}", self.location_timeout);
                return Err(GeoError::LocationUnavailable(format!(
                    "no position within {}ms",
                    self.location_timeout.as_millis()
                )));
            }
        };
        debug!("Current position: {}", position);

        self.service.reverse_geocode(position).await
    }

    /// Takes the provider's top autocomplete suggestion for `query` and
    /// fetches its details.
    pub async fn resolve_first_match(&self, query: &str) -> Result<ResolvedPlace, GeoError> {
        let predictions = self.service.autocomplete(query).await?;
        let first = predictions
            .into_iter()
            .next()
            .ok_or_else(|| GeoError::NoMatchFound(query.to_string()))?;
        debug!("Top suggestion for {:?}: {}", query, first.description);

        let place_id = PlaceId::from(first.place_id);
        let details = self.service.place_details(&place_id).await?;

        Ok(ResolvedPlace {
            place_id,
            address: details.formatted_address,
            position: to_coordinate(Endpoint::PlaceDetails, details.geometry.location)?,
        })
    }

    /// Forward geocodes free-form address text.
    pub async fn resolve_address(&self, address: &str) -> Result<ResolvedPlace, GeoError> {
        self.service.geocode_address(address).await
    }
}

#[async_trait]
impl LocalTimeResolver for GeoTimeClient {
    /// Local time = captured instant + DST offset + raw offset, in seconds.
    async fn resolve_local_time(&self, position: Coordinate) -> Result<TimeData, GeoError> {
        let timestamp = (self.clock)().timestamp();

        let zone = self
            .service
            .time_zone(position, timestamp)
            .await
            .inspect_err(|e| debug!("Failed to resolve local time at {}: {}", position, e))?;

        Ok(TimeData {
            time_zone_id: zone.time_zone_id,
            time_zone_name: zone.time_zone_name,
            local_timestamp: timestamp + zone.dst_offset + zone.raw_offset,
        })
    }
}
