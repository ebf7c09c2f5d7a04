// Response data structures for the Google Maps web service APIs
pub mod response;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{GeoError, UpstreamError};
use crate::types::{Coordinate, PlaceId, ResolvedPlace};

use response::{
    AutocompleteResponse, GeocodeResponse, GeocodeResult, LatLng, PlaceDetails,
    PlaceDetailsResponse, Prediction, TimeZoneResponse,
};

/// Remote endpoints reachable through [`GeoService::invoke`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Geocode,
    Autocomplete,
    PlaceDetails,
    TimeZone,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Geocode => "geocode",
            Endpoint::Autocomplete => "autocomplete",
            Endpoint::PlaceDetails => "place details",
            Endpoint::TimeZone => "timezone",
        }
    }

    /// Path relative to the service base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Geocode => "geocode/json",
            Endpoint::Autocomplete => "place/autocomplete/json",
            Endpoint::PlaceDetails => "place/details/json",
            Endpoint::TimeZone => "timezone/json",
        }
    }
}

/// Thin client over the geocoding, places and time zone APIs.
///
/// All outbound traffic goes through [`GeoService::invoke`], which appends the
/// API key and enforces the timeout.
#[derive(Debug, Clone)]
pub struct GeoService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeoService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        }
    }

    /// Copy of this service whose typed calls use `timeout` instead.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs one GET against `endpoint` and returns the JSON body.
    ///
    /// # Arguments
    /// * `endpoint` - Which API to call
    /// * `params` - Query parameters, without the API key
    /// * `timeout` - Time budget covering the request and reading the body
    ///
    /// # Returns
    /// * The decoded body when the HTTP status is 2xx and the provider status is
    ///   `OK` or `ZERO_RESULTS`
    /// * `GeoError::Upstream` otherwise; a timed-out request is dropped, never resumed
    pub async fn invoke(
        &self,
        endpoint: Endpoint,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, GeoError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        debug!("Calling {} endpoint with {} parameters", endpoint.name(), params.len());

        let mut query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("key", self.api_key.as_str()));

        let call = async {
            // The request URL carries the API key, so it is stripped from every error
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;

            let status = response.status();
            if !status.is_success() {
                error!("Failed to fetch {} data: {}", endpoint.name(), status);
                return Err(GeoError::from(UpstreamError::Status {
                    endpoint: endpoint.name(),
                    status,
                }));
            }

            let bytes = response.bytes().await.map_err(reqwest::Error::without_url)?;
            let body: Value = serde_json::from_slice(&bytes)?;
            Ok::<_, GeoError>(body)
        };

        let body = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                error!("{} request timed out after {:?}", endpoint.name(), timeout);
                return Err(UpstreamError::Timeout {
                    endpoint: endpoint.name(),
                    millis: timeout.as_millis() as u64,
                }
                .into());
            }
        };

        check_provider_status(endpoint, &body)?;
        Ok(body)
    }

    /// Converts a coordinate into the closest address known to the provider.
    pub async fn reverse_geocode(&self, position: Coordinate) -> Result<ResolvedPlace, GeoError> {
        info!("Reverse geocoding position: {}", position);

        let body = self
            .invoke(
                Endpoint::Geocode,
                &[("latlng", position.to_query_value())],
                self.timeout,
            )
            .await?;
        let response: GeocodeResponse = serde_json::from_value(body)?;

        let first = first_result(response).ok_or(UpstreamError::EmptyResult {
            endpoint: Endpoint::Geocode.name(),
        })?;
        let place = into_resolved_place(Endpoint::Geocode, first)?;
        debug!("Reverse geocoded to {:?}", place);
        Ok(place)
    }

    /// Looks up an address and returns the provider's best match.
    pub async fn geocode_address(&self, address: &str) -> Result<ResolvedPlace, GeoError> {
        info!("Geocoding address: {}", address);

        let body = self
            .invoke(
                Endpoint::Geocode,
                &[("address", address.to_string())],
                self.timeout,
            )
            .await?;
        let response: GeocodeResponse = serde_json::from_value(body)?;

        let first =
            first_result(response).ok_or_else(|| GeoError::NoMatchFound(address.to_string()))?;
        into_resolved_place(Endpoint::Geocode, first)
    }

    /// Returns autocomplete suggestions for `input` in provider order.
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<Prediction>, GeoError> {
        info!("Fetching autocomplete suggestions for: {}", input);

        let body = self
            .invoke(
                Endpoint::Autocomplete,
                &[("input", input.to_string())],
                self.timeout,
            )
            .await?;
        let response: AutocompleteResponse = serde_json::from_value(body)?;

        debug!("Received {} predictions", response.predictions.len());
        Ok(response.predictions)
    }

    pub async fn place_details(&self, place_id: &PlaceId) -> Result<PlaceDetails, GeoError> {
        info!("Fetching place details for: {}", place_id);

        let body = self
            .invoke(
                Endpoint::PlaceDetails,
                &[("place_id", place_id.to_string())],
                self.timeout,
            )
            .await?;
        let response: PlaceDetailsResponse = serde_json::from_value(body)?;

        let details = response.result.ok_or(UpstreamError::EmptyResult {
            endpoint: Endpoint::PlaceDetails.name(),
        })?;
        if let Some(id) = details.place_id.as_deref() {
            if id != place_id.as_str() {
                warn!("Place details id {} differs from requested {}", id, place_id);
            }
        }
        Ok(details)
    }

    /// Fetches the zone and its offsets at `position` for the instant `timestamp`
    /// (seconds since the epoch, UTC).
    pub async fn time_zone(
        &self,
        position: Coordinate,
        timestamp: i64,
    ) -> Result<TimeZoneResponse, GeoError> {
        info!("Fetching time zone for position: {}", position);

        let body = self
            .invoke(
                Endpoint::TimeZone,
                &[
                    ("location", position.to_query_value()),
                    ("timestamp", timestamp.to_string()),
                ],
                self.timeout,
            )
            .await?;

        // The API answers ZERO_RESULTS for positions with no zone, e.g. open ocean
        if provider_status(&body) == Some("ZERO_RESULTS") {
            return Err(UpstreamError::EmptyResult {
                endpoint: Endpoint::TimeZone.name(),
            }
            .into());
        }

        let response: TimeZoneResponse = serde_json::from_value(body)?;
        debug!("Time zone data fetched successfully: {:?}", response);
        Ok(response)
    }
}

fn provider_status(body: &Value) -> Option<&str> {
    body.get("status").and_then(Value::as_str)
}

/// Rejects replies whose `status` field reports a provider-side failure.
/// A missing status is treated as `OK`.
fn check_provider_status(endpoint: Endpoint, body: &Value) -> Result<(), UpstreamError> {
    match provider_status(body) {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(()),
        Some(status) => {
            let message = body
                .get("error_message")
                .or_else(|| body.get("errorMessage"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            error!("{} returned status {}: {}", endpoint.name(), status, message);
            Err(UpstreamError::ProviderStatus {
                endpoint: endpoint.name(),
                status: status.to_string(),
                message,
            })
        }
    }
}

fn first_result(response: GeocodeResponse) -> Option<GeocodeResult> {
    response.results.into_iter().next()
}

pub(crate) fn to_coordinate(endpoint: Endpoint, location: LatLng) -> Result<Coordinate, GeoError> {
    Coordinate::new(location.lat, location.lng).map_err(|_| {
        UpstreamError::InvalidPosition {
            endpoint: endpoint.name(),
            latitude: location.lat,
            longitude: location.lng,
        }
        .into()
    })
}

fn into_resolved_place(endpoint: Endpoint, result: GeocodeResult) -> Result<ResolvedPlace, GeoError> {
    Ok(ResolvedPlace {
        place_id: PlaceId::from(result.place_id),
        address: result.formatted_address,
        position: to_coordinate(endpoint, result.geometry.location)?,
    })
}
