//! Integration tests for GeoTimeClient using wiremock.
//!
//! These tests drive the client against a mock of the Google Maps web APIs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geotime::{
    Config, Coordinate, FixedGeolocation, GeoError, GeoTimeClient, GeolocationProvider,
    LocalTimeResolver, PlaceId, PositionError, UpstreamError,
};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";
const NOW: i64 = 1_700_000_000;

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

fn config(server: &MockServer) -> Config {
    Config::new(API_KEY)
        .with_base_url(server.uri())
        .with_request_timeout(Duration::from_millis(300))
        .with_location_timeout(Duration::from_millis(200))
}

fn client(server: &MockServer) -> GeoTimeClient {
    GeoTimeClient::new(&config(server)).with_clock(fixed_now)
}

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn geocode_result(place_id: &str, address: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "place_id": place_id,
        "formatted_address": address,
        "geometry": { "location": { "lat": lat, "lng": lng } }
    })
}

struct DeniedGeolocation;

#[async_trait]
impl GeolocationProvider for DeniedGeolocation {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Err(PositionError::PermissionDenied)
    }
}

struct SlowGeolocation;

#[async_trait]
impl GeolocationProvider for SlowGeolocation {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Coordinate::new(0.0, 0.0).unwrap())
    }
}

#[tokio::test]
async fn test_local_time_adds_offsets_to_captured_instant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/timezone/json"))
        .and(query_param("location", "47.6062,-122.3321"))
        .and(query_param("timestamp", NOW.to_string()))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "dstOffset": 3600,
            "rawOffset": -28800,
            "timeZoneId": "America/Los_Angeles",
            "timeZoneName": "Pacific Daylight Time"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let time = client(&mock_server)
        .resolve_local_time(coord(47.6062, -122.3321))
        .await
        .unwrap();

    assert_eq!(time.time_zone_id, "America/Los_Angeles");
    assert_eq!(time.time_zone_name, "Pacific Daylight Time");
    assert_eq!(time.local_timestamp, NOW + 3600 - 28800);
}

#[tokio::test]
async fn test_local_time_zero_results_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/timezone/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ZERO_RESULTS"})),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_local_time(coord(0.0, -30.0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GeoError::Upstream(UpstreamError::EmptyResult { .. })
    ));
}

#[tokio::test]
async fn test_first_match_uses_top_prediction() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/place/autocomplete/json"))
        .and(query_param("input", "paris"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "predictions": [
                { "place_id": "PARIS_FR", "description": "Paris, France" },
                { "place_id": "PARIS_TX", "description": "Paris, TX, USA" }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(path("/place/details/json"))
        .and(query_param("place_id", "PARIS_FR"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": {
                "formatted_address": "Paris, France",
                "geometry": { "location": { "lat": 48.8566, "lng": 2.3522 } }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let place = client(&mock_server).resolve_first_match("paris").await.unwrap();

    assert_eq!(place.place_id, PlaceId::from("PARIS_FR"));
    assert_eq!(place.address, "Paris, France");
    assert_eq!(place.position, coord(48.8566, 2.3522));
}

#[tokio::test]
async fn test_first_match_without_predictions_skips_details() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "predictions": []
        })))
        .mount(&mock_server)
        .await;

    Mock::given(path("/place/details/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_first_match("zzzz")
        .await
        .unwrap_err();

    assert!(matches!(err, GeoError::NoMatchFound(ref q) if q == "zzzz"));
}

#[tokio::test]
async fn test_first_match_details_failure_fails_whole_lookup() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [{ "place_id": "P1" }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(path("/place/details/json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_first_match("anything")
        .await
        .unwrap_err();

    match err {
        GeoError::Upstream(UpstreamError::Status { endpoint, status }) => {
            assert_eq!(endpoint, "place details");
            assert_eq!(status.as_u16(), 503);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_provider_denial_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "This API project is not authorized to use this API.",
            "predictions": []
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_first_match("paris")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GeoError::Upstream(UpstreamError::ProviderStatus { ref status, .. }) if status == "REQUEST_DENIED"
    ));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/place/autocomplete/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "predictions": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_first_match("paris")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GeoError::Upstream(UpstreamError::Timeout { millis: 300, .. })
    ));
}

#[tokio::test]
async fn test_current_location_unsupported_makes_no_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_current_location()
        .await
        .unwrap_err();

    assert!(matches!(err, GeoError::GeolocationUnsupported));
}

#[tokio::test]
async fn test_current_location_reverse_geocodes_device_position() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/geocode/json"))
        .and(query_param("latlng", "40.7128,-74.006"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                geocode_result("NYC_HALL", "City Hall Park, New York, NY 10007, USA", 40.7127, -74.0059),
                geocode_result("NYC", "New York, NY, USA", 40.7128, -74.0060)
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server)
        .with_geolocation(Arc::new(FixedGeolocation::new(coord(40.7128, -74.006))));
    let place = client.resolve_current_location().await.unwrap();

    assert_eq!(place.place_id, PlaceId::from("NYC_HALL"));
    assert_eq!(place.address, "City Hall Park, New York, NY 10007, USA");
    assert_eq!(place.position, coord(40.7127, -74.0059));
}

#[tokio::test]
async fn test_current_location_denied() {
    let mock_server = MockServer::start().await;

    let client = client(&mock_server).with_geolocation(Arc::new(DeniedGeolocation));
    let err = client.resolve_current_location().await.unwrap_err();

    assert!(matches!(err, GeoError::LocationUnavailable(_)));
}

#[tokio::test]
async fn test_current_location_bounded_wait() {
    let mock_server = MockServer::start().await;

    let client = client(&mock_server).with_geolocation(Arc::new(SlowGeolocation));
    let err = client.resolve_current_location().await.unwrap_err();

    assert!(matches!(err, GeoError::LocationUnavailable(_)));
}

#[tokio::test]
async fn test_current_location_reverse_geocode_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server)
        .with_geolocation(Arc::new(FixedGeolocation::new(coord(0.0, 0.0))));
    let err = client.resolve_current_location().await.unwrap_err();

    assert!(matches!(
        err,
        GeoError::Upstream(UpstreamError::EmptyResult { .. })
    ));
}

#[tokio::test]
async fn test_resolve_address() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/geocode/json"))
        .and(query_param("address", "1600 Amphitheatre Parkway"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [geocode_result(
                "GOOGLEPLEX",
                "1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA",
                37.4224,
                -122.0842
            )]
        })))
        .mount(&mock_server)
        .await;

    let place = client(&mock_server)
        .resolve_address("1600 Amphitheatre Parkway")
        .await
        .unwrap();
    assert_eq!(place.place_id, PlaceId::from("GOOGLEPLEX"));

    let mock_server = MockServer::start().await;
    Mock::given(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_address("nowhere at all")
        .await
        .unwrap_err();
    assert!(matches!(err, GeoError::NoMatchFound(_)));
}

#[tokio::test]
async fn test_transport_error_does_not_expose_api_key() {
    // Nothing listens on port 1, so the connection is refused
    let config = Config::new("SUPER-SECRET-KEY")
        .with_base_url("http://127.0.0.1:1")
        .with_request_timeout(Duration::from_secs(2));
    let client = GeoTimeClient::new(&config).with_clock(fixed_now);

    let err = client.resolve_local_time(coord(1.0, 2.0)).await.unwrap_err();

    assert!(matches!(
        err,
        GeoError::Upstream(UpstreamError::Request(_))
    ));
    assert!(!err.to_string().contains("SUPER-SECRET-KEY"));
    assert!(!format!("{err:?}").contains("SUPER-SECRET-KEY"));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/timezone/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .resolve_local_time(coord(1.0, 2.0))
        .await
        .unwrap_err();

    assert!(matches!(err, GeoError::Upstream(UpstreamError::Parse(_))));
    assert!(!err.to_string().contains(API_KEY));
}
