//! Location search and local-time lookup on top of the Google Maps web APIs.
//!
//! [`GeoTimeClient`] turns a text query or the device position into a
//! [`ResolvedPlace`]; [`LocationRegistry`] resolves the local time for it and
//! keeps the session's locations in search order.

pub mod client;
pub mod config;
pub mod error;
pub mod geo_service;
pub mod geolocation;
pub mod local_time;
pub mod registry;
pub mod types;

pub use client::{GeoTimeClient, LocalTimeResolver};
pub use config::Config;
pub use error::{GeoError, UpstreamError};
pub use geo_service::{Endpoint, GeoService};
pub use geolocation::{FixedGeolocation, GeolocationProvider, PositionError};
pub use local_time::DayNameStyle;
pub use registry::{LocationRegistry, RegistryEvent};
pub use types::{Coordinate, LocationRecord, PlaceId, ResolvedPlace, TimeData};
