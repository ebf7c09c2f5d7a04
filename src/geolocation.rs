use async_trait::async_trait;

use crate::types::Coordinate;

/// Why the platform could not report a position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Platform capability that reports where the device currently is.
///
/// The client applies its own bounded wait around [`current_position`], so
/// implementations may block for as long as the platform takes.
///
/// [`current_position`]: GeolocationProvider::current_position
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// Provider that always reports the same, preconfigured position
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: Coordinate,
}

impl FixedGeolocation {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Ok(self.position)
    }
}
