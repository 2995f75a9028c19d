use std::future::Future;
use std::time::Duration;

use foundation::Coordinate;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The device refused or could not produce a position.
    #[error("location unavailable: {0}")]
    Unavailable(String),
    #[error("location request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl LocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            LocationError::Unavailable(_) => "location_unavailable",
            LocationError::Timeout(_) => "location_timeout",
        }
    }
}

/// A device or service that can report where the user is.
pub trait PositionSource: Send + Sync {
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// Always reports the same position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FixedPosition(pub Coordinate);

impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// A source for environments without geolocation.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoPosition;

impl PositionSource for NoPosition {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable("no position source configured".into()))
    }
}

/// `None` behaves like [`NoPosition`].
impl<P: PositionSource> PositionSource for Option<P> {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        match self {
            Some(source) => source.current_position().await,
            None => NoPosition.current_position().await,
        }
    }
}

/// One-shot position lookup with an upper bound on waiting.
#[derive(Debug, Clone)]
pub struct GeoLocator<P> {
    source: P,
    timeout: Duration,
}

impl<P: PositionSource> GeoLocator<P> {
    pub fn new(source: P) -> Self {
        Self {
            source,
            timeout: DEFAULT_LOCATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn locate(&self) -> Result<Coordinate, LocationError> {
        let result = match tokio::time::timeout(self.timeout, self.source.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout(self.timeout)),
        };
        match &result {
            Ok(position) => debug!(%position, "location resolved"),
            Err(err) => warn!(error = %err, "location lookup failed"),
        }
        result
    }
}
