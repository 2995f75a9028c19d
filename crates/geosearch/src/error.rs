/// Failures surfaced by the encyclopedia client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport failure, non-success status, API error object, or an
    /// undecodable geosearch/summary body.
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    /// The body decoded but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The page exists but carries no geographic coordinate.
    #[error("no coordinate available for {0:?}")]
    NoCoordinateAvailable(String),
}

impl FetchError {
    /// Stable snake_case tag for notices and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::FetchFailed(_) => "fetch_failed",
            FetchError::MalformedResponse(_) => "malformed_response",
            FetchError::NoCoordinateAvailable(_) => "no_coordinate_available",
        }
    }

    /// Folds any error into `FetchFailed`, keeping the message.
    pub(crate) fn into_fetch_failed(self) -> FetchError {
        match self {
            FetchError::FetchFailed(_) => self,
            other => FetchError::FetchFailed(other.to_string()),
        }
    }
}
