use foundation::{Coordinate, LanguageCode};
use tracing::debug;

use crate::article::SearchSuggestion;
use crate::endpoint::WikiEndpoint;
use crate::error::FetchError;
use crate::http::AsyncHttpClient;
use crate::protocol;

/// Shorter queries never reach the network.
pub const MIN_QUERY_CHARS: usize = 3;
pub const DEFAULT_SUGGESTION_LIMIT: u32 = 5;

/// Autocomplete and title-to-coordinate lookup for the search box.
#[derive(Debug, Clone)]
pub struct SuggestionFetcher<C> {
    client: C,
    endpoint: WikiEndpoint,
    limit: u32,
}

/// Whether `query` is long enough to be sent (trimmed, counted in chars).
pub fn accepts_query(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

impl<C: AsyncHttpClient> SuggestionFetcher<C> {
    pub fn new(client: C, endpoint: WikiEndpoint) -> Self {
        Self {
            client,
            endpoint,
            limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn suggest(
        &self,
        query: &str,
        language: &LanguageCode,
    ) -> Result<Vec<SearchSuggestion>, FetchError> {
        if !accepts_query(query) {
            return Ok(Vec::new());
        }
        let url = self.endpoint.opensearch(language, query.trim(), self.limit)?;
        debug!(%language, query, "opensearch");
        let body = self.client.get(&url).await?;
        protocol::parse_opensearch(&body)
    }

    /// Fails with [`FetchError::NoCoordinateAvailable`] for pages without a
    /// position (disambiguations, people, concepts).
    pub async fn resolve_coordinate(
        &self,
        title: &str,
        language: &LanguageCode,
    ) -> Result<Coordinate, FetchError> {
        let url = self.endpoint.coordinates(language, title)?;
        debug!(%language, title, "coordinate lookup");
        let body = self.client.get(&url).await?;
        protocol::parse_coordinates(&body, title)
    }
}
