use std::collections::HashSet;

use foundation::{BoundingRegion, Coordinate, LanguageCode};
use futures_util::StreamExt;
use futures_util::stream::FuturesOrdered;
use tracing::{debug, warn};

use crate::article::Article;
use crate::endpoint::WikiEndpoint;
use crate::error::FetchError;
use crate::http::AsyncHttpClient;
use crate::protocol;

/// Geosearch radius in meters.
pub const DEFAULT_RADIUS_M: u32 = 10_000;
/// Maximum geosearch hits per request.
pub const DEFAULT_LIMIT: u32 = 50;

/// Finds articles near a viewport and fills in their lead-section summaries.
#[derive(Debug, Clone)]
pub struct ArticleFetcher<C> {
    client: C,
    endpoint: WikiEndpoint,
    radius_m: u32,
    limit: u32,
    summary_concurrency: usize,
}

impl<C: AsyncHttpClient> ArticleFetcher<C> {
    pub fn new(client: C, endpoint: WikiEndpoint) -> Self {
        Self {
            client,
            endpoint,
            radius_m: DEFAULT_RADIUS_M,
            limit: DEFAULT_LIMIT,
            summary_concurrency: DEFAULT_LIMIT as usize,
        }
    }

    pub fn with_radius(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Caps simultaneous summary requests. Results keep geosearch order.
    pub fn with_summary_concurrency(mut self, n: usize) -> Self {
        self.summary_concurrency = n.max(1);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// All articles around the center of `region`, deduplicated by title.
    pub async fn fetch_articles_near(
        &self,
        region: BoundingRegion,
        language: &LanguageCode,
    ) -> Result<Vec<Article>, FetchError> {
        self.fetch_new_articles_near(region, language, &HashSet::new())
            .await
    }

    /// Like [`Self::fetch_articles_near`], minus titles in `known_titles`.
    ///
    /// Known titles are dropped before summaries are requested. The batch is
    /// returned only once every summary request has settled; a failed
    /// summary leaves that article's `summary_html` empty.
    pub async fn fetch_new_articles_near(
        &self,
        region: BoundingRegion,
        language: &LanguageCode,
        known_titles: &HashSet<String>,
    ) -> Result<Vec<Article>, FetchError> {
        let center = region.center();
        let url = self
            .endpoint
            .geosearch(language, center, self.radius_m, self.limit)?;
        debug!(%language, center = %center, "geosearch");

        let body = self
            .client
            .get(&url)
            .await
            .map_err(FetchError::into_fetch_failed)?;
        let hits = protocol::parse_geosearch(&body)?;
        let hit_count = hits.len();

        let mut seen = HashSet::new();
        let mut articles: Vec<Article> = hits
            .into_iter()
            .filter_map(|hit| match Coordinate::new(hit.lat, hit.lon) {
                Ok(location) => Some(Article::new(hit.title, location)),
                Err(e) => {
                    warn!(title = %hit.title, error = %e, "skipping geosearch hit");
                    None
                }
            })
            .filter(|a| !known_titles.contains(&a.title) && seen.insert(a.title.clone()))
            .collect();

        self.fill_summaries(&mut articles, language).await;
        debug!(hits = hit_count, new = articles.len(), "geosearch batch complete");
        Ok(articles)
    }

    /// Lead-section HTML of `title`.
    pub async fn fetch_summary(
        &self,
        title: &str,
        language: &LanguageCode,
    ) -> Result<String, FetchError> {
        let url = self.endpoint.extract(language, title)?;
        let body = self.client.get(&url).await?;
        protocol::parse_extract(&body)
    }

    async fn fill_summaries(&self, articles: &mut [Article], language: &LanguageCode) {
        let mut summaries = Vec::with_capacity(articles.len());
        {
            let mut in_flight = FuturesOrdered::new();
            for article in articles.iter() {
                in_flight.push_back(self.fetch_summary(&article.title, language));
                if in_flight.len() >= self.summary_concurrency {
                    if let Some(summary) = in_flight.next().await {
                        summaries.push(summary);
                    }
                }
            }
            while let Some(summary) = in_flight.next().await {
                summaries.push(summary);
            }
        }

        for (article, summary) in articles.iter_mut().zip(summaries) {
            match summary {
                Ok(html) => article.summary_html = html,
                Err(e) => warn!(title = %article.title, error = %e, "summary unavailable"),
            }
        }
    }
}
