use std::str::FromStr;
use std::time::Duration;

use foundation::LanguageCode;
use geosearch::{
    ArticleFetcher, AsyncHttpClient, DEFAULT_HOST, DEFAULT_LIMIT, DEFAULT_RADIUS_M, DEFAULT_SCHEME,
    DEFAULT_SUGGESTION_LIMIT, SuggestionFetcher, WikiEndpoint,
};
use serde::{Deserialize, Serialize};

/// What to do with a geosearch result whose viewport has since changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Merge it anyway; articles only accumulate.
    #[default]
    Merge,
    /// Drop it if any viewport event arrived after the fetch started.
    Discard,
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(StalePolicy::Merge),
            "discard" => Ok(StalePolicy::Discard),
            other => Err(format!("unknown stale policy {other:?} (expected merge|discard)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub language: LanguageCode,
    pub scheme: String,
    pub host: String,
    pub debounce_ms: u64,
    pub radius_m: u32,
    pub limit: u32,
    pub summary_concurrency: usize,
    pub suggestion_limit: u32,
    /// Zoom level used when the view is recentered programmatically.
    pub recenter_zoom: u8,
    pub location_timeout_ms: u64,
    pub stale_results: StalePolicy,
    pub notice_capacity: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            language: LanguageCode::default(),
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            debounce_ms: 300,
            radius_m: DEFAULT_RADIUS_M,
            limit: DEFAULT_LIMIT,
            summary_concurrency: DEFAULT_LIMIT as usize,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            recenter_zoom: 13,
            location_timeout_ms: 10_000,
            stale_results: StalePolicy::Merge,
            notice_capacity: 32,
        }
    }
}

impl OverlayConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn endpoint(&self) -> WikiEndpoint {
        WikiEndpoint::new(self.scheme.clone(), self.host.clone())
    }

    pub fn article_fetcher<C: AsyncHttpClient>(&self, client: C) -> ArticleFetcher<C> {
        ArticleFetcher::new(client, self.endpoint())
            .with_radius(self.radius_m)
            .with_limit(self.limit)
            .with_summary_concurrency(self.summary_concurrency)
    }

    pub fn suggestion_fetcher<C: AsyncHttpClient>(&self, client: C) -> SuggestionFetcher<C> {
        SuggestionFetcher::new(client, self.endpoint()).with_limit(self.suggestion_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{OverlayConfig, StalePolicy};

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = OverlayConfig::default();
        assert_eq!(cfg.debounce(), Duration::from_millis(300));
        assert_eq!(cfg.radius_m, 10_000);
        assert_eq!(cfg.limit, 50);
        assert_eq!(cfg.suggestion_limit, 5);
        assert_eq!(cfg.recenter_zoom, 13);
        assert_eq!(cfg.stale_results, StalePolicy::Merge);
        assert_eq!(cfg.endpoint().host(), "wikipedia.org");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: OverlayConfig =
            serde_json::from_str(r#"{"language": "de", "stale_results": "discard"}"#).unwrap();
        assert_eq!(cfg.language.as_str(), "de");
        assert_eq!(cfg.stale_results, StalePolicy::Discard);
        assert_eq!(cfg.debounce_ms, 300);
    }

    #[test]
    fn stale_policy_parses_case_insensitively() {
        assert_eq!("Discard".parse::<StalePolicy>(), Ok(StalePolicy::Discard));
        assert!("keep".parse::<StalePolicy>().is_err());
    }
}
