use foundation::{Coordinate, LanguageCode};
use url::Url;

use crate::error::FetchError;

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_HOST: &str = "wikipedia.org";

/// Builds API URLs of the form `{scheme}://{lang}.{host}/w/api.php?...`.
///
/// Every request carries `format=json` and `origin=*` (anonymous CORS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiEndpoint {
    scheme: String,
    host: String,
}

impl Default for WikiEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME, DEFAULT_HOST)
    }
}

impl WikiEndpoint {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_base(&self, language: &LanguageCode) -> Result<Url, FetchError> {
        let raw = format!("{}://{}.{}/w/api.php", self.scheme, language, self.host);
        Url::parse(&raw).map_err(|e| FetchError::FetchFailed(format!("invalid API url {raw}: {e}")))
    }

    pub fn geosearch(
        &self,
        language: &LanguageCode,
        center: Coordinate,
        radius_m: u32,
        limit: u32,
    ) -> Result<Url, FetchError> {
        let coord = format!("{}|{}", center.latitude, center.longitude);
        self.build(
            language,
            &[
                ("action", "query"),
                ("list", "geosearch"),
                ("gsradius", &radius_m.to_string()),
                ("gscoord", &coord),
                ("gslimit", &limit.to_string()),
            ],
            &[],
        )
    }

    pub fn extract(&self, language: &LanguageCode, title: &str) -> Result<Url, FetchError> {
        self.build(
            language,
            &[("action", "query"), ("prop", "extracts"), ("titles", title)],
            &["exintro"],
        )
    }

    pub fn opensearch(
        &self,
        language: &LanguageCode,
        query: &str,
        limit: u32,
    ) -> Result<Url, FetchError> {
        self.build(
            language,
            &[
                ("action", "opensearch"),
                ("search", query),
                ("limit", &limit.to_string()),
                ("namespace", "0"),
            ],
            &[],
        )
    }

    pub fn coordinates(&self, language: &LanguageCode, title: &str) -> Result<Url, FetchError> {
        self.build(
            language,
            &[("action", "query"), ("prop", "coordinates"), ("titles", title)],
            &[],
        )
    }

    fn build(
        &self,
        language: &LanguageCode,
        params: &[(&str, &str)],
        flags: &[&str],
    ) -> Result<Url, FetchError> {
        let mut url = self.api_base(language)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            for flag in flags {
                query.append_key_only(flag);
            }
            query.append_pair("format", "json");
            query.append_pair("origin", "*");
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use foundation::{Coordinate, LanguageCode};
    use url::Url;

    use super::WikiEndpoint;

    fn params(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn geosearch_uses_language_subdomain_and_fixed_params() {
        let ep = WikiEndpoint::default();
        let lang = LanguageCode::new("de").unwrap();
        let url = ep
            .geosearch(&lang, Coordinate::new(40.05, -74.05).unwrap(), 10_000, 50)
            .unwrap();
        assert_eq!(url.host_str(), Some("de.wikipedia.org"));
        assert_eq!(url.path(), "/w/api.php");
        let p = params(&url);
        assert_eq!(p["list"], "geosearch");
        assert_eq!(p["gsradius"], "10000");
        assert_eq!(p["gslimit"], "50");
        assert_eq!(p["gscoord"], "40.05|-74.05");
        assert_eq!(p["format"], "json");
        assert_eq!(p["origin"], "*");
    }

    #[test]
    fn extract_encodes_title_and_sets_intro_flag() {
        let ep = WikiEndpoint::default();
        let url = ep
            .extract(&LanguageCode::default(), "Café de Flore & Co")
            .unwrap();
        let p = params(&url);
        assert_eq!(p["titles"], "Café de Flore & Co");
        assert!(p.contains_key("exintro"));
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn custom_host_and_scheme() {
        let ep = WikiEndpoint::new("http", "wiki.test:8080");
        let url = ep.opensearch(&LanguageCode::default(), "Berl", 5).unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("en.wiki.test"));
        assert_eq!(url.port(), Some(8080));
        let p = params(&url);
        assert_eq!(p["limit"], "5");
        assert_eq!(p["namespace"], "0");
    }

    #[test]
    fn invalid_host_is_a_fetch_failure() {
        let ep = WikiEndpoint::new("https", "bad host");
        assert!(ep.coordinates(&LanguageCode::default(), "X").is_err());
    }
}
