//! In-memory [`AsyncHttpClient`] with canned responses.
//!
//! Routes match on decoded query parameters; the first route whose pairs are
//! all present wins. Every request is recorded so tests can assert on what
//! was (or was not) sent.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;

use crate::error::FetchError;
use crate::http::AsyncHttpClient;

#[derive(Debug, Clone)]
struct Route {
    params: Vec<(String, String)>,
    response: Result<Vec<u8>, FetchError>,
    delay: Option<Duration>,
}

impl Route {
    fn matches(&self, url: &Url) -> bool {
        self.params
            .iter()
            .all(|(k, v)| url.query_pairs().any(|(qk, qv)| qk == k.as_str() && qv == v.as_str()))
    }
}

#[derive(Debug, Default)]
pub struct MockHttpClient {
    routes: Vec<Route>,
    requests: Mutex<Vec<Url>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, params: &[(&str, &str)], body: impl Into<Vec<u8>>) -> Self {
        self.routes.push(Route {
            params: owned(params),
            response: Ok(body.into()),
            delay: None,
        });
        self
    }

    pub fn route_json(self, params: &[(&str, &str)], body: Value) -> Self {
        let bytes = serde_json::to_vec(&body).unwrap_or_default();
        self.route(params, bytes)
    }

    pub fn route_error(mut self, params: &[(&str, &str)], err: FetchError) -> Self {
        self.routes.push(Route {
            params: owned(params),
            response: Err(err),
            delay: None,
        });
        self
    }

    /// Delays the most recently added route.
    pub fn delayed(mut self, delay: Duration) -> Self {
        if let Some(route) = self.routes.last_mut() {
            route.delay = Some(delay);
        }
        self
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded requests carrying all of `params`.
    pub fn count_matching(&self, params: &[(&str, &str)]) -> usize {
        let wanted = Route {
            params: owned(params),
            response: Ok(Vec::new()),
            delay: None,
        };
        self.requests().iter().filter(|u| wanted.matches(u)).count()
    }
}

impl AsyncHttpClient for MockHttpClient {
    async fn get(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.clone());

        let route = self.routes.iter().find(|r| r.matches(url)).cloned();
        let Some(route) = route else {
            return Err(FetchError::FetchFailed(format!("no mock route for {url}")));
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        route.response
    }
}

fn owned(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `list=geosearch` body for `(title, lat, lon)` hits.
pub fn geosearch_body(hits: &[(&str, f64, f64)]) -> Value {
    let items: Vec<Value> = hits
        .iter()
        .enumerate()
        .map(|(i, (title, lat, lon))| {
            json!({"pageid": i + 1, "ns": 0, "title": title, "lat": lat, "lon": lon, "dist": 0.0})
        })
        .collect();
    json!({"batchcomplete": "", "query": {"geosearch": items}})
}

pub fn extract_body(title: &str, html: &str) -> Value {
    json!({"batchcomplete": "", "query": {"pages": {"4242": {"pageid": 4242, "ns": 0, "title": title, "extract": html}}}})
}

pub fn opensearch_body(query: &str, titles: &[&str], descriptions: &[&str], links: &[&str]) -> Value {
    json!([query, titles, descriptions, links])
}

pub fn coordinates_body(title: &str, at: Option<(f64, f64)>) -> Value {
    match at {
        Some((lat, lon)) => json!({"query": {"pages": {"77": {"pageid": 77, "title": title,
            "coordinates": [{"lat": lat, "lon": lon, "primary": "", "globe": "earth"}]}}}}),
        None => json!({"query": {"pages": {"78": {"pageid": 78, "title": title}}}}),
    }
}
