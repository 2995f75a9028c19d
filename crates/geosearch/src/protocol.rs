//! Wire types for the encyclopedia query API.
//!
//! Query responses wrap their payload as `{"query": {...}}`; failures come
//! back with HTTP 200 and an `{"error": {"code", "info"}}` object instead.
//! Page-keyed responses (`extracts`, `coordinates`) are maps whose single key
//! is the dynamic page id.

use std::collections::BTreeMap;

use foundation::Coordinate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::article::SearchSuggestion;
use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    query: Option<T>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeosearchQuery {
    #[serde(default)]
    geosearch: Vec<GeosearchHit>,
}

/// One `list=geosearch` result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeosearchHit {
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub pageid: Option<u64>,
    /// Distance from the query point in meters.
    #[serde(default)]
    pub dist: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery<P> {
    #[serde(default)]
    pages: BTreeMap<String, P>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CoordinatesPage {
    #[serde(default)]
    coordinates: Vec<CoordinateEntry>,
}

#[derive(Debug, Deserialize)]
struct CoordinateEntry {
    lat: f64,
    lon: f64,
}

fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<Envelope<T>, FetchError> {
    let envelope: Envelope<T> = serde_json::from_slice(body)
        .map_err(|e| FetchError::FetchFailed(format!("undecodable {what} response: {e}")))?;
    if let Some(err) = &envelope.error {
        return Err(FetchError::FetchFailed(format!(
            "API error {}: {}",
            err.code, err.info
        )));
    }
    Ok(envelope)
}

/// Parses a `list=geosearch` response.
///
/// Every failure, including a missing `query` object, is `FetchFailed`.
pub fn parse_geosearch(body: &[u8]) -> Result<Vec<GeosearchHit>, FetchError> {
    let envelope: Envelope<GeosearchQuery> = decode(body, "geosearch")?;
    envelope
        .query
        .map(|q| q.geosearch)
        .ok_or_else(|| FetchError::FetchFailed("geosearch response has no query".to_string()))
}

/// Parses a `prop=extracts` response for a single title.
///
/// A page without an extract (missing page, redirect stub) yields an empty
/// string.
pub fn parse_extract(body: &[u8]) -> Result<String, FetchError> {
    let envelope: Envelope<PagesQuery<ExtractPage>> = decode(body, "extract")?;
    let page = envelope
        .query
        .and_then(|q| q.pages.into_values().next())
        .ok_or_else(|| FetchError::MalformedResponse("extract response has no page".into()))?;
    Ok(page.extract.unwrap_or_default())
}

/// Parses an `action=opensearch` response: `[query, titles, descriptions, links]`.
pub fn parse_opensearch(body: &[u8]) -> Result<Vec<SearchSuggestion>, FetchError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(format!("undecodable opensearch body: {e}")))?;

    if let Some(err) = value.get("error") {
        let info = err.get("info").and_then(|v| v.as_str()).unwrap_or("unknown");
        return Err(FetchError::FetchFailed(format!("API error: {info}")));
    }

    let parts = value
        .as_array()
        .filter(|a| a.len() >= 4)
        .ok_or_else(|| FetchError::MalformedResponse("expected a 4-element array".into()))?;

    let titles = string_array(&parts[1], "titles")?;
    let descriptions = string_array(&parts[2], "descriptions")?;
    let links = string_array(&parts[3], "links")?;

    if titles.len() != descriptions.len() || titles.len() != links.len() {
        return Err(FetchError::MalformedResponse(format!(
            "suggestion arrays differ in length: titles={} descriptions={} links={}",
            titles.len(),
            descriptions.len(),
            links.len()
        )));
    }

    Ok(titles
        .into_iter()
        .zip(descriptions)
        .zip(links)
        .map(|((title, description), external_link)| SearchSuggestion {
            title,
            description,
            external_link,
        })
        .collect())
}

fn string_array(value: &serde_json::Value, name: &str) -> Result<Vec<String>, FetchError> {
    let items = value
        .as_array()
        .ok_or_else(|| FetchError::MalformedResponse(format!("{name} is not an array")))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| FetchError::MalformedResponse(format!("{name} holds a non-string")))
        })
        .collect()
}

/// Parses a `prop=coordinates` response for `title`.
pub fn parse_coordinates(body: &[u8], title: &str) -> Result<Coordinate, FetchError> {
    let envelope: Envelope<PagesQuery<CoordinatesPage>> = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(format!("undecodable coordinates body: {e}")))?;
    if let Some(err) = envelope.error {
        return Err(FetchError::FetchFailed(format!(
            "API error {}: {}",
            err.code, err.info
        )));
    }
    let page = envelope
        .query
        .and_then(|q| q.pages.into_values().next())
        .ok_or_else(|| FetchError::MalformedResponse("coordinates response has no page".into()))?;
    let first = page
        .coordinates
        .first()
        .ok_or_else(|| FetchError::NoCoordinateAvailable(title.to_string()))?;
    Coordinate::new(first.lat, first.lon)
        .map_err(|e| FetchError::MalformedResponse(format!("{title}: {e}")))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn bytes(v: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&v).unwrap()
    }

    #[test]
    fn geosearch_hits_in_order() {
        let body = bytes(json!({
            "batchcomplete": "",
            "query": {"geosearch": [
                {"pageid": 1, "ns": 0, "title": "Article A", "lat": 40.05, "lon": -74.05, "dist": 12.5},
                {"pageid": 2, "ns": 0, "title": "Article B", "lat": 40.06, "lon": -74.04, "dist": 80.0}
            ]}
        }));
        let hits = parse_geosearch(&body).unwrap();
        let titles: Vec<_> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Article A", "Article B"]);
        assert_eq!(hits[0].pageid, Some(1));
    }

    #[test]
    fn geosearch_failures_are_fetch_failed() {
        assert!(matches!(
            parse_geosearch(b"<html>"),
            Err(FetchError::FetchFailed(_))
        ));
        assert!(matches!(
            parse_geosearch(&bytes(json!({"batchcomplete": ""}))),
            Err(FetchError::FetchFailed(_))
        ));
        let err = parse_geosearch(&bytes(json!({
            "error": {"code": "invalid-coord", "info": "Invalid coordinate provided"}
        })))
        .unwrap_err();
        assert_eq!(
            err,
            FetchError::FetchFailed("API error invalid-coord: Invalid coordinate provided".into())
        );
    }

    #[test]
    fn extract_reads_the_single_dynamic_page() {
        let body = bytes(json!({"query": {"pages": {"736": {"pageid": 736, "title": "A", "extract": "<p>Hi</p>"}}}}));
        assert_eq!(parse_extract(&body).unwrap(), "<p>Hi</p>");

        let missing = bytes(json!({"query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}}));
        assert_eq!(parse_extract(&missing).unwrap(), "");

        let empty = bytes(json!({"query": {"pages": {}}}));
        assert!(matches!(
            parse_extract(&empty),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn opensearch_zips_parallel_arrays() {
        let body = bytes(json!([
            "Berl",
            ["Berlin", "Berlingo"],
            ["Capital of Germany", ""],
            ["https://en.wikipedia.org/wiki/Berlin", "https://en.wikipedia.org/wiki/Berlingo"]
        ]));
        let suggestions = parse_opensearch(&body).unwrap();
        assert_eq!(
            suggestions[0],
            SearchSuggestion {
                title: "Berlin".into(),
                description: "Capital of Germany".into(),
                external_link: "https://en.wikipedia.org/wiki/Berlin".into(),
            }
        );
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn opensearch_rejects_mismatched_lengths() {
        let body = bytes(json!(["Berl", ["Berlin", "Berlingo"], ["only one"], ["a", "b"]]));
        assert!(matches!(
            parse_opensearch(&body),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_opensearch(&bytes(json!(["Berl", ["Berlin"]]))),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_opensearch(&bytes(json!({"error": {"code": "x", "info": "down"}}))),
            Err(FetchError::FetchFailed(_))
        ));
    }

    #[test]
    fn coordinates_present_absent_and_invalid() {
        let body = bytes(json!({"query": {"pages": {"1": {"title": "Eiffel Tower",
            "coordinates": [{"lat": 48.8584, "lon": 2.2945, "primary": "", "globe": "earth"}]}}}}));
        let c = parse_coordinates(&body, "Eiffel Tower").unwrap();
        assert_eq!(c, Coordinate::new(48.8584, 2.2945).unwrap());

        let none = bytes(json!({"query": {"pages": {"2": {"title": "Mercury"}}}}));
        assert_eq!(
            parse_coordinates(&none, "Mercury"),
            Err(FetchError::NoCoordinateAvailable("Mercury".into()))
        );

        let bad = bytes(json!({"query": {"pages": {"3": {"coordinates": [{"lat": 123.0, "lon": 0.0}]}}}}));
        assert!(matches!(
            parse_coordinates(&bad, "X"),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn page_queries_tolerate_missing_pages_key() {
        let no_pages = bytes(json!({"batchcomplete": "", "query": {}}));
        assert_eq!(
            parse_extract(&no_pages),
            Err(FetchError::MalformedResponse("extract response has no page".into()))
        );
        assert_eq!(
            parse_coordinates(&no_pages, "Atlantis"),
            Err(FetchError::MalformedResponse("coordinates response has no page".into()))
        );
    }
}
