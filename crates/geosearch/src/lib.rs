//! Client for the encyclopedia's public query API.
//!
//! Covers the four requests the map overlay needs: geosearch around a point,
//! lead-section extracts, opensearch autocomplete, and coordinate lookup.
//! HTTP goes through the [`AsyncHttpClient`] trait so tests can substitute
//! canned responses.

pub mod article;
pub mod articles;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod protocol;
pub mod suggest;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use article::*;
pub use articles::*;
pub use endpoint::*;
pub use error::*;
pub use http::*;
pub use suggest::*;
