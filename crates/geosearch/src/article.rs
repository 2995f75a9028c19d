use foundation::Coordinate;
use serde::{Deserialize, Serialize};

/// An encyclopedia article with a geographic position.
///
/// `title` is the identity key within one language session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub location: Coordinate,
    /// Lead-section HTML; empty until (or unless) the summary fetch succeeds.
    pub summary_html: String,
}

impl Article {
    pub fn new(title: impl Into<String>, location: Coordinate) -> Self {
        Self {
            title: title.into(),
            location,
            summary_html: String::new(),
        }
    }

    pub fn has_summary(&self) -> bool {
        !self.summary_html.is_empty()
    }
}

/// One autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub title: String,
    pub description: String,
    pub external_link: String,
}
