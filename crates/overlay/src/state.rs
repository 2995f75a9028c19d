use std::collections::{HashMap, HashSet};

use foundation::{Coordinate, LanguageCode};
use geosearch::{Article, SearchSuggestion};
use serde::Serialize;

/// Result of merging one fetched batch.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Articles appended because their title was new.
    pub added: usize,
    /// Held articles whose empty summary was filled from the batch.
    pub filled: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.filled > 0
    }
}

/// Everything the rendering layer needs to draw the overlay.
///
/// Articles are kept in first-seen order and are unique by title within a
/// language session. The revision counters let a renderer tell which parts
/// changed since it last looked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOverlayState {
    pub user_location: Option<Coordinate>,
    articles: Vec<Article>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    pub center_coordinate: Option<Coordinate>,
    pub center_revision: u64,
    pub articles_revision: u64,
    language: LanguageCode,
    pub search_query: String,
    search_suggestions: Vec<SearchSuggestion>,
    pub selected_article: Option<String>,
}

impl Default for MapOverlayState {
    fn default() -> Self {
        Self::new(LanguageCode::default())
    }
}

impl MapOverlayState {
    pub fn new(language: LanguageCode) -> Self {
        Self {
            user_location: None,
            articles: Vec::new(),
            index: HashMap::new(),
            center_coordinate: None,
            center_revision: 0,
            articles_revision: 0,
            language,
            search_query: String::new(),
            search_suggestions: Vec::new(),
            selected_article: None,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article(&self, title: &str) -> Option<&Article> {
        self.index.get(title).map(|&i| &self.articles[i])
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    pub fn known_titles(&self) -> HashSet<String> {
        self.index.keys().cloned().collect()
    }

    pub fn language(&self) -> &LanguageCode {
        &self.language
    }

    pub fn search_suggestions(&self) -> &[SearchSuggestion] {
        &self.search_suggestions
    }

    /// Appends unseen titles in batch order; the first copy of a title wins.
    ///
    /// A held article with an empty summary takes the summary of a later
    /// copy, keeping its position and location.
    pub fn merge_articles(&mut self, batch: impl IntoIterator<Item = Article>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for article in batch {
            match self.index.get(&article.title) {
                Some(&i) => {
                    let held = &mut self.articles[i];
                    if !held.has_summary() && article.has_summary() {
                        held.summary_html = article.summary_html;
                        outcome.filled += 1;
                    }
                }
                None => {
                    self.index.insert(article.title.clone(), self.articles.len());
                    self.articles.push(article);
                    outcome.added += 1;
                }
            }
        }
        if outcome.changed() {
            self.articles_revision += 1;
        }
        outcome
    }

    /// Switches language, clearing everything tied to the previous one.
    ///
    /// Returns `false` (and changes nothing) if `language` is already active.
    pub fn set_language(&mut self, language: LanguageCode) -> bool {
        if self.language == language {
            return false;
        }
        self.language = language;
        self.articles.clear();
        self.index.clear();
        self.articles_revision += 1;
        self.clear_search();
        self.selected_article = None;
        true
    }

    pub fn recenter(&mut self, center: Coordinate) {
        self.center_coordinate = Some(center);
        self.center_revision += 1;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<SearchSuggestion>) {
        self.search_suggestions = suggestions;
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_suggestions.clear();
    }

    /// Marks `title` as the article being read, if it is on the map.
    pub fn select_article(&mut self, title: &str) -> Option<&Article> {
        let i = *self.index.get(title)?;
        self.selected_article = Some(title.to_string());
        Some(&self.articles[i])
    }

    pub fn selected(&self) -> Option<&Article> {
        self.selected_article.as_deref().and_then(|t| self.article(t))
    }
}

#[cfg(test)]
mod tests {
    use foundation::{Coordinate, LanguageCode};
    use geosearch::{Article, SearchSuggestion};
    use pretty_assertions::assert_eq;

    use super::{MapOverlayState, MergeOutcome};

    fn article(title: &str, summary: &str) -> Article {
        let mut a = Article::new(title, Coordinate::new(40.05, -74.05).unwrap());
        a.summary_html = summary.to_string();
        a
    }

    fn titles(state: &MapOverlayState) -> Vec<&str> {
        state.articles().iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let mut s = MapOverlayState::default();
        s.merge_articles(vec![article("B", "b"), article("A", "a")]);
        s.merge_articles(vec![article("C", "c"), article("A", "other")]);
        assert_eq!(titles(&s), vec!["B", "A", "C"]);
        assert_eq!(s.article("A").unwrap().summary_html, "a");
    }

    #[test]
    fn merging_same_batch_twice_is_idempotent() {
        let batch = vec![article("A", "a"), article("B", "b")];
        let mut s = MapOverlayState::default();
        assert_eq!(
            s.merge_articles(batch.clone()),
            MergeOutcome { added: 2, filled: 0 }
        );
        let rev = s.articles_revision;
        assert!(!s.merge_articles(batch).changed());
        assert_eq!(titles(&s), vec!["A", "B"]);
        assert_eq!(s.articles_revision, rev);
    }

    #[test]
    fn duplicate_inside_one_batch_is_collapsed() {
        let mut s = MapOverlayState::default();
        let out = s.merge_articles(vec![article("A", ""), article("A", "late")]);
        assert_eq!(out, MergeOutcome { added: 1, filled: 1 });
        assert_eq!(s.articles().len(), 1);
        assert_eq!(s.articles()[0].summary_html, "late");
    }

    #[test]
    fn empty_summary_is_filled_in_place() {
        let mut s = MapOverlayState::default();
        s.merge_articles(vec![article("A", ""), article("B", "b")]);
        let out = s.merge_articles(vec![article("A", "<p>A</p>")]);
        assert_eq!(out.filled, 1);
        assert_eq!(titles(&s), vec!["A", "B"]);
        assert_eq!(s.articles()[0].summary_html, "<p>A</p>");
    }

    #[test]
    fn language_change_resets_session() {
        let mut s = MapOverlayState::default();
        s.merge_articles(vec![article("A", "a")]);
        s.set_search_query("Berl");
        s.set_suggestions(vec![SearchSuggestion {
            title: "Berlin".into(),
            description: String::new(),
            external_link: String::new(),
        }]);
        s.select_article("A");
        s.recenter(Coordinate::new(1.0, 2.0).unwrap());

        assert!(!s.set_language(LanguageCode::default()));
        assert_eq!(s.articles().len(), 1);

        assert!(s.set_language(LanguageCode::new("de").unwrap()));
        assert!(s.articles().is_empty());
        assert!(!s.contains_title("A"));
        assert!(s.search_suggestions().is_empty());
        assert!(s.search_query.is_empty());
        assert_eq!(s.selected_article, None);
        assert!(s.center_coordinate.is_some());

        s.merge_articles(vec![article("A", "de")]);
        assert_eq!(s.articles().len(), 1);
    }

    #[test]
    fn select_article_requires_known_title() {
        let mut s = MapOverlayState::default();
        s.merge_articles(vec![article("A", "a")]);
        assert!(s.select_article("Z").is_none());
        assert_eq!(s.select_article("A").map(|a| a.title.clone()), Some("A".into()));
        assert_eq!(s.selected().unwrap().summary_html, "a");
    }

    #[test]
    fn recenter_bumps_revision() {
        let mut s = MapOverlayState::default();
        let c = Coordinate::new(48.85, 2.35).unwrap();
        s.recenter(c);
        s.recenter(c);
        assert_eq!(s.center_coordinate, Some(c));
        assert_eq!(s.center_revision, 2);
    }

    #[test]
    fn serializes_without_private_index() {
        let mut s = MapOverlayState::default();
        s.merge_articles(vec![article("A", "a")]);
        let v = serde_json::to_value(&s).unwrap();
        assert!(v.get("index").is_none());
        assert_eq!(v["articles"][0]["title"], "A");
        assert_eq!(v["language"], "en");
    }
}
