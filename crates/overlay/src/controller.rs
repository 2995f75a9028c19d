use std::sync::Arc;

use foundation::{BoundingRegion, Coordinate, LanguageCode};
use geosearch::{
    Article, ArticleFetcher, AsyncHttpClient, FetchError, SearchSuggestion, SuggestionFetcher,
    accepts_query,
};
use runtime::metrics::keys;
use runtime::{DebounceTicket, DebounceTimer, Event, EventBus, Metrics, MetricsSnapshot};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{OverlayConfig, StalePolicy};
use crate::locate::{GeoLocator, LocationError, PositionSource};
use crate::state::MapOverlayState;
use crate::surface::{ViewportEvent, ViewportListener};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    /// A debounce timer is armed.
    PendingFetch,
    /// At least one geosearch is in flight and no timer is armed.
    Fetching,
}

/// What the controller publishes after every loop turn.
#[derive(Debug, Clone)]
pub struct OverlaySnapshot {
    pub state: MapOverlayState,
    pub phase: ControllerPhase,
    pub notices: Vec<Event>,
    pub metrics: MetricsSnapshot,
}

impl OverlaySnapshot {
    pub fn has_notice(&self, kind: &str) -> bool {
        self.notices.iter().any(|n| n.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("overlay controller has shut down")]
pub struct ControllerClosed;

#[derive(Debug)]
enum Command {
    Viewport(ViewportEvent),
    SearchQuery(String),
    SelectSuggestion(SearchSuggestion),
    SelectArticle(String),
    SetLanguage(LanguageCode),
    Recenter(Coordinate),
    FocusUserLocation,
    LocationResolved(Result<Coordinate, LocationError>),
    Shutdown,
}

/// Context captured when a geosearch starts, checked when it completes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct FetchTicket {
    epoch: u64,
    viewport_seq: u64,
}

#[derive(Debug)]
enum Completion {
    DebounceFired(DebounceTicket),
    Articles {
        ticket: FetchTicket,
        result: Result<Vec<Article>, FetchError>,
    },
    Suggestions {
        epoch: u64,
        query_seq: u64,
        result: Result<Vec<SearchSuggestion>, FetchError>,
    },
    Resolved {
        epoch: u64,
        title: String,
        result: Result<Coordinate, FetchError>,
    },
}

/// Cheap, cloneable front end of a running [`ViewportController`].
///
/// Every intent is fire-and-forget; the effect shows up in a later
/// [`OverlaySnapshot`].
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<OverlaySnapshot>,
}

impl OverlayHandle {
    fn send(&self, command: Command) -> Result<(), ControllerClosed> {
        self.commands.send(command).map_err(|_| ControllerClosed)
    }

    pub fn viewport(&self, event: ViewportEvent) -> Result<(), ControllerClosed> {
        self.send(Command::Viewport(event))
    }

    pub fn set_search_query(&self, query: impl Into<String>) -> Result<(), ControllerClosed> {
        self.send(Command::SearchQuery(query.into()))
    }

    pub fn select_suggestion(&self, suggestion: SearchSuggestion) -> Result<(), ControllerClosed> {
        self.send(Command::SelectSuggestion(suggestion))
    }

    /// Opens an article already on the map ("read more").
    pub fn select_article(&self, title: impl Into<String>) -> Result<(), ControllerClosed> {
        self.send(Command::SelectArticle(title.into()))
    }

    pub fn set_language(&self, language: LanguageCode) -> Result<(), ControllerClosed> {
        self.send(Command::SetLanguage(language))
    }

    pub fn recenter(&self, center: Coordinate) -> Result<(), ControllerClosed> {
        self.send(Command::Recenter(center))
    }

    pub fn focus_user_location(&self) -> Result<(), ControllerClosed> {
        self.send(Command::FocusUserLocation)
    }

    pub fn location_resolved(
        &self,
        result: Result<Coordinate, LocationError>,
    ) -> Result<(), ControllerClosed> {
        self.send(Command::LocationResolved(result))
    }

    pub fn shutdown(&self) -> Result<(), ControllerClosed> {
        self.send(Command::Shutdown)
    }

    /// Runs `locator` once in the background and reports the outcome.
    pub fn locate_with<P>(&self, locator: GeoLocator<P>) -> JoinHandle<()>
    where
        P: PositionSource + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            let result = locator.locate().await;
            if handle.location_resolved(result).is_err() {
                debug!("location resolved after controller shut down");
            }
        })
    }

    /// A listener suitable for [`crate::MapSurface::on_viewport_change`].
    pub fn listener(&self) -> ViewportListener {
        let commands = self.commands.clone();
        Box::new(move |event| {
            let _ = commands.send(Command::Viewport(event));
        })
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    ///
    /// The current snapshot is checked first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&OverlaySnapshot) -> bool,
    ) -> Result<OverlaySnapshot, ControllerClosed> {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| ControllerClosed)?;
        Ok((*snapshot).clone())
    }
}

/// Owns the session's [`MapOverlayState`] and turns map, search and
/// location intents into fetches and merges.
///
/// Runs as a single task. Commands are handled one per loop turn and every
/// fetch completes back into the same loop, so merges never interleave.
pub struct ViewportController<C> {
    config: OverlayConfig,
    articles: Arc<ArticleFetcher<C>>,
    suggestions: Arc<SuggestionFetcher<C>>,
    state: MapOverlayState,
    timer: DebounceTimer,
    latest_bounds: Option<BoundingRegion>,
    /// Bumped on language change; results from an older epoch are dropped.
    epoch: u64,
    viewport_seq: u64,
    query_seq: u64,
    in_flight: usize,
    notices: EventBus,
    metrics: Metrics,
    commands: mpsc::UnboundedReceiver<Command>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    snapshots: watch::Sender<OverlaySnapshot>,
}

impl<C> ViewportController<C>
where
    C: AsyncHttpClient + Clone + 'static,
{
    pub fn new(config: OverlayConfig, client: C) -> (Self, OverlayHandle) {
        let state = MapOverlayState::new(config.language.clone());
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(OverlaySnapshot {
            state: state.clone(),
            phase: ControllerPhase::Idle,
            notices: Vec::new(),
            metrics: MetricsSnapshot::default(),
        });

        let controller = Self {
            articles: Arc::new(config.article_fetcher(client.clone())),
            suggestions: Arc::new(config.suggestion_fetcher(client)),
            timer: DebounceTimer::new(config.debounce()),
            notices: EventBus::with_capacity(config.notice_capacity),
            config,
            state,
            latest_bounds: None,
            epoch: 0,
            viewport_seq: 0,
            query_seq: 0,
            in_flight: 0,
            metrics: Metrics::new(),
            commands,
            completions_tx,
            completions,
            snapshots,
        };
        let handle = OverlayHandle {
            commands: commands_tx,
            snapshots: snapshot_rx,
        };
        (controller, handle)
    }

    /// Starts the controller on the current runtime.
    ///
    /// The join handle yields the final state once the controller stops.
    pub fn spawn(config: OverlayConfig, client: C) -> (OverlayHandle, JoinHandle<MapOverlayState>) {
        let (controller, handle) = Self::new(config, client);
        (handle, tokio::spawn(controller.run()))
    }

    /// Processes commands until [`OverlayHandle::shutdown`] or until every
    /// handle is dropped.
    pub async fn run(mut self) -> MapOverlayState {
        info!(
            language = %self.state.language(),
            debounce_ms = self.config.debounce_ms,
            stale_results = ?self.config.stale_results,
            "overlay controller started"
        );
        loop {
            tokio::select! {
                biased;
                Some(done) = self.completions.recv() => self.on_completion(done),
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
            }
            self.publish();
        }

        self.timer.cancel();
        self.publish();
        info!(
            articles = self.state.articles().len(),
            in_flight = self.in_flight,
            "overlay controller stopped"
        );
        self.metrics.log_summary();
        self.state
    }

    fn phase(&self) -> ControllerPhase {
        if self.timer.is_pending() {
            ControllerPhase::PendingFetch
        } else if self.in_flight > 0 {
            ControllerPhase::Fetching
        } else {
            ControllerPhase::Idle
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(OverlaySnapshot {
            state: self.state.clone(),
            phase: self.phase(),
            notices: self.notices.events(),
            metrics: self.metrics.snapshot(),
        });
    }

    fn notice(&mut self, kind: &'static str, message: impl Into<String>) {
        self.notices.emit(kind, message);
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Viewport(ViewportEvent::Moved(bounds) | ViewportEvent::Zoomed(bounds)) => {
                self.latest_bounds = Some(bounds);
                self.viewport_seq += 1;
                self.arm_fetch();
            }
            Command::Viewport(ViewportEvent::Clicked(at)) => {
                info!(%at, "map clicked");
            }
            Command::SearchQuery(query) => self.on_search_query(query),
            Command::SelectSuggestion(suggestion) => self.on_select_suggestion(suggestion),
            Command::SelectArticle(title) => {
                if self.state.select_article(&title).is_some() {
                    debug!(%title, "article selected");
                } else {
                    self.notice("unknown_article", format!("{title:?} is not on the map"));
                }
            }
            Command::SetLanguage(language) => self.on_set_language(language),
            Command::Recenter(center) => self.recenter(center),
            Command::FocusUserLocation => match self.state.user_location {
                Some(me) => self.recenter(me),
                None => {
                    let err = LocationError::Unavailable("user location is not known yet".into());
                    self.notice(err.kind(), err.to_string());
                }
            },
            Command::LocationResolved(Ok(position)) => {
                info!(%position, "user location resolved");
                self.state.user_location = Some(position);
                if self.state.center_coordinate.is_none() {
                    self.recenter(position);
                }
            }
            Command::LocationResolved(Err(err)) => {
                warn!(error = %err, "geolocation failed");
                self.notice(err.kind(), err.to_string());
            }
            Command::Shutdown => {}
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::DebounceFired(ticket) => {
                if self.timer.take_if_current(ticket) {
                    self.start_fetch();
                } else {
                    debug!(ticket = ticket.0, "ignoring superseded debounce tick");
                }
            }
            Completion::Articles { ticket, result } => self.on_articles(ticket, result),
            Completion::Suggestions {
                epoch,
                query_seq,
                result,
            } => {
                if epoch != self.epoch || query_seq != self.query_seq {
                    debug!(query_seq, current = self.query_seq, "dropping superseded suggestions");
                    return;
                }
                match result {
                    Ok(suggestions) => {
                        debug!(count = suggestions.len(), "suggestions updated");
                        self.state.set_suggestions(suggestions);
                    }
                    Err(err) => {
                        self.metrics.inc_counter(keys::SUGGEST_FAILURES, 1);
                        warn!(error = %err, "suggestion lookup failed");
                        self.notice(err.kind(), err.to_string());
                    }
                }
            }
            Completion::Resolved {
                epoch,
                title,
                result,
            } => {
                if epoch != self.epoch {
                    debug!(%title, "dropping coordinate from previous language");
                    return;
                }
                match result {
                    Ok(center) => {
                        info!(%title, %center, "suggestion resolved");
                        self.recenter(center);
                    }
                    Err(err) => {
                        warn!(%title, error = %err, "suggestion has no usable coordinate");
                        self.notice(err.kind(), err.to_string());
                    }
                }
            }
        }
    }

    fn arm_fetch(&mut self) {
        let tx = self.completions_tx.clone();
        self.timer.arm(move |ticket| async move {
            let _ = tx.send(Completion::DebounceFired(ticket));
        });
    }

    fn start_fetch(&mut self) {
        let Some(bounds) = self.latest_bounds else {
            return;
        };
        let ticket = FetchTicket {
            epoch: self.epoch,
            viewport_seq: self.viewport_seq,
        };
        let fetcher = Arc::clone(&self.articles);
        let language = self.state.language().clone();
        let known = self.state.known_titles();
        let tx = self.completions_tx.clone();

        self.in_flight += 1;
        self.metrics.inc_counter(keys::GEOSEARCH_REQUESTS, 1);
        debug!(center = %bounds.center(), %language, in_flight = self.in_flight, "starting geosearch");

        tokio::spawn(async move {
            let result = fetcher
                .fetch_new_articles_near(bounds, &language, &known)
                .await;
            let _ = tx.send(Completion::Articles { ticket, result });
        });
    }

    fn on_articles(&mut self, ticket: FetchTicket, result: Result<Vec<Article>, FetchError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let stale = ticket.epoch != self.epoch
            || (self.config.stale_results == StalePolicy::Discard
                && ticket.viewport_seq != self.viewport_seq);
        if stale {
            self.metrics.inc_counter(keys::STALE_RESULTS_DROPPED, 1);
            debug!(
                epoch = ticket.epoch,
                viewport_seq = ticket.viewport_seq,
                current_seq = self.viewport_seq,
                "dropping stale geosearch result"
            );
            return;
        }

        match result {
            Ok(batch) => {
                self.metrics
                    .record_histogram(keys::BATCH_SIZE, batch.len() as u64);
                let outcome = self.state.merge_articles(batch);
                self.metrics
                    .inc_counter(keys::ARTICLES_ADDED, outcome.added as u64);
                self.metrics
                    .inc_counter(keys::SUMMARIES_FILLED, outcome.filled as u64);
                info!(
                    added = outcome.added,
                    filled = outcome.filled,
                    total = self.state.articles().len(),
                    "articles merged"
                );
            }
            Err(err) => {
                self.metrics.inc_counter(keys::FETCH_FAILURES, 1);
                warn!(error = %err, "geosearch failed");
                self.notice(err.kind(), err.to_string());
            }
        }
    }

    fn on_search_query(&mut self, query: String) {
        self.query_seq += 1;
        if !accepts_query(&query) {
            self.state.set_search_query(query);
            self.state.set_suggestions(Vec::new());
            return;
        }

        let fetcher = Arc::clone(&self.suggestions);
        let language = self.state.language().clone();
        let tx = self.completions_tx.clone();
        let (epoch, query_seq) = (self.epoch, self.query_seq);
        self.state.set_search_query(query.clone());
        self.metrics.inc_counter(keys::SUGGEST_REQUESTS, 1);

        tokio::spawn(async move {
            let result = fetcher.suggest(&query, &language).await;
            let _ = tx.send(Completion::Suggestions {
                epoch,
                query_seq,
                result,
            });
        });
    }

    fn on_select_suggestion(&mut self, suggestion: SearchSuggestion) {
        self.query_seq += 1;
        self.state.clear_search();

        let fetcher = Arc::clone(&self.suggestions);
        let language = self.state.language().clone();
        let tx = self.completions_tx.clone();
        let epoch = self.epoch;
        let title = suggestion.title;
        debug!(%title, "resolving suggestion");

        tokio::spawn(async move {
            let result = fetcher.resolve_coordinate(&title, &language).await;
            let _ = tx.send(Completion::Resolved {
                epoch,
                title,
                result,
            });
        });
    }

    fn on_set_language(&mut self, language: LanguageCode) {
        if !self.state.set_language(language) {
            return;
        }
        self.epoch += 1;
        self.query_seq += 1;
        info!(language = %self.state.language(), "language changed; overlay reset");
        if self.latest_bounds.is_some() {
            self.arm_fetch();
        }
    }

    fn recenter(&mut self, center: Coordinate) {
        self.state.recenter(center);
        self.metrics.inc_counter(keys::RECENTERS, 1);
        debug!(%center, revision = self.state.center_revision, "recentered");
    }
}
