//! Line-driven interactive session over the full overlay controller.

use foundation::{BoundingRegion, Coordinate, LanguageCode};
use geosearch::AsyncHttpClient;
use overlay::{
    FixedPosition, GeoLocator, MapSurface, OverlayConfig, OverlayHandle, OverlayRenderer,
    OverlaySnapshot, ViewportController,
};
use runtime::Event;
use scraper::Html;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::error::CliError;
use crate::headless::HeadlessMap;

pub const HELP: &str = "\
commands:
  pan S W N E     move the view to a bounding box
  zoom S W N E    zoom the view to a bounding box
  click LAT LON   click on the map
  search TEXT     type into the search box
  pick N          choose suggestion N (as listed by show)
  focus           center on the device location
  lang CODE       switch encyclopedia language
  read TITLE      open an article on the map
  show            print the overlay
  quit            end the session";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Pan(BoundingRegion),
    Zoom(BoundingRegion),
    Click(Coordinate),
    Search(String),
    Pick(usize),
    Focus,
    Lang(LanguageCode),
    Read(String),
    Show,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match word {
            "pan" => Ok(SessionCommand::Pan(parse_region(rest)?)),
            "zoom" => Ok(SessionCommand::Zoom(parse_region(rest)?)),
            "click" => {
                let [lat, lon] = parse_numbers::<2>(rest)?;
                Coordinate::new(lat, lon)
                    .map(SessionCommand::Click)
                    .map_err(|e| e.to_string())
            }
            "search" => Ok(SessionCommand::Search(rest.to_string())),
            "pick" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(SessionCommand::Pick(n)),
                _ => Err(format!("pick expects a suggestion number, got {rest:?}")),
            },
            "focus" => Ok(SessionCommand::Focus),
            "lang" => LanguageCode::new(rest)
                .map(SessionCommand::Lang)
                .map_err(|e| e.to_string()),
            "read" if !rest.is_empty() => Ok(SessionCommand::Read(rest.to_string())),
            "read" => Err("read expects an article title".into()),
            "show" => Ok(SessionCommand::Show),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" => Ok(SessionCommand::Quit),
            other => Err(format!("unknown command {other:?} (try help)")),
        }
    }
}

fn parse_numbers<const N: usize>(text: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != N {
        return Err(format!("expected {N} numbers, got {}", parts.len()));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("{part:?} is not a number"))?;
    }
    Ok(out)
}

fn parse_region(text: &str) -> Result<BoundingRegion, String> {
    let [south, west, north, east] = parse_numbers::<4>(text)?;
    if south > north || west > east {
        return Err("expected S W N E with south <= north and west <= east".into());
    }
    let south_west = Coordinate::new(south, west).map_err(|e| e.to_string())?;
    let north_east = Coordinate::new(north, east).map_err(|e| e.to_string())?;
    Ok(BoundingRegion::new(south_west, north_east))
}

/// Runs the controller against a [`HeadlessMap`], reading commands from
/// stdin until `quit` or end of input.
pub async fn run<C>(
    config: OverlayConfig,
    client: C,
    location: Option<Coordinate>,
) -> Result<(), CliError>
where
    C: AsyncHttpClient + Clone + 'static,
{
    let mut renderer = OverlayRenderer::new(config.recenter_zoom);
    let locator = GeoLocator::new(location.map(FixedPosition))
        .with_timeout(config.location_timeout());
    let (handle, controller) = ViewportController::spawn(config, client);

    let mut map = HeadlessMap::new();
    map.on_viewport_change(handle.listener());
    handle.locate_with(locator);

    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_notice = 0;
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match SessionCommand::parse(&line) {
                    Ok(SessionCommand::Quit) => break,
                    Ok(command) => execute(command, &handle, &mut map)?,
                    Err(msg) => println!("? {msg}"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                renderer.apply(&snapshot.state, &mut map);
                for line in fresh_notices(&snapshot.notices, &mut last_notice) {
                    println!("{line}");
                }
            }
        }
    }

    if handle.shutdown().is_err() {
        debug!("controller already stopped");
    }
    let state = controller
        .await
        .map_err(|e| CliError::Task(e.to_string()))?;
    info!(articles = state.articles().len(), "session ended");
    Ok(())
}

fn execute(
    command: SessionCommand,
    handle: &OverlayHandle,
    map: &mut HeadlessMap,
) -> Result<(), CliError> {
    debug!(?command, "session command");
    match command {
        SessionCommand::Pan(bounds) => map.pan(bounds),
        SessionCommand::Zoom(bounds) => map.zoom_to(bounds),
        SessionCommand::Click(at) => map.click(at),
        SessionCommand::Search(text) => handle.set_search_query(text)?,
        SessionCommand::Pick(n) => {
            let snapshot = handle.snapshot();
            match snapshot.state.search_suggestions().get(n - 1) {
                Some(suggestion) => handle.select_suggestion(suggestion.clone())?,
                None => println!("? no suggestion {n}"),
            }
        }
        SessionCommand::Focus => handle.focus_user_location()?,
        SessionCommand::Lang(language) => {
            if !language.has_ui_translation() {
                println!("(no UI translation for {language}; articles still load)");
            }
            handle.set_language(language)?;
        }
        SessionCommand::Read(title) => {
            if let Some(article) = handle.snapshot().state.article(&title) {
                println!("{}", render_summary(&article.summary_html));
            }
            handle.select_article(title)?;
        }
        SessionCommand::Show => print!("{}", describe(&handle.snapshot(), map)),
        SessionCommand::Help => println!("{HELP}"),
        SessionCommand::Quit => {}
    }
    Ok(())
}

/// Notices at or past `next`, formatted for the terminal. Advances `next`
/// past the newest one so each notice prints once.
fn fresh_notices(notices: &[Event], next: &mut u64) -> Vec<String> {
    let from = *next;
    let mut lines = Vec::new();
    for notice in notices.iter().filter(|n| n.seq >= from) {
        lines.push(format!("! {}: {}", notice.kind, notice.message));
        *next = notice.seq + 1;
    }
    lines
}

/// Plain text of a summary's HTML, whitespace collapsed, for the terminal.
fn render_summary(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return "(no summary available)".to_string();
    }
    words.join(" ")
}

fn describe(snapshot: &OverlaySnapshot, map: &HeadlessMap) -> String {
    let state = &snapshot.state;
    let mut out = format!("phase: {:?}  language: {}\n", snapshot.phase, state.language());
    if let Some(center) = state.center_coordinate {
        out.push_str(&format!("center: {center}\n"));
    }
    if let Some(me) = state.user_location {
        out.push_str(&format!("you: {me}\n"));
    }
    if let Some(bounds) = map.current_bounds() {
        out.push_str(&format!("view: {} .. {}\n", bounds.south_west, bounds.north_east));
    }
    out.push_str(&format!(
        "articles: {} ({} markers)\n",
        state.articles().len(),
        map.markers().len()
    ));
    for article in state.articles() {
        let marker = if state.selected_article.as_deref() == Some(article.title.as_str()) {
            '*'
        } else {
            '-'
        };
        out.push_str(&format!("  {marker} {} @ {}\n", article.title, article.location));
    }
    if !state.search_query.is_empty() {
        out.push_str(&format!("search: {:?}\n", state.search_query));
    }
    for (i, s) in state.search_suggestions().iter().enumerate() {
        out.push_str(&format!("  {}. {} {}\n", i + 1, s.title, s.description));
    }
    out
}
