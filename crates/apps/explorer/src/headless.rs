use foundation::{BoundingRegion, Coordinate};
use overlay::{MapSurface, Marker, ViewportEvent, ViewportListener};
use tracing::trace;

/// Tiles across the visible width when the view is set by center and zoom.
const VIEW_TILES: f64 = 4.0;

/// A map without pixels: tracks bounds and markers and reports viewport
/// changes the way an interactive map would.
#[derive(Default)]
pub struct HeadlessMap {
    bounds: Option<BoundingRegion>,
    listener: Option<ViewportListener>,
    markers: Vec<(Coordinate, Marker)>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pan(&mut self, bounds: BoundingRegion) {
        self.bounds = Some(bounds);
        self.emit(ViewportEvent::Moved(bounds));
    }

    pub fn zoom_to(&mut self, bounds: BoundingRegion) {
        self.bounds = Some(bounds);
        self.emit(ViewportEvent::Zoomed(bounds));
    }

    pub fn click(&mut self, at: Coordinate) {
        self.emit(ViewportEvent::Clicked(at));
    }

    pub fn markers(&self) -> &[(Coordinate, Marker)] {
        &self.markers
    }

    fn emit(&mut self, event: ViewportEvent) {
        trace!(?event, "viewport event");
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

/// Visible extent for `center` at `zoom`, web-mercator style: the width
/// halves with every zoom level.
pub fn view_at(center: Coordinate, zoom: u8) -> BoundingRegion {
    let lon_span = VIEW_TILES * 360.0 / f64::from(1u32 << zoom.min(24));
    BoundingRegion::around(center, lon_span / 2.0, lon_span)
}

impl MapSurface for HeadlessMap {
    fn on_viewport_change(&mut self, listener: ViewportListener) {
        self.listener = Some(listener);
    }

    fn current_bounds(&self) -> Option<BoundingRegion> {
        self.bounds
    }

    /// Moves the view and reports it as a move, like a map's `moveend`.
    fn set_center(&mut self, center: Coordinate, zoom: u8) {
        self.pan(view_at(center, zoom));
    }

    fn place_marker(&mut self, at: Coordinate, marker: Marker) {
        self.markers.push((at, marker));
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use foundation::{BoundingRegion, Coordinate};
    use overlay::{MapSurface, Marker, ViewportEvent};

    use super::{HeadlessMap, view_at};

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn set_center_reports_a_move_around_center() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut map = HeadlessMap::new();
        map.on_viewport_change(Box::new(move |e| sink.lock().unwrap().push(e)));

        map.set_center(c(48.0, 2.0), 13);
        map.click(c(48.0, 2.0));

        let events = seen.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        let bounds = map.current_bounds().unwrap();
        assert_eq!(events[0], ViewportEvent::Moved(bounds));
        assert!(bounds.contains(c(48.0, 2.0)));
        assert!((bounds.center().latitude - 48.0).abs() < 1e-9);
        assert_eq!(events[1], ViewportEvent::Clicked(c(48.0, 2.0)));
    }

    #[test]
    fn higher_zoom_shows_less() {
        let wide = view_at(c(0.0, 0.0), 3);
        let close = view_at(c(0.0, 0.0), 13);
        assert!(close.lon_span() < wide.lon_span());
        assert!((wide.lon_span() / close.lon_span() - 1024.0).abs() < 1e-6);
    }

    #[test]
    fn markers_replace_on_clear() {
        let mut map = HeadlessMap::new();
        map.place_marker(c(1.0, 1.0), Marker::UserLocation);
        map.clear_markers();
        map.place_marker(c(2.0, 2.0), Marker::Article { title: "A".into() });
        assert_eq!(map.markers().len(), 1);
        let region = BoundingRegion::new(c(0.0, 0.0), c(1.0, 1.0));
        map.zoom_to(region);
        assert_eq!(map.current_bounds(), Some(region));
    }
}
