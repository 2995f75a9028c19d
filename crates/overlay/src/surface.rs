use foundation::{BoundingRegion, Coordinate};

/// Something the user did to the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    Moved(BoundingRegion),
    Zoomed(BoundingRegion),
    Clicked(Coordinate),
}

impl ViewportEvent {
    /// The visible region after the event, for move and zoom.
    pub fn bounds(&self) -> Option<BoundingRegion> {
        match self {
            ViewportEvent::Moved(b) | ViewportEvent::Zoomed(b) => Some(*b),
            ViewportEvent::Clicked(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    UserLocation,
    Article { title: String },
}

pub type ViewportListener = Box<dyn FnMut(ViewportEvent) + Send>;

/// The interactive map the overlay draws on.
///
/// Implementations report viewport changes to the registered listener,
/// including changes caused by [`MapSurface::set_center`].
pub trait MapSurface {
    fn on_viewport_change(&mut self, listener: ViewportListener);
    fn current_bounds(&self) -> Option<BoundingRegion>;
    fn set_center(&mut self, center: Coordinate, zoom: u8);
    fn place_marker(&mut self, at: Coordinate, marker: Marker);
    fn clear_markers(&mut self);
}

#[cfg(test)]
mod tests {
    use foundation::{BoundingRegion, Coordinate};

    use super::ViewportEvent;

    #[test]
    fn click_has_no_bounds() {
        let c = Coordinate::new(1.0, 1.0).unwrap();
        let b = BoundingRegion::around(c, 0.2, 0.2);
        assert_eq!(ViewportEvent::Zoomed(b).bounds(), Some(b));
        assert_eq!(ViewportEvent::Clicked(c).bounds(), None);
    }
}
