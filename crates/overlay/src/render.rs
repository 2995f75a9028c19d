use foundation::Coordinate;
use tracing::trace;

use crate::state::MapOverlayState;
use crate::surface::{MapSurface, Marker};

/// What one [`OverlayRenderer::apply`] call changed on the surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub recentered: bool,
    /// Number of markers drawn, or `None` if markers were left as they were.
    pub markers: Option<usize>,
}

/// Projects [`MapOverlayState`] onto a [`MapSurface`].
///
/// Only parts whose revision moved since the previous call are redrawn, so
/// applying the same state twice is a no-op.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    recenter_zoom: u8,
    center_revision: u64,
    articles_revision: Option<u64>,
    user_location: Option<Coordinate>,
}

impl OverlayRenderer {
    pub fn new(recenter_zoom: u8) -> Self {
        Self {
            recenter_zoom,
            center_revision: 0,
            articles_revision: None,
            user_location: None,
        }
    }

    pub fn apply(&mut self, state: &MapOverlayState, surface: &mut impl MapSurface) -> RenderOutcome {
        let mut outcome = RenderOutcome::default();

        if state.center_revision != self.center_revision {
            self.center_revision = state.center_revision;
            if let Some(center) = state.center_coordinate {
                surface.set_center(center, self.recenter_zoom);
                outcome.recentered = true;
            }
        }

        let markers_stale = self.articles_revision != Some(state.articles_revision)
            || self.user_location != state.user_location;
        if markers_stale {
            self.articles_revision = Some(state.articles_revision);
            self.user_location = state.user_location;
            surface.clear_markers();
            let mut drawn = 0;
            for article in state.articles() {
                surface.place_marker(
                    article.location,
                    Marker::Article {
                        title: article.title.clone(),
                    },
                );
                drawn += 1;
            }
            if let Some(me) = state.user_location {
                surface.place_marker(me, Marker::UserLocation);
                drawn += 1;
            }
            outcome.markers = Some(drawn);
        }

        trace!(?outcome, "overlay rendered");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use foundation::{BoundingRegion, Coordinate};
    use geosearch::Article;
    use pretty_assertions::assert_eq;

    use super::{OverlayRenderer, RenderOutcome};
    use crate::state::MapOverlayState;
    use crate::surface::{MapSurface, Marker, ViewportListener};

    #[derive(Default)]
    struct Recording {
        centers: Vec<(Coordinate, u8)>,
        markers: Vec<(Coordinate, Marker)>,
        clears: usize,
    }

    impl MapSurface for Recording {
        fn on_viewport_change(&mut self, _listener: ViewportListener) {}

        fn current_bounds(&self) -> Option<BoundingRegion> {
            None
        }

        fn set_center(&mut self, center: Coordinate, zoom: u8) {
            self.centers.push((center, zoom));
        }

        fn place_marker(&mut self, at: Coordinate, marker: Marker) {
            self.markers.push((at, marker));
        }

        fn clear_markers(&mut self) {
            self.clears += 1;
            self.markers.clear();
        }
    }

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn draws_articles_and_user_marker() {
        let mut state = MapOverlayState::default();
        state.user_location = Some(c(1.0, 1.0));
        state.merge_articles(vec![Article::new("A", c(1.1, 1.1))]);
        state.recenter(c(1.0, 1.0));

        let mut surface = Recording::default();
        let mut renderer = OverlayRenderer::new(13);
        let out = renderer.apply(&state, &mut surface);

        assert_eq!(out, RenderOutcome { recentered: true, markers: Some(2) });
        assert_eq!(surface.centers, vec![(c(1.0, 1.0), 13)]);
        assert_eq!(
            surface.markers,
            vec![
                (c(1.1, 1.1), Marker::Article { title: "A".into() }),
                (c(1.0, 1.0), Marker::UserLocation),
            ]
        );
    }

    #[test]
    fn unchanged_state_draws_nothing() {
        let mut state = MapOverlayState::default();
        state.merge_articles(vec![Article::new("A", c(1.1, 1.1))]);
        let mut surface = Recording::default();
        let mut renderer = OverlayRenderer::new(13);
        renderer.apply(&state, &mut surface);

        assert_eq!(renderer.apply(&state, &mut surface), RenderOutcome::default());
        assert_eq!(surface.clears, 1);

        state.merge_articles(vec![Article::new("B", c(1.2, 1.2))]);
        let out = renderer.apply(&state, &mut surface);
        assert_eq!(out.markers, Some(2));
        assert!(!out.recentered);
    }

    #[test]
    fn recenters_again_on_same_coordinate() {
        let mut state = MapOverlayState::default();
        let mut surface = Recording::default();
        let mut renderer = OverlayRenderer::new(13);
        state.recenter(c(5.0, 5.0));
        renderer.apply(&state, &mut surface);
        state.recenter(c(5.0, 5.0));
        assert!(renderer.apply(&state, &mut surface).recentered);
        assert_eq!(surface.centers.len(), 2);
    }
}
