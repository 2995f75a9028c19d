use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// The rectangular lat/lon extent currently visible on the map.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl BoundingRegion {
    pub fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        BoundingRegion {
            south_west,
            north_east,
        }
    }

    /// Builds a region of the given angular span centered on `center`,
    /// clamped to valid latitude/longitude ranges.
    pub fn around(center: Coordinate, lat_span: f64, lon_span: f64) -> Self {
        let half_lat = lat_span.abs() / 2.0;
        let half_lon = lon_span.abs() / 2.0;
        BoundingRegion {
            south_west: Coordinate {
                latitude: (center.latitude - half_lat).clamp(-90.0, 90.0),
                longitude: (center.longitude - half_lon).clamp(-180.0, 180.0),
            },
            north_east: Coordinate {
                latitude: (center.latitude + half_lat).clamp(-90.0, 90.0),
                longitude: (center.longitude + half_lon).clamp(-180.0, 180.0),
            },
        }
    }

    /// Query center: mean of the corner latitudes and longitudes.
    pub fn center(&self) -> Coordinate {
        Coordinate::midpoint(self.south_west, self.north_east)
    }

    pub fn lat_span(&self) -> f64 {
        self.north_east.latitude - self.south_west.latitude
    }

    pub fn lon_span(&self) -> f64 {
        self.north_east.longitude - self.south_west.longitude
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.south_west.latitude..=self.north_east.latitude).contains(&c.latitude)
            && (self.south_west.longitude..=self.north_east.longitude).contains(&c.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::BoundingRegion;
    use crate::coord::Coordinate;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn center_of_small_region() {
        let r = BoundingRegion::new(c(40.0, -74.1), c(40.1, -74.0));
        let center = r.center();
        assert!((center.latitude - 40.05).abs() < 1e-9);
        assert!((center.longitude + 74.05).abs() < 1e-9);
        assert!(r.contains(center));
        assert!(!r.contains(c(41.0, -74.05)));
    }

    #[test]
    fn around_clamps_to_world() {
        let r = BoundingRegion::around(c(89.9, 179.9), 1.0, 1.0);
        assert_eq!(r.north_east.latitude, 90.0);
        assert_eq!(r.north_east.longitude, 180.0);
        assert!(r.south_west.is_valid());
    }

    #[test]
    fn serializes_with_snake_case_corners() {
        let r = BoundingRegion::new(c(1.0, 2.0), c(3.0, 4.0));
        let v = serde_json::to_value(r).unwrap();
        assert_eq!(v["south_west"]["latitude"], 1.0);
        assert_eq!(v["north_east"]["longitude"], 4.0);
    }
}
