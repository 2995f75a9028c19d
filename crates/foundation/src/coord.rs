use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// A WGS84 position in decimal degrees.
///
/// Invariant: `latitude` is in [-90, 90] and `longitude` in [-180, 180].
/// Use [`Coordinate::new`] to construct a validated value; deserializing
/// goes through the same check.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    Parse(String),
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateError::LatitudeOutOfRange(v) => {
                write!(f, "latitude {v} outside [-90, 90]")
            }
            CoordinateError::LongitudeOutOfRange(v) => {
                write!(f, "longitude {v} outside [-180, 180]")
            }
            CoordinateError::Parse(msg) => write!(f, "invalid coordinate: {msg}"),
        }
    }
}

impl std::error::Error for CoordinateError {}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.latitude, self.longitude).is_ok()
    }

    /// Arithmetic midpoint of two positions (mean latitude, mean longitude).
    ///
    /// This is not the geodesic midpoint; it matches how a screen-aligned
    /// viewport is centered.
    pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
        Coordinate {
            latitude: (a.latitude + b.latitude) / 2.0,
            longitude: (a.longitude + b.longitude) / 2.0,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lon"` (whitespace around either number is ignored).
impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordinateError::Parse(format!("expected LAT,LON, got {s:?}")))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Parse(format!("bad latitude {lat:?}")))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Parse(format!("bad longitude {lon:?}")))?;
        Coordinate::new(lat, lon)
    }
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCoordinate::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}
