//! Coordinates and bounding boxes in WGS84 decimal degrees.
//!
//! Distances use the haversine formula from the `geo` crate, which is accurate
//! well below the few-hundred-metre thresholds the planner works with.

use geo::{BoundingRect, HaversineDistance, MultiPoint, Point};
use serde::{Deserialize, Serialize};

/// Decimal places kept when deriving a cache key from a bounding box.
pub const CACHE_KEY_PRECISION: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        Point::from(*self).haversine_distance(&Point::from(*other))
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Point::new(value.lon, value.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// A square box extending `radius_deg` in every direction from `center`.
    #[must_use]
    pub fn around(center: LatLng, radius_deg: f64) -> Self {
        Self::new(
            center.lat - radius_deg,
            center.lon - radius_deg,
            center.lat + radius_deg,
            center.lon + radius_deg,
        )
    }

    /// Smallest box containing every point, or `None` for an empty input.
    #[must_use]
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let multi: MultiPoint<f64> = points.iter().copied().map(Point::from).collect();
        multi
            .bounding_rect()
            .map(|r| Self::new(r.min().y, r.min().x, r.max().y, r.max().x))
    }

    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    #[must_use]
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }

    /// Grows the box by `ratio` of its height and width on each side.
    #[must_use]
    pub fn pad(&self, ratio: f64) -> Self {
        let dlat = (self.north - self.south) * ratio;
        let dlon = (self.east - self.west) * ratio;
        Self::new(
            self.south - dlat,
            self.west - dlon,
            self.north + dlat,
            self.east + dlon,
        )
    }

    /// `south,west,north,east` as Overpass QL expects it.
    #[must_use]
    pub fn to_overpass(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }

    /// Cache slot for this box: each edge rounded to two decimal degrees.
    ///
    /// Viewports that differ only by sub-kilometre jitter share a key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        [self.south, self.west, self.north, self.east]
            .iter()
            .map(|edge| format!("{edge:.prec$}", prec = CACHE_KEY_PRECISION))
            .collect::<Vec<_>>()
            .join(",")
    }
}
