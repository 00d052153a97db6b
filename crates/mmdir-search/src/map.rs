//! The seam to the interactive map widget.

use mmdir_core::{BoundingBox, LatLng};

/// What the map currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: BoundingBox,
    pub zoom: u8,
}

impl Viewport {
    #[must_use]
    pub const fn new(bounds: BoundingBox, zoom: u8) -> Self {
        Self { bounds, zoom }
    }

    #[must_use]
    pub fn center(&self) -> LatLng {
        self.bounds.center()
    }
}

/// Minimal view of a pan/zoom map.
///
/// The orchestration layer reads the current viewport and may ask the map to
/// fit a region; it never renders markers itself. Implementations emit their
/// own "view settled" events, including after a fit.
pub trait MapView: Send + Sync {
    fn viewport(&self) -> Viewport;

    fn fit_bounds(&self, bounds: BoundingBox);
}
