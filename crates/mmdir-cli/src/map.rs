//! A map with no widget behind it, driven from the command line.

use std::sync::{Mutex, PoisonError};

use mmdir_core::BoundingBox;
use mmdir_search::{MapView, Viewport};

/// Highest zoom the fit heuristic will pick.
const MAX_FIT_ZOOM: u8 = 18;

/// Holds the current viewport; `fit_bounds` replaces it.
#[derive(Debug)]
pub(crate) struct StaticMap {
    viewport: Mutex<Viewport>,
}

impl StaticMap {
    pub(crate) fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Mutex::new(viewport),
        }
    }

    pub(crate) fn set(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }
}

impl MapView for StaticMap {
    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fit_bounds(&self, bounds: BoundingBox) {
        tracing::debug!(?bounds, "fitting map");
        self.set(Viewport::new(bounds, fit_zoom(&bounds)));
    }
}

/// Web-mercator zoom at which the wider side of `bounds` spans one 256 px tile.
pub(crate) fn fit_zoom(bounds: &BoundingBox) -> u8 {
    let span = (bounds.east - bounds.west)
        .abs()
        .max((bounds.north - bounds.south).abs());
    if span <= 0.0 || !span.is_finite() {
        return MAX_FIT_ZOOM;
    }
    let zoom = (360.0 / span).log2().floor().clamp(0.0, f64::from(MAX_FIT_ZOOM));
    // Clamped to 0..=18 above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zoom = zoom as u8;
    zoom
}
