//! Decides whether a settled viewport warrants a network query.

use mmdir_core::{AppConfig, LatLng};

use crate::map::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDecision {
    /// Below the minimum zoom: show a "zoom in" hint and clear markers.
    ZoomTooLow,
    /// Barely moved at the same zoom: re-render the last result set.
    ReuseLast,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planner {
    pub min_zoom: u8,
    /// Great-circle distance under which a pan at unchanged zoom is ignored.
    pub min_move_meters: f64,
}

impl Default for Planner {
    fn default() -> Self {
        Self {
            min_zoom: 11,
            min_move_meters: 600.0,
        }
    }
}

impl Planner {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_zoom: config.min_zoom,
            min_move_meters: config.min_move_meters,
        }
    }

    /// `last_query` is the center and zoom of the last network query that
    /// was actually issued; `has_rendered` whether a non-empty result set
    /// exists to reuse. An empty view is always queried again.
    #[must_use]
    pub fn decide(
        &self,
        viewport: &Viewport,
        last_query: Option<(LatLng, u8)>,
        has_rendered: bool,
    ) -> PlanDecision {
        if viewport.zoom < self.min_zoom {
            return PlanDecision::ZoomTooLow;
        }
        let Some((last_center, last_zoom)) = last_query else {
            return PlanDecision::Query;
        };
        let moved = viewport.center().distance_m(&last_center);
        tracing::debug!(moved_m = moved, zoom = viewport.zoom, last_zoom, "planning viewport query");
        if has_rendered && last_zoom == viewport.zoom && moved < self.min_move_meters {
            PlanDecision::ReuseLast
        } else {
            PlanDecision::Query
        }
    }
}
