//! The per-map orchestration context.
//!
//! One [`SearchSession`] is built per map and shared behind an `Arc`. Locks
//! are never held across an await; every network result is checked against
//! its cancellation token under the state lock before it touches shared state,
//! so a superseded query can never overwrite a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mmdir_core::{AppConfig, BoundingBox, PlaceRecord};
use mmdir_nominatim::NominatimClient;
use mmdir_overpass::{
    merge_overrides, normalize_elements, OverpassClient, OverpassError, QueryBuilder,
};
use tokio::time::Instant;

use crate::cache::ViewportCache;
use crate::error::SearchError;
use crate::map::{MapView, Viewport};
use crate::planner::{PlanDecision, Planner};
use crate::state::QueryState;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub planner: Planner,
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub nationwide_limit: usize,
    /// Fraction of height and width added on each side when fitting results.
    pub fit_padding: f64,
    /// How long settles are ignored after the session asks the map to fit.
    pub fit_suppression: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            planner: Planner::default(),
            debounce: Duration::from_millis(1_600),
            cache_ttl: Duration::from_secs(180),
            cache_capacity: 256,
            nationwide_limit: 250,
            fit_padding: 0.2,
            fit_suppression: Duration::from_millis(700),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            planner: Planner::from_app_config(config),
            debounce: Duration::from_millis(config.debounce_ms),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            cache_capacity: config.cache_capacity,
            nationwide_limit: config.nationwide_limit,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Network,
    Cache,
    /// The view barely moved; the last rendered set is shown again.
    Reused,
}

/// What the renderer should show after a settle.
#[derive(Debug)]
pub enum ViewOutcome {
    /// Zoomed out too far: clear markers and show a hint.
    ZoomIn,
    /// Echo of the session's own fit; nothing to do.
    Suppressed,
    Results {
        records: Vec<PlaceRecord>,
        source: ResultSource,
    },
    /// No matches. With a name filter set, offer the nationwide search.
    Empty { offer_nationwide: bool },
    /// The query failed; showing the last good results with a notice.
    Stale {
        records: Vec<PlaceRecord>,
        error: SearchError,
    },
    /// The query failed and there is nothing to fall back to.
    Failed(SearchError),
    /// A newer query took over. Never shown to the user.
    Superseded,
}

#[derive(Debug)]
pub enum NationwideOutcome {
    Found {
        records: Vec<PlaceRecord>,
        /// Padded extent the map was asked to fit, if any record has coordinates.
        fitted: Option<BoundingBox>,
    },
    NoMatches,
    Failed(SearchError),
    Superseded,
}

pub struct SearchSession {
    overpass: OverpassClient,
    geocoder: NominatimClient,
    builder: QueryBuilder,
    map: Arc<dyn MapView>,
    overrides: Vec<PlaceRecord>,
    config: SessionConfig,
    state: Mutex<QueryState>,
    cache: Mutex<ViewportCache>,
}

fn blank_to_none(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|n| !n.is_empty())
}

fn present(records: Vec<PlaceRecord>, source: ResultSource, name: Option<&str>) -> ViewOutcome {
    if records.is_empty() {
        ViewOutcome::Empty {
            offer_nationwide: name.is_some(),
        }
    } else {
        ViewOutcome::Results { records, source }
    }
}

impl SearchSession {
    #[must_use]
    pub fn new(
        overpass: OverpassClient,
        geocoder: NominatimClient,
        builder: QueryBuilder,
        map: Arc<dyn MapView>,
        config: SessionConfig,
    ) -> Self {
        let cache = ViewportCache::new(config.cache_capacity, config.cache_ttl);
        Self {
            overpass,
            geocoder,
            builder,
            map,
            overrides: Vec::new(),
            config,
            state: Mutex::new(QueryState::default()),
            cache: Mutex::new(cache),
        }
    }

    /// Curated records merged ahead of network results inside each viewport.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Vec<PlaceRecord>) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn last_good(&self) -> Vec<PlaceRecord> {
        self.lock_state().last_good.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cache(&self) -> MutexGuard<'_, ViewportCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles a (debounced) "view settled" event from the map.
    pub async fn on_view_settled(&self, name: Option<&str>) -> ViewOutcome {
        if self.lock_state().is_suppressed(Instant::now()) {
            tracing::debug!("ignoring settle caused by our own fit");
            return ViewOutcome::Suppressed;
        }
        self.search_view(self.map.viewport(), name).await
    }

    /// Runs the viewport pipeline: planner, cache, then network.
    pub async fn search_view(&self, viewport: Viewport, name: Option<&str>) -> ViewOutcome {
        let name = blank_to_none(name);

        let decision = {
            let state = self.lock_state();
            self.config.planner.decide(
                &viewport,
                state.last_query,
                state.last_rendered.as_ref().is_some_and(|r| !r.is_empty()),
            )
        };

        match decision {
            PlanDecision::ZoomTooLow => {
                let mut state = self.lock_state();
                state.cancel_inflight();
                state.last_rendered = None;
                return ViewOutcome::ZoomIn;
            }
            PlanDecision::ReuseLast => {
                let records = self.lock_state().last_rendered.clone().unwrap_or_default();
                tracing::debug!(count = records.len(), "view barely moved; reusing results");
                return present(records, ResultSource::Reused, name);
            }
            PlanDecision::Query => {}
        }

        let key = viewport.bounds.cache_key();
        let cached = self.lock_cache().get_fresh(&key, Instant::now());
        if let Some(records) = cached {
            tracing::debug!(%key, count = records.len(), "viewport cache hit");
            let mut state = self.lock_state();
            state.cancel_inflight();
            state.last_rendered = Some(records.clone());
            return present(records, ResultSource::Cache, name);
        }

        let (generation, token) = {
            let mut state = self.lock_state();
            state.last_query = Some((viewport.center(), viewport.zoom));
            state.begin_request()
        };

        let query = self.builder.viewport_query(&viewport.bounds, name);
        let result = self.overpass.fetch(&query, &token).await;

        let mut state = self.lock_state();
        if token.is_cancelled() {
            tracing::info!(generation, "viewport query superseded");
            return ViewOutcome::Superseded;
        }
        state.finish_request(generation);

        match result {
            Ok(response) => {
                let records = merge_overrides(
                    &self.overrides,
                    &viewport.bounds,
                    normalize_elements(&response.elements),
                );
                state.apply_results(&records);
                drop(state);
                self.lock_cache()
                    .insert(key, records.clone(), Instant::now());
                tracing::debug!(count = records.len(), "viewport query succeeded");
                present(records, ResultSource::Network, name)
            }
            Err(OverpassError::Superseded) => ViewOutcome::Superseded,
            Err(err) => {
                let error = SearchError::from(err);
                if state.last_good.is_empty() {
                    tracing::warn!(error = %error, "viewport query failed");
                    ViewOutcome::Failed(error)
                } else {
                    tracing::warn!(error = %error, "viewport query failed; showing last results");
                    let records = state.last_good.clone();
                    state.last_rendered = Some(records.clone());
                    ViewOutcome::Stale { records, error }
                }
            }
        }
    }

    /// Country-wide search by name, ignoring the viewport.
    ///
    /// Only runs on explicit request. On a non-empty result the map is asked
    /// to fit every returned coordinate.
    pub async fn search_nationwide(&self, name: &str) -> NationwideOutcome {
        let Some(query) = self.builder.nationwide_query(name) else {
            return NationwideOutcome::NoMatches;
        };

        let (generation, token) = self.lock_state().begin_request();
        let result = self.overpass.fetch(&query, &token).await;

        let records = {
            let mut state = self.lock_state();
            if token.is_cancelled() {
                tracing::info!(generation, "nationwide query superseded");
                return NationwideOutcome::Superseded;
            }
            state.finish_request(generation);

            let mut records = match result {
                Ok(response) => normalize_elements(&response.elements),
                Err(OverpassError::Superseded) => return NationwideOutcome::Superseded,
                Err(err) => {
                    let error = SearchError::from(err);
                    tracing::warn!(error = %error, "nationwide query failed");
                    return NationwideOutcome::Failed(error);
                }
            };
            records.truncate(self.config.nationwide_limit);
            state.apply_results(&records);
            records
        };

        if records.is_empty() {
            tracing::debug!(name, "nationwide search found nothing");
            return NationwideOutcome::NoMatches;
        }

        let points: Vec<_> = records.iter().filter_map(PlaceRecord::position).collect();
        let fitted = BoundingBox::from_points(&points).map(|b| b.pad(self.config.fit_padding));
        if let Some(bounds) = fitted {
            self.fit(bounds);
        }
        tracing::debug!(count = records.len(), "nationwide search succeeded");
        NationwideOutcome::Found { records, fitted }
    }

    /// Geocodes `place`, fits the map to it and searches the resulting view.
    ///
    /// With `zoom` unset the map's own zoom after the fit is used.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Geocode`] when the place cannot be resolved;
    /// see [`SearchError::kind`] to tell "not found" from transport failures.
    pub async fn locate(
        &self,
        place: &str,
        zoom: Option<u8>,
        name: Option<&str>,
    ) -> Result<ViewOutcome, SearchError> {
        let bounds = self.geocoder.geocode_bbox(place).await?;
        self.fit(bounds);
        let viewport = match zoom {
            Some(zoom) => Viewport::new(bounds, zoom),
            None => self.map.viewport(),
        };
        Ok(self.search_view(viewport, name).await)
    }

    /// Nationwide search when a viewport search came back empty while a name
    /// filter was set; `None` otherwise.
    pub async fn fallback(
        &self,
        outcome: &ViewOutcome,
        name: Option<&str>,
    ) -> Option<NationwideOutcome> {
        match (outcome, blank_to_none(name)) {
            (
                ViewOutcome::Empty {
                    offer_nationwide: true,
                },
                Some(name),
            ) => Some(self.search_nationwide(name).await),
            _ => None,
        }
    }

    fn fit(&self, bounds: BoundingBox) {
        self.lock_state().suppress_until = Some(Instant::now() + self.config.fit_suppression);
        self.map.fit_bounds(bounds);
    }
}
