//! Mutable orchestration state owned by one [`crate::SearchSession`].
//!
//! The rate-limit cooldown and endpoint cursor live in the Overpass client;
//! everything else the orchestration layer remembers between settles is here.

use mmdir_core::{LatLng, PlaceRecord};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct QueryState {
    /// Center and zoom of the last network query actually issued.
    pub last_query: Option<(LatLng, u8)>,
    /// Most recent non-empty result set, shown when a later query fails.
    pub last_good: Vec<PlaceRecord>,
    /// Whatever was last handed to the renderer, empty or not.
    pub last_rendered: Option<Vec<PlaceRecord>>,
    /// Settles before this instant are echoes of our own fit and are ignored.
    pub suppress_until: Option<Instant>,
    inflight: Option<(u64, CancellationToken)>,
    generation: u64,
}

impl QueryState {
    /// Cancels the outstanding request, if any, and registers a new one.
    ///
    /// Returns the new request's generation and token.
    pub fn begin_request(&mut self) -> (u64, CancellationToken) {
        self.cancel_inflight();
        self.generation += 1;
        let token = CancellationToken::new();
        self.inflight = Some((self.generation, token.clone()));
        (self.generation, token)
    }

    /// Clears the in-flight slot if it still belongs to `generation`.
    pub fn finish_request(&mut self, generation: u64) {
        if self.inflight.as_ref().is_some_and(|(g, _)| *g == generation) {
            self.inflight = None;
        }
    }

    pub fn cancel_inflight(&mut self) {
        if let Some((generation, token)) = self.inflight.take() {
            tracing::debug!(generation, "cancelling in-flight query");
            token.cancel();
        }
    }

    #[must_use]
    pub fn has_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    #[must_use]
    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppress_until.is_some_and(|until| now < until)
    }

    /// Records a successfully applied result set.
    pub fn apply_results(&mut self, records: &[PlaceRecord]) {
        if !records.is_empty() {
            self.last_good = records.to_vec();
        }
        self.last_rendered = Some(records.to_vec());
    }
}
