//! One-shot search commands: `view`, `nationwide` and `locate`.

use std::sync::Arc;

use mmdir_core::{AppConfig, BoundingBox, PlaceFilter};
use mmdir_nominatim::NominatimClient;
use mmdir_overpass::{OverpassClient, QueryBuilder};
use mmdir_search::{ErrorKind, MapView, SearchSession, SessionConfig, Viewport};

use crate::map::{fit_zoom, StaticMap};
use crate::output::{print_nationwide_outcome, print_view_outcome, OutputFormat};

/// Starting view for commands that do not take one.
pub(crate) const MYANMAR: BoundingBox = BoundingBox::new(9.6, 92.2, 28.5, 101.2);

/// Build a session wired to the configured endpoints.
///
/// Override records are best-effort: a missing or malformed file is logged
/// and the session runs without them.
///
/// # Errors
///
/// Returns an error if an endpoint URL in the configuration is invalid.
pub(crate) fn build_session(
    config: &AppConfig,
    map: Arc<dyn MapView>,
) -> anyhow::Result<SearchSession> {
    let overpass = OverpassClient::from_app_config(config)?;
    let geocoder = NominatimClient::from_app_config(config)?;
    let builder = QueryBuilder::from_app_config(config);
    let session = SearchSession::new(
        overpass,
        geocoder,
        builder,
        map,
        SessionConfig::from_app_config(config),
    );

    let Some(path) = config.overrides_path.as_deref() else {
        return Ok(session);
    };
    match mmdir_core::load_overrides(path) {
        Ok(overrides) => {
            tracing::info!(count = overrides.len(), "loaded place overrides");
            Ok(session.with_overrides(overrides))
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring place overrides");
            Ok(session)
        }
    }
}

/// Search one explicit viewport.
///
/// # Errors
///
/// Returns an error if the session cannot be built or the query fails with
/// no earlier results to fall back to.
pub(crate) async fn run_view(
    config: &AppConfig,
    viewport: Viewport,
    name: Option<&str>,
    filter: &PlaceFilter,
    format: OutputFormat,
    nationwide_on_empty: bool,
) -> anyhow::Result<()> {
    let map = Arc::new(StaticMap::new(viewport));
    let session = build_session(config, map)?;

    let outcome = session.search_view(viewport, name).await;
    let fallback = if nationwide_on_empty {
        session.fallback(&outcome, name).await
    } else {
        None
    };

    match fallback {
        Some(nationwide) => {
            eprintln!("nothing in this view; searching all of Myanmar");
            print_nationwide_outcome(nationwide, filter, format)
        }
        None => print_view_outcome(outcome, filter, format, config.min_zoom),
    }
}

/// Search the whole country by name.
///
/// # Errors
///
/// Returns an error if the session cannot be built or the query fails.
pub(crate) async fn run_nationwide(
    config: &AppConfig,
    name: &str,
    filter: &PlaceFilter,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let map = Arc::new(StaticMap::new(Viewport::new(MYANMAR, fit_zoom(&MYANMAR))));
    let session = build_session(config, map)?;

    let outcome = session.search_nationwide(name).await;
    print_nationwide_outcome(outcome, filter, format)
}

/// Geocode a place and search the area around it.
///
/// # Errors
///
/// Returns an error if the session cannot be built, the geocoder fails for a
/// reason other than "not found", or the Overpass query fails.
pub(crate) async fn run_locate(
    config: &AppConfig,
    place: &str,
    zoom: Option<u8>,
    name: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let map = Arc::new(StaticMap::new(Viewport::new(MYANMAR, fit_zoom(&MYANMAR))));
    let session = build_session(config, Arc::clone(&map) as Arc<dyn MapView>)?;

    let outcome = match session.locate(place, zoom, name).await {
        Ok(outcome) => outcome,
        Err(e) if e.kind() == ErrorKind::GeocodeNotFound => {
            eprintln!("place '{place}' not found");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let shown = map.viewport();
    eprintln!(
        "showing {:.4},{:.4} to {:.4},{:.4} at zoom {}",
        shown.bounds.south,
        shown.bounds.west,
        shown.bounds.north,
        shown.bounds.east,
        zoom.unwrap_or(shown.zoom)
    );
    print_view_outcome(outcome, &PlaceFilter::default(), format, config.min_zoom)
}
