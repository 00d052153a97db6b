//! Integration tests for `SearchSession` against wiremock Overpass and
//! Nominatim servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mmdir_core::{BoundingBox, PlaceRecord};
use mmdir_nominatim::NominatimClient;
use mmdir_overpass::{BackoffPolicy, OverpassClient, QueryBuilder};
use mmdir_search::{
    run_settle_loop, ErrorKind, MapView, NationwideOutcome, ResultSource, SearchSession,
    SessionConfig, ViewOutcome, Viewport,
};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches Overpass requests whose `data` query contains a fragment.
struct DataContains(&'static str);

impl Match for DataContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .url
            .query_pairs()
            .any(|(k, v)| k == "data" && v.contains(self.0))
    }
}

const NATIONWIDE: DataContains = DataContains(r#"area["ISO3166-1"="MM"]"#);

struct RecordingMap {
    viewport: Mutex<Viewport>,
    fits: Mutex<Vec<BoundingBox>>,
}

impl RecordingMap {
    fn new(viewport: Viewport) -> Arc<Self> {
        Arc::new(Self {
            viewport: Mutex::new(viewport),
            fits: Mutex::new(Vec::new()),
        })
    }

    fn fits(&self) -> Vec<BoundingBox> {
        self.fits.lock().unwrap().clone()
    }
}

impl MapView for RecordingMap {
    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap()
    }

    fn fit_bounds(&self, bounds: BoundingBox) {
        let mut viewport = self.viewport.lock().unwrap();
        viewport.bounds = bounds;
        self.fits.lock().unwrap().push(bounds);
    }
}

fn yangon() -> Viewport {
    Viewport::new(BoundingBox::new(16.7951, 96.1001, 16.8451, 96.1501), 12)
}

fn session_with(
    server: &MockServer,
    map: &Arc<RecordingMap>,
    config: SessionConfig,
) -> SearchSession {
    let overpass = OverpassClient::new(
        &[format!("{}/api/interpreter", server.uri())],
        10,
        "mmdir-test/0.1",
        BackoffPolicy::immediate(),
    )
    .expect("client construction should not fail");
    let geocoder =
        NominatimClient::with_base_url(&format!("{}/search", server.uri()), 5, "mmdir-test/0.1")
            .expect("client construction should not fail")
            .with_retries(0, 0);
    SearchSession::new(
        overpass,
        geocoder,
        QueryBuilder::default(),
        Arc::clone(map) as Arc<dyn MapView>,
        config,
    )
}

fn session(server: &MockServer, map: &Arc<RecordingMap>) -> SearchSession {
    session_with(server, map, SessionConfig::default())
}

fn node(id: i64, lat: f64, lon: f64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "node",
        "id": id,
        "lat": lat,
        "lon": lon,
        "tags": { "amenity": "monastery", "religion": "buddhist", "name": name }
    })
}

fn elements(items: Vec<serde_json::Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "elements": items }))
}

fn ids(records: &[PlaceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn duplicate_elements_collapse_and_repeat_view_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(elements(vec![
            node(101, 16.81, 96.12, "Shwe Taung"),
            node(101, 16.81, 96.12, "Shwe Taung"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);

    match session.search_view(yangon(), None).await {
        ViewOutcome::Results { records, source } => {
            assert_eq!(source, ResultSource::Network);
            assert_eq!(ids(&records), vec!["node/101"]);
        }
        other => panic!("expected results, got {other:?}"),
    }

    match session.search_view(yangon(), None).await {
        ViewOutcome::Results { records, source } => {
            assert_eq!(source, ResultSource::Reused);
            assert_eq!(records.len(), 1);
        }
        other => panic!("expected reused results, got {other:?}"),
    }

    let zoomed = Viewport::new(yangon().bounds, 13);
    match session.search_view(zoomed, None).await {
        ViewOutcome::Results { source, .. } => assert_eq!(source, ResultSource::Cache),
        other => panic!("expected cached results, got {other:?}"),
    }
}

#[tokio::test]
async fn pan_within_rounding_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(7, 16.82, 96.12, "Kyaung")]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    assert!(matches!(
        session.search_view(yangon(), None).await,
        ViewOutcome::Results { .. }
    ));

    // About 1 km north, yet every edge rounds to the same two decimals.
    let panned = Viewport::new(BoundingBox::new(16.8046, 96.1001, 16.8546, 96.1501), 12);
    assert_eq!(panned.bounds.cache_key(), yangon().bounds.cache_key());
    match session.search_view(panned, None).await {
        ViewOutcome::Results { source, .. } => assert_eq!(source, ResultSource::Cache),
        other => panic!("expected cached results, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_cache_entry_falls_through_to_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(7, 16.82, 96.12, "Kyaung")]))
        .expect(2)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let config = SessionConfig {
        cache_ttl: Duration::from_millis(200),
        ..SessionConfig::default()
    };
    let session = session_with(&server, &map, config);
    session.search_view(yangon(), None).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let zoomed = Viewport::new(yangon().bounds, 13);
    match session.search_view(zoomed, None).await {
        ViewOutcome::Results { source, .. } => assert_eq!(source, ResultSource::Network),
        other => panic!("expected network results, got {other:?}"),
    }
}

#[tokio::test]
async fn low_zoom_never_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![]))
        .expect(0)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    let outcome = session
        .search_view(Viewport::new(yangon().bounds, 9), Some("Sitagu"))
        .await;
    assert!(matches!(outcome, ViewOutcome::ZoomIn), "got {outcome:?}");
}

#[tokio::test]
async fn empty_view_with_name_offers_nationwide_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(NATIONWIDE)
        .respond_with(elements(vec![
            node(1, 21.88, 95.98, "Sitagu International Buddhist Academy"),
            node(2, 16.85, 96.13, "Sitagu Vihara"),
            node(1, 21.88, 95.98, "Sitagu International Buddhist Academy"),
        ]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);

    let outcome = session.search_view(yangon(), Some("Sitagu")).await;
    assert!(
        matches!(
            outcome,
            ViewOutcome::Empty {
                offer_nationwide: true
            }
        ),
        "got {outcome:?}"
    );

    let fallback = session
        .fallback(&outcome, Some("Sitagu"))
        .await
        .expect("fallback should run");
    let (records, fitted) = match fallback {
        NationwideOutcome::Found { records, fitted } => (records, fitted),
        other => panic!("expected nationwide results, got {other:?}"),
    };
    assert_eq!(ids(&records), vec!["node/1", "node/2"]);

    let fits = map.fits();
    assert_eq!(fits.len(), 1);
    assert_eq!(fitted, Some(fits[0]));
    for record in &records {
        assert!(fits[0].contains(record.position().unwrap()));
    }
    // 20 % padding on each side of the 5.03 degree latitude extent.
    assert!((fits[0].south - (16.85 - 0.2 * 5.03)).abs() < 1e-9);
}

#[tokio::test]
async fn empty_view_without_name_offers_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    let outcome = session.search_view(yangon(), Some("   ")).await;
    assert!(
        matches!(
            outcome,
            ViewOutcome::Empty {
                offer_nationwide: false
            }
        ),
        "got {outcome:?}"
    );
    assert!(session.fallback(&outcome, None).await.is_none());
}

#[tokio::test]
async fn small_pan_after_empty_result_queries_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![]))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(31, 16.83, 96.12, "Kyaik Kalay")]))
        .expect(1)
        .mount(&server)
        .await;

    let first = Viewport::new(BoundingBox::new(16.8020, 96.1001, 16.8520, 96.1501), 12);
    let map = RecordingMap::new(first);
    let session = session(&server, &map);
    assert!(
        matches!(
            session.search_view(first, None).await,
            ViewOutcome::Empty { .. }
        ),
        "first view should be empty"
    );

    // About 445 m north: under the movement threshold, but on a new cache key.
    let second = Viewport::new(BoundingBox::new(16.8060, 96.1001, 16.8560, 96.1501), 12);
    assert!(first.center().distance_m(&second.center()) < 600.0);
    assert_ne!(first.bounds.cache_key(), second.bounds.cache_key());
    match session.search_view(second, None).await {
        ViewOutcome::Results { records, source } => {
            assert_eq!(source, ResultSource::Network);
            assert_eq!(ids(&records), vec!["node/31"]);
        }
        other => panic!("expected network results, got {other:?}"),
    }
}

#[tokio::test]
async fn nationwide_results_are_capped() {
    let server = MockServer::start().await;
    let many = (0..10_i32)
        .map(|i| node(i64::from(i), 16.0 + f64::from(i) * 0.1, 96.0, "Sitagu"))
        .collect();
    Mock::given(method("GET"))
        .and(NATIONWIDE)
        .respond_with(elements(many))
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let config = SessionConfig {
        nationwide_limit: 4,
        ..SessionConfig::default()
    };
    let session = session_with(&server, &map, config);
    match session.search_nationwide("Sitagu").await {
        NationwideOutcome::Found { records, .. } => {
            assert_eq!(ids(&records), vec!["node/0", "node/1", "node/2", "node/3"]);
        }
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn nationwide_with_no_matches_does_not_fit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(NATIONWIDE)
        .respond_with(elements(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    let outcome = session.search_nationwide("Nowhere").await;
    assert!(matches!(outcome, NationwideOutcome::NoMatches), "got {outcome:?}");
    assert!(map.fits().is_empty());
}

#[tokio::test]
async fn settle_right_after_fit_is_suppressed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(NATIONWIDE)
        .respond_with(elements(vec![node(1, 21.88, 95.98, "Sitagu")]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    assert!(matches!(
        session.search_nationwide("Sitagu").await,
        NationwideOutcome::Found { .. }
    ));
    let outcome = session.on_view_settled(Some("Sitagu")).await;
    assert!(matches!(outcome, ViewOutcome::Suppressed), "got {outcome:?}");
}

#[tokio::test]
async fn failure_with_prior_results_shows_last_good() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(5, 16.82, 96.12, "Kyaung")]))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    session.search_view(yangon(), None).await;

    let mandalay = Viewport::new(BoundingBox::new(21.95, 96.05, 22.0, 96.12), 12);
    match session.search_view(mandalay, None).await {
        ViewOutcome::Stale { records, error } => {
            assert_eq!(ids(&records), vec!["node/5"]);
            assert_eq!(error.kind(), ErrorKind::TransportFailure);
        }
        other => panic!("expected stale results, got {other:?}"),
    }
}

#[tokio::test]
async fn failure_without_prior_results_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>busy</html>", "text/html"))
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    match session.search_view(yangon(), None).await {
        ViewOutcome::Failed(error) => assert_eq!(error.kind(), ErrorKind::TransportFailure),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn newer_query_supersedes_older_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            elements(vec![node(1, 16.82, 96.12, "old")]).set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(2, 21.97, 96.08, "new")]))
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = Arc::new(session(&server, &map));

    let older = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.search_view(yangon(), None).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mandalay = Viewport::new(BoundingBox::new(21.95, 96.05, 22.0, 96.12), 12);
    let newer = session.search_view(mandalay, None).await;
    assert!(matches!(newer, ViewOutcome::Results { .. }), "got {newer:?}");

    let older = older.await.unwrap();
    assert!(matches!(older, ViewOutcome::Superseded), "got {older:?}");
    assert_eq!(ids(&session.last_good()), vec!["node/2"]);
}

#[tokio::test]
async fn overrides_inside_view_are_listed_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(9, 16.83, 96.13, "Network")]))
        .mount(&server)
        .await;

    let curated: Vec<PlaceRecord> = serde_json::from_value(serde_json::json!([
        { "id": "local/1", "name": "Curated", "lat": 16.81, "lon": 96.11 },
        { "id": "local/2", "name": "Elsewhere", "lat": 21.9, "lon": 95.9 }
    ]))
    .unwrap();

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map).with_overrides(curated);
    match session.search_view(yangon(), None).await {
        ViewOutcome::Results { records, .. } => {
            assert_eq!(ids(&records), vec!["local/1", "node/9"]);
        }
        other => panic!("expected results, got {other:?}"),
    }
}

#[tokio::test]
async fn locate_fits_geocoded_box_and_searches_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "lat": "21.88",
            "lon": "95.98",
            "boundingbox": ["21.85", "21.91", "95.95", "96.01"]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/interpreter"))
        .respond_with(elements(vec![node(3, 21.88, 95.98, "Sitagu")]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    let outcome = session
        .locate("Sagaing", Some(13), None)
        .await
        .expect("locate should succeed");
    assert!(matches!(outcome, ViewOutcome::Results { .. }), "got {outcome:?}");
    assert_eq!(map.fits(), vec![BoundingBox::new(21.85, 95.95, 21.91, 96.01)]);
}

#[tokio::test]
async fn locate_unknown_place_is_geocode_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let session = session(&server, &map);
    let err = session.locate("Atlantis", None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeocodeNotFound);
    assert!(map.fits().is_empty());
}

#[tokio::test]
async fn settle_loop_debounces_bursts_into_one_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(elements(vec![node(4, 16.82, 96.12, "Kyaung")]))
        .expect(1)
        .mount(&server)
        .await;

    let map = RecordingMap::new(yangon());
    let config = SessionConfig {
        debounce: Duration::from_millis(50),
        ..SessionConfig::default()
    };
    let session = Arc::new(session_with(&server, &map, config));

    let (settle_tx, settle_rx) = mpsc::channel(8);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    for _ in 0..3 {
        settle_tx.send(()).await.unwrap();
    }
    drop(settle_tx);

    run_settle_loop(session, settle_rx, None, outcome_tx).await;

    let outcome = outcome_rx.recv().await.expect("one outcome");
    assert!(matches!(outcome, ViewOutcome::Results { .. }), "got {outcome:?}");
    assert!(outcome_rx.recv().await.is_none());
}
