//! HTTP client for the Nominatim place-name search API.
//!
//! Resolves a typed place name ("Sagaing", "Hlaing Township") to a bounding
//! box that the directory can search. Queries are always suffixed with
//! `, Myanmar` and ask for English display names.

use std::time::Duration;

use mmdir_core::{AppConfig, BoundingBox, LatLng};
use reqwest::{Client, Url};

use crate::error::NominatimError;
use crate::retry::retry_with_backoff;
use crate::types::Candidate;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_USER_AGENT: &str = "mmdir/0.1 (monastery-directory)";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
const DEFAULT_FALLBACK_RADIUS_DEG: f64 = 0.08;

/// A resolved place.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub display_name: Option<String>,
    pub center: LatLng,
    /// The candidate's own bounding box, or a fixed-radius box around
    /// `center` when the candidate has none.
    pub bounds: BoundingBox,
}

/// Client for Nominatim's `/search` endpoint.
///
/// Use [`NominatimClient::new`] for the public instance or
/// [`NominatimClient::with_base_url`] to point at a mock server in tests.
pub struct NominatimClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    fallback_radius_deg: f64,
}

impl NominatimClient {
    /// Creates a client pointed at the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns [`NominatimError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, NominatimError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom search URL.
    ///
    /// # Errors
    ///
    /// Returns [`NominatimError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`NominatimError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, NominatimError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| NominatimError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            fallback_radius_deg: DEFAULT_FALLBACK_RADIUS_DEG,
        })
    }

    /// Creates a client from the `MMDIR_*` configuration.
    ///
    /// # Errors
    ///
    /// See [`NominatimClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, NominatimError> {
        Ok(Self::with_base_url(
            &config.nominatim_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_fallback_radius(config.geocode_radius_deg))
    }

    /// Half-size in degrees of the box built around candidates that carry no
    /// bounding box.
    #[must_use]
    pub fn with_fallback_radius(mut self, radius_deg: f64) -> Self {
        self.fallback_radius_deg = radius_deg;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Resolves `place` to its first candidate.
    ///
    /// # Errors
    ///
    /// - [`NominatimError::NotFound`] if there are no candidates.
    /// - [`NominatimError::Http`] on network failure or non-2xx status, after
    ///   transient errors have been retried.
    /// - [`NominatimError::Deserialize`] if the body is not a candidate list.
    /// - [`NominatimError::InvalidCoordinate`] if a coordinate is not numeric.
    pub async fn geocode(&self, place: &str) -> Result<GeocodeResult, NominatimError> {
        let query = format!("{}, Myanmar", place.trim());
        let url = self.search_url(&query);

        let candidates = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move { self.request_candidates(url).await }
        })
        .await?;

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| NominatimError::NotFound {
                query: query.clone(),
            })?;
        let result = self.resolve(first)?;
        tracing::debug!(
            query = %query,
            bounds = %result.bounds.to_overpass(),
            "geocoded place"
        );
        Ok(result)
    }

    /// Resolves `place` straight to the bounding box to search.
    ///
    /// # Errors
    ///
    /// See [`NominatimClient::geocode`].
    pub async fn geocode_bbox(&self, place: &str) -> Result<BoundingBox, NominatimError> {
        Ok(self.geocode(place).await?.bounds)
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("limit", "1")
            .append_pair("q", query);
        url
    }

    async fn request_candidates(&self, url: Url) -> Result<Vec<Candidate>, NominatimError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT_LANGUAGE, "en")
            .send()
            .await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| NominatimError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    fn resolve(&self, candidate: Candidate) -> Result<GeocodeResult, NominatimError> {
        let center = LatLng::new(
            parse_coord("lat", &candidate.lat)?,
            parse_coord("lon", &candidate.lon)?,
        );
        let bounds = match candidate.boundingbox.as_deref() {
            Some([south, north, west, east]) => BoundingBox::new(
                parse_coord("south", south)?,
                parse_coord("west", west)?,
                parse_coord("north", north)?,
                parse_coord("east", east)?,
            ),
            _ => BoundingBox::around(center, self.fallback_radius_deg),
        };
        Ok(GeocodeResult {
            display_name: candidate.display_name,
            center,
            bounds,
        })
    }
}

fn parse_coord(field: &'static str, value: &str) -> Result<f64, NominatimError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| NominatimError::InvalidCoordinate {
            field,
            value: value.to_owned(),
        })
}
