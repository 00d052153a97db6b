use mmdir_nominatim::NominatimError;
use mmdir_overpass::OverpassError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Overpass query failed: {0}")]
    Overpass(#[from] OverpassError),

    #[error("geocoding failed: {0}")]
    Geocode(#[from] NominatimError),
}

/// How a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 429. Normally retried inside the client and never seen here.
    RateLimited,
    /// Cancelled by a newer query. Never shown to the user.
    Superseded,
    /// Non-2xx, non-JSON or network failure. Shown only without a last good result.
    TransportFailure,
    /// The geocoder had no candidates. Shown as a status message.
    GeocodeNotFound,
}

impl SearchError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Overpass(OverpassError::RateLimited { .. }) => ErrorKind::RateLimited,
            SearchError::Overpass(OverpassError::Superseded) => ErrorKind::Superseded,
            SearchError::Geocode(NominatimError::NotFound { .. }) => ErrorKind::GeocodeNotFound,
            SearchError::Overpass(_) | SearchError::Geocode(_) => ErrorKind::TransportFailure,
        }
    }
}
