use thiserror::Error;

/// Errors returned by the Nominatim geocoding client.
#[derive(Debug, Error)]
pub enum NominatimError {
    /// Network or TLS failure, or a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search returned no candidates.
    #[error("no geocoding match for \"{query}\"")]
    NotFound { query: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A coordinate string in the response did not parse as a number.
    #[error("invalid {field} value \"{value}\" in geocoding response")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
