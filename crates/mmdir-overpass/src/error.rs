use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverpassError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. Retried internally; only escapes when a retry cap is configured.
    #[error("rate limited by {endpoint}")]
    RateLimited { endpoint: String },

    /// A newer query cancelled this one before its result was applied.
    #[error("request superseded by a newer query")]
    Superseded,

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// 2xx with a body that is not JSON, typically a server-side error page.
    #[error("non-JSON response ({content_type}): {snippet}")]
    NonJson {
        content_type: String,
        snippet: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint \"{endpoint}\": {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("no Overpass endpoints configured")]
    NoEndpoints,
}
