use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime configuration for one directory session.
///
/// Every field has a default, so an empty environment produces a working
/// configuration pointed at the public Overpass mirrors and Nominatim.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Functionally equivalent Overpass interpreter URLs, rotated round-robin.
    pub overpass_endpoints: Vec<String>,
    pub nominatim_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub min_zoom: u8,
    pub min_move_meters: f64,
    pub debounce_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub backoff_base_ms: u64,
    pub backoff_factor: f64,
    pub backoff_cap_ms: u64,
    pub backoff_jitter_ms: u64,
    pub rate_limit_cooldown_ms: u64,
    /// `None` retries rate-limited requests until they succeed or are superseded.
    pub max_rate_limit_retries: Option<u32>,
    pub viewport_query_timeout_secs: u32,
    pub nationwide_query_timeout_secs: u32,
    pub nationwide_limit: usize,
    /// Half-size of the box built around a geocoder point with no bounding box.
    pub geocode_radius_deg: f64,
    pub events_path: PathBuf,
    pub overrides_path: Option<PathBuf>,
}
