//! Wire types for Nominatim `format=jsonv2` search responses.

use serde::{Deserialize, Serialize};

/// One search candidate. Nominatim encodes every coordinate as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub lat: String,
    pub lon: String,
    /// `[south, north, west, east]`.
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
    #[serde(default)]
    pub display_name: Option<String>,
}
