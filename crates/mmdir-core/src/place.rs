//! The canonical search-result record shared by every layer.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::LatLng;
use crate::ConfigError;

/// Display name used when a source element carries no name tags at all.
pub const UNKNOWN_NAME: &str = "Unknown";

/// One monastery, nunnery or other point of interest.
///
/// Serialized field names match the export header
/// (`id,name,name_en,name_mm,address,city,state,phone,website,lat,lon`), which
/// is also the shape of hand-curated override files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// `<element kind>/<numeric id>`, e.g. `node/123`. Deduplication key.
    pub id: String,
    pub name: String,
    /// Myanmar-script name (`name:my`).
    #[serde(rename = "name_mm", default)]
    pub name_local: String,
    /// Latin-script name (`name:en`).
    #[serde(rename = "name_en", default)]
    pub name_latin: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(rename = "state", default)]
    pub region: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Source tags, kept for renderers that want fields not promoted above.
    #[serde(default)]
    pub raw: BTreeMap<String, String>,
}

impl PlaceRecord {
    /// Coordinates, when the record has both halves.
    #[must_use]
    pub fn position(&self) -> Option<LatLng> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLng::new(lat, lon)),
            _ => None,
        }
    }

    /// `city, region`, skipping whichever is empty.
    #[must_use]
    pub fn locality(&self) -> String {
        [self.city.as_str(), self.region.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Load manually curated place records from a JSON array.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] if the file cannot be read and
/// [`ConfigError::FileParse`] if it is not an array of records.
pub fn load_overrides(path: &Path) -> Result<Vec<PlaceRecord>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let records: Vec<PlaceRecord> =
        serde_json::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded place overrides");
    Ok(records)
}
