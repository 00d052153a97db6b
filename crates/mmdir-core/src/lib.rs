pub mod app_config;
pub mod config;
pub mod coords;
pub mod events;
pub mod export;
pub mod filter;
pub mod place;
pub mod regions;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use coords::{BoundingBox, LatLng};
pub use events::{filter_events, load_events, Event, EventFilter};
pub use export::{to_csv, to_geojson, ExportError, CSV_COLUMNS, CSV_HEADER};
pub use filter::{PlaceFilter, Tradition};
pub use place::{load_overrides, PlaceRecord};
pub use regions::Region;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown {kind} \"{value}\"")]
    UnknownOption { kind: &'static str, value: String },
}
