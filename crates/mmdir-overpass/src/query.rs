//! Overpass QL text for viewport and nationwide searches.
//!
//! The builder knows nothing about HTTP or caching; it only turns a bounding
//! box and an optional name into a query string.

use std::fmt::Write as _;

use mmdir_core::{AppConfig, BoundingBox};

use crate::aliases::{name_pattern, AliasScope};

/// Element kinds every category clause is expanded over.
const GEOMETRY_KINDS: [&str; 3] = ["node", "way", "relation"];

/// Tag filters for the three canonical Buddhist categories in viewport queries.
const VIEWPORT_CATEGORIES: [&str; 3] = [
    r#"["amenity"="place_of_worship"]["religion"="buddhist"]"#,
    r#"["amenity"="monastery"]["religion"="buddhist"]"#,
    r#"["building"="monastery"]["religion"="buddhist"]"#,
];

/// Nationwide categories. Monasteries are rarely tagged with a religion, and
/// some monastic schools are mapped as schools or community centres.
const NATIONWIDE_CATEGORIES: [&str; 4] = [
    r#"["amenity"="place_of_worship"]["religion"="buddhist"]"#,
    r#"["amenity"="monastery"]"#,
    r#"["building"="monastery"]"#,
    r#"["amenity"~"school|college|community_centre",i]"#,
];

/// Country area selector for the nationwide fallback.
const MYANMAR_AREA: &str = r#"area["ISO3166-1"="MM"]->.mm;"#;

/// Escapes a value for use inside a double-quoted QL string literal.
fn ql_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    viewport_timeout_secs: u32,
    nationwide_timeout_secs: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(25, 30)
    }
}

impl QueryBuilder {
    /// `timeout` values are sent as the QL `[timeout:N]` directive, bounding
    /// server-side execution.
    #[must_use]
    pub const fn new(viewport_timeout_secs: u32, nationwide_timeout_secs: u32) -> Self {
        Self {
            viewport_timeout_secs,
            nationwide_timeout_secs,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.viewport_query_timeout_secs,
            config.nationwide_query_timeout_secs,
        )
    }

    /// Category clauses for `bbox`, plus an unrestricted name clause when
    /// `name` is non-blank so that differently tagged places are still found.
    #[must_use]
    pub fn viewport_query(&self, bbox: &BoundingBox, name: Option<&str>) -> String {
        let area = bbox.to_overpass();
        let mut query = format!("[out:json][timeout:{}];\n(\n", self.viewport_timeout_secs);

        for category in VIEWPORT_CATEGORIES {
            for kind in GEOMETRY_KINDS {
                let _ = writeln!(query, "  {kind}{category}({area});");
            }
        }

        if let Some(pattern) = name.and_then(|n| name_pattern(n, AliasScope::Viewport)) {
            let pattern = ql_string(&pattern);
            for kind in GEOMETRY_KINDS {
                let _ = writeln!(query, "  {kind}[\"name\"~\"{pattern}\",i]({area});");
            }
        }

        query.push_str(");\nout center tags;");
        query
    }

    /// Country-wide search by name alone, ignoring any viewport.
    ///
    /// Returns `None` for a blank name: a nationwide query without a name
    /// restriction would return every temple in the country.
    #[must_use]
    pub fn nationwide_query(&self, name: &str) -> Option<String> {
        let pattern = ql_string(&name_pattern(name, AliasScope::Nationwide)?);
        let mut query = format!(
            "[out:json][timeout:{}];\n{MYANMAR_AREA}\n(\n",
            self.nationwide_timeout_secs
        );

        for category in NATIONWIDE_CATEGORIES {
            for kind in GEOMETRY_KINDS {
                let _ = writeln!(
                    query,
                    "  {kind}(area.mm){category}[\"name\"~\"{pattern}\",i];"
                );
            }
        }

        query.push_str(");\nout center tags;");
        Some(query)
    }
}
