//! Client-side filtering of an already-fetched result set.
//!
//! Filtering never triggers a network query; it narrows whatever the
//! orchestration layer last produced. Tradition is a name heuristic, not a
//! source tag: the public data carries no reliable lineage field.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::place::PlaceRecord;
use crate::regions::Region;
use crate::ConfigError;

static MYANMAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)monastery|ဗိဟာရ|သာသနာ").expect("valid regex"));
static THAI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wat|thai").expect("valid regex"));
static LAO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lao|xaya?ram").expect("valid regex"));
static KHMER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)khmer|pagoda").expect("valid regex"));
static LANKA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)vihara|viharaya|sri lanka|thera").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tradition {
    Myanmar,
    Thai,
    Lao,
    Khmer,
    Lanka,
}

impl Tradition {
    /// Best-effort guess whether `record` belongs to this tradition.
    #[must_use]
    pub fn matches(self, record: &PlaceRecord) -> bool {
        // The Myanmar heuristic only looks at the display name.
        if self == Tradition::Myanmar {
            return MYANMAR_RE.is_match(&record.name);
        }
        let haystack = format!("{} {}", record.name, record.name_latin);
        let re: &Regex = match self {
            Tradition::Thai => &THAI_RE,
            Tradition::Lao => &LAO_RE,
            Tradition::Khmer => &KHMER_RE,
            Tradition::Lanka | Tradition::Myanmar => &LANKA_RE,
        };
        re.is_match(&haystack)
    }
}

impl FromStr for Tradition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "myanmar" => Ok(Tradition::Myanmar),
            "thai" => Ok(Tradition::Thai),
            "lao" => Ok(Tradition::Lao),
            "khmer" => Ok(Tradition::Khmer),
            "lanka" => Ok(Tradition::Lanka),
            _ => Err(ConfigError::UnknownOption {
                kind: "tradition",
                value: s.to_owned(),
            }),
        }
    }
}

/// Lowercased, trimmed form used for substring comparisons.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct PlaceFilter {
    pub text: Option<String>,
    pub region: Option<Region>,
    pub tradition: Option<Tradition>,
}

impl PlaceFilter {
    #[must_use]
    pub fn matches(&self, record: &PlaceRecord) -> bool {
        let tradition_ok = self.tradition.is_none_or(|t| t.matches(record));

        let region_ok = self.region.is_none_or(|region| {
            !record.region.is_empty()
                && record
                    .region
                    .to_lowercase()
                    .contains(&region.as_str().to_lowercase())
        });

        let needle = self.text.as_deref().map(normalize_text).unwrap_or_default();
        let text_ok = needle.is_empty()
            || [
                &record.name,
                &record.name_latin,
                &record.name_local,
                &record.city,
                &record.region,
                &record.address,
            ]
            .iter()
            .any(|field| normalize_text(field).contains(&needle));

        tradition_ok && region_ok && text_ok
    }

    /// Records passing the filter, in their original order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [PlaceRecord]) -> Vec<&'a PlaceRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
