//! Overpass elements to [`PlaceRecord`]s.

use std::collections::HashSet;

use mmdir_core::place::UNKNOWN_NAME;
use mmdir_core::{BoundingBox, PlaceRecord};

use crate::types::OverpassElement;

/// First non-empty value among `keys`.
fn first_tag<'a>(element: &'a OverpassElement, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| element.tags.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn tag_or_empty(element: &OverpassElement, keys: &[&str]) -> String {
    first_tag(element, keys).unwrap_or_default().to_owned()
}

/// Direct coordinates for nodes, the `out center` centroid otherwise.
fn coordinates(element: &OverpassElement) -> (Option<f64>, Option<f64>) {
    match (element.lat, element.lon, element.center) {
        (Some(lat), Some(lon), _) => (Some(lat), Some(lon)),
        (_, _, Some(center)) => (Some(center.lat), Some(center.lon)),
        (lat, lon, None) => (lat, lon),
    }
}

/// Maps one raw element to a record.
///
/// The display name prefers the Myanmar-script tag, then the generic name,
/// then the Latin-script tag, then [`UNKNOWN_NAME`].
#[must_use]
pub fn normalize_element(element: &OverpassElement) -> PlaceRecord {
    let (lat, lon) = coordinates(element);
    PlaceRecord {
        id: format!("{}/{}", element.kind, element.id),
        name: first_tag(element, &["name:my", "name", "name:en"])
            .unwrap_or(UNKNOWN_NAME)
            .to_owned(),
        name_local: tag_or_empty(element, &["name:my"]),
        name_latin: tag_or_empty(element, &["name:en"]),
        address: tag_or_empty(element, &["addr:full"]),
        city: tag_or_empty(element, &["addr:city"]),
        region: tag_or_empty(element, &["addr:state", "is_in:state"]),
        phone: tag_or_empty(element, &["contact:phone", "phone"]),
        website: tag_or_empty(element, &["contact:website", "website"]),
        lat,
        lon,
        raw: element.tags.clone(),
    }
}

/// Keeps the first record for each id, preserving order.
#[must_use]
pub fn dedup_by_id(records: Vec<PlaceRecord>) -> Vec<PlaceRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Normalizes and deduplicates a response's elements.
///
/// One place can match several query clauses, so the same element often
/// appears more than once in a single response.
#[must_use]
pub fn normalize_elements(elements: &[OverpassElement]) -> Vec<PlaceRecord> {
    dedup_by_id(elements.iter().map(normalize_element).collect())
}

/// Curated overrides inside `bbox`, then `network`, deduplicated.
///
/// Overrides come first, so an override wins an id collision with a
/// network record. Overrides without coordinates are never merged.
#[must_use]
pub fn merge_overrides(
    overrides: &[PlaceRecord],
    bbox: &BoundingBox,
    network: Vec<PlaceRecord>,
) -> Vec<PlaceRecord> {
    let local = overrides
        .iter()
        .filter(|r| r.position().is_some_and(|p| bbox.contains(p)))
        .cloned();
    dedup_by_id(local.chain(network).collect())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
