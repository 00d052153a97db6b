//! CSV and GeoJSON renditions of a result set.

use csv::{QuoteStyle, WriterBuilder};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use thiserror::Error;

use crate::place::PlaceRecord;

pub const CSV_COLUMNS: [&str; 11] = [
    "id", "name", "name_en", "name_mm", "address", "city", "state", "phone", "website", "lat",
    "lon",
];

pub const CSV_HEADER: &str = "id,name,name_en,name_mm,address,city,state,phone,website,lat,lon";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn coord(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Bare header line, then one fully quoted row per record.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer fails.
pub fn to_csv(records: &[PlaceRecord]) -> Result<String, ExportError> {
    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    header.write_record(CSV_COLUMNS)?;
    let buf = header.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;

    let mut rows = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(buf);
    for r in records {
        rows.write_record([
            r.id.as_str(),
            &r.name,
            &r.name_latin,
            &r.name_local,
            &r.address,
            &r.city,
            &r.region,
            &r.phone,
            &r.website,
            &coord(r.lat),
            &coord(r.lon),
        ])?;
    }
    let buf = rows.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(buf)?)
}

/// A `FeatureCollection` with one `Point` per record that has coordinates.
///
/// # Errors
///
/// Returns a `serde_json` error if a record cannot be serialized.
pub fn to_geojson(records: &[PlaceRecord]) -> Result<GeoJson, serde_json::Error> {
    let features = records
        .iter()
        .filter_map(|r| r.position().map(|p| (r, p)))
        .map(|(r, p)| {
            let properties: JsonObject = match serde_json::to_value(r)? {
                serde_json::Value::Object(map) => map,
                _ => JsonObject::new(),
            };
            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![p.lon, p.lat]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    Ok(GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}
