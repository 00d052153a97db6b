//! Rendering result sets to stdout.
//!
//! Records go to stdout in the chosen format; status lines go to stderr so a
//! CSV or GeoJSON stream can be redirected untouched.

use clap::ValueEnum;
use mmdir_core::{to_csv, to_geojson, PlaceFilter, PlaceRecord};
use mmdir_search::{NationwideOutcome, ResultSource, SearchError, ViewOutcome};

const NAME_WIDTH: usize = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Csv,
    Geojson,
}

/// Truncate `s` to `width` characters, marking the cut with `...`.
fn clip(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        format!("{}...", s.chars().take(width - 3).collect::<String>())
    } else {
        s.to_string()
    }
}

fn fmt_coord(record: &PlaceRecord) -> String {
    record.position().map_or_else(
        || "\u{2014}".to_string(),
        |p| format!("{:.5},{:.5}", p.lat, p.lon),
    )
}

/// Table body for `records`, header first.
pub(crate) fn table_lines(records: &[PlaceRecord]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<38}{:<28}{:<22}ID",
        "NAME", "LOCALITY", "COORDINATES"
    )];
    for r in records {
        lines.push(format!(
            "{:<38}{:<28}{:<22}{}",
            clip(&r.name, NAME_WIDTH),
            clip(&r.locality(), 26),
            fmt_coord(r),
            r.id
        ));
    }
    lines
}

/// Records passing `filter`, cloned for rendering.
pub(crate) fn filtered_rows(records: &[PlaceRecord], filter: &PlaceFilter) -> Vec<PlaceRecord> {
    filter.apply(records).into_iter().cloned().collect()
}

/// Apply `filter` and print the survivors in `format`.
///
/// # Errors
///
/// Returns an error if CSV or GeoJSON serialization fails.
pub(crate) fn print_records(
    records: &[PlaceRecord],
    filter: &PlaceFilter,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let rows = filtered_rows(records, filter);
    if rows.len() < records.len() {
        eprintln!("{} of {} results match the filters", rows.len(), records.len());
    }

    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("no results");
                return Ok(());
            }
            for line in table_lines(&rows) {
                println!("{line}");
            }
        }
        OutputFormat::Csv => print!("{}", to_csv(&rows)?),
        OutputFormat::Geojson => println!("{}", to_geojson(&rows)?),
    }
    Ok(())
}

fn source_label(source: ResultSource) -> &'static str {
    match source {
        ResultSource::Network => "fresh",
        ResultSource::Cache => "cached",
        ResultSource::Reused => "unchanged view",
    }
}

/// Print one viewport outcome.
///
/// # Errors
///
/// Returns the search error when the query failed with nothing to fall back to.
pub(crate) fn print_view_outcome(
    outcome: ViewOutcome,
    filter: &PlaceFilter,
    format: OutputFormat,
    min_zoom: u8,
) -> anyhow::Result<()> {
    match outcome {
        ViewOutcome::ZoomIn => {
            eprintln!("zoom in to level {min_zoom} or closer to search this area");
        }
        ViewOutcome::Suppressed | ViewOutcome::Superseded => {}
        ViewOutcome::Results { records, source } => {
            eprintln!("{} results ({})", records.len(), source_label(source));
            print_records(&records, filter, format)?;
        }
        ViewOutcome::Empty { offer_nationwide } => {
            if offer_nationwide {
                eprintln!("no matches in this view; try `mmdir nationwide` to search all of Myanmar");
            } else {
                eprintln!("no monasteries found in this view");
            }
        }
        ViewOutcome::Stale { records, error } => {
            eprintln!("warning: {error}; showing the last results");
            print_records(&records, filter, format)?;
        }
        ViewOutcome::Failed(error) => return Err(search_failure(error)),
    }
    Ok(())
}

/// Print one nationwide outcome.
///
/// # Errors
///
/// Returns the search error when the query failed.
pub(crate) fn print_nationwide_outcome(
    outcome: NationwideOutcome,
    filter: &PlaceFilter,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match outcome {
        NationwideOutcome::Found { records, fitted } => {
            if let Some(b) = fitted {
                eprintln!(
                    "{} results across {:.3},{:.3} to {:.3},{:.3}",
                    records.len(),
                    b.south,
                    b.west,
                    b.north,
                    b.east
                );
            }
            print_records(&records, filter, format)?;
        }
        NationwideOutcome::NoMatches => eprintln!("no matches anywhere in Myanmar"),
        NationwideOutcome::Superseded => {}
        NationwideOutcome::Failed(error) => return Err(search_failure(error)),
    }
    Ok(())
}

fn search_failure(error: SearchError) -> anyhow::Error {
    anyhow::Error::new(error).context("search failed")
}
