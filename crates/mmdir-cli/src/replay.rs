//! `replay`: drive the settle loop from a recorded sequence of views.
//!
//! Each stdin line is `south,west,north,east,zoom[,wait_ms]`. The optional
//! wait is slept before the view is applied, so a recording of real map
//! movement replays with its original timing and debouncing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use mmdir_core::{AppConfig, BoundingBox, PlaceFilter};
use mmdir_search::{run_settle_loop, MapView, Viewport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::map::{fit_zoom, StaticMap};
use crate::output::{print_view_outcome, OutputFormat};
use crate::search::{build_session, MYANMAR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ReplayStep {
    pub(crate) viewport: Viewport,
    pub(crate) wait: Option<Duration>,
}

/// Parse one recorded view. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns an error for a malformed line.
pub(crate) fn parse_view_line(line: &str) -> anyhow::Result<Option<ReplayStep>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if !(5..=6).contains(&fields.len()) {
        bail!(
            "expected south,west,north,east,zoom[,wait_ms], got {} fields",
            fields.len()
        );
    }

    let coord = |i: usize| -> anyhow::Result<f64> {
        fields[i]
            .parse::<f64>()
            .with_context(|| format!("invalid coordinate '{}'", fields[i]))
    };
    let bounds = BoundingBox::new(coord(0)?, coord(1)?, coord(2)?, coord(3)?);
    if bounds.south > bounds.north || bounds.west > bounds.east {
        bail!("south/west must not exceed north/east");
    }

    let zoom: u8 = fields[4]
        .parse()
        .with_context(|| format!("invalid zoom '{}'", fields[4]))?;
    let wait = fields
        .get(5)
        .map(|w| {
            w.parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("invalid wait '{w}'"))
        })
        .transpose()?;

    Ok(Some(ReplayStep {
        viewport: Viewport::new(bounds, zoom),
        wait,
    }))
}

/// Read views from stdin until EOF, printing every outcome the loop emits.
///
/// Malformed lines are reported and skipped.
///
/// # Errors
///
/// Returns an error if the session cannot be built, stdin cannot be read, or
/// a loop task panics.
pub(crate) async fn run_replay(config: &AppConfig, name: Option<String>) -> anyhow::Result<()> {
    let map = Arc::new(StaticMap::new(Viewport::new(MYANMAR, fit_zoom(&MYANMAR))));
    let session = Arc::new(build_session(
        config,
        Arc::clone(&map) as Arc<dyn MapView>,
    )?);

    let filter = PlaceFilter {
        text: name.clone(),
        ..PlaceFilter::default()
    };
    let (settle_tx, settle_rx) = mpsc::channel(64);
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let driver = tokio::spawn(run_settle_loop(session, settle_rx, name, outcome_tx));

    let min_zoom = config.min_zoom;
    let printer = tokio::spawn(async move {
        while let Some(outcome) = outcome_rx.recv().await {
            if let Err(e) = print_view_outcome(outcome, &filter, OutputFormat::Table, min_zoom) {
                eprintln!("error: {e:#}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0_usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let step = match parse_view_line(&line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("line {line_no}: {e:#}");
                continue;
            }
        };
        if let Some(wait) = step.wait {
            tokio::time::sleep(wait).await;
        }
        map.set(step.viewport);
        if settle_tx.send(()).await.is_err() {
            break;
        }
    }

    drop(settle_tx);
    driver.await?;
    printer.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_without_wait() {
        let step = parse_view_line("16.7951, 96.1001, 16.8451, 96.1501, 13")
            .unwrap()
            .unwrap();
        assert_eq!(
            step.viewport,
            Viewport::new(BoundingBox::new(16.7951, 96.1001, 16.8451, 96.1501), 13)
        );
        assert_eq!(step.wait, None);
    }

    #[test]
    fn parses_wait_in_millis() {
        let step = parse_view_line("21.9,96.0,22.0,96.1,12,250")
            .unwrap()
            .unwrap();
        assert_eq!(step.wait, Some(Duration::from_millis(250)));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_view_line("").unwrap().is_none());
        assert!(parse_view_line("   ").unwrap().is_none());
        assert!(parse_view_line("# pan across Bago").unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_view_line("16.8,96.1,16.9").is_err());
        assert!(parse_view_line("16.8,96.1,16.9,96.2,twelve").is_err());
        assert!(parse_view_line("16.8,96.1,16.9,96.2,300").is_err());
        assert!(parse_view_line("16.9,96.1,16.8,96.2,12").is_err());
        assert!(parse_view_line("16.8,96.1,16.9,96.2,12,-5").is_err());
    }
}
