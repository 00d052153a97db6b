mod events;
mod map;
mod output;
mod replay;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mmdir_core::{BoundingBox, EventFilter, PlaceFilter, Region, Tradition};
use mmdir_search::Viewport;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "mmdir")]
#[command(about = "Myanmar monastery directory search")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the monasteries inside one map view
    View {
        #[arg(long, allow_negative_numbers = true)]
        south: f64,
        #[arg(long, allow_negative_numbers = true)]
        west: f64,
        #[arg(long, allow_negative_numbers = true)]
        north: f64,
        #[arg(long, allow_negative_numbers = true)]
        east: f64,
        /// Map zoom level of the view
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
        zoom: u8,
        /// Name to search for, in Myanmar script or any common romanization
        #[arg(long)]
        name: Option<String>,
        /// Keep only results in this state or region
        #[arg(long)]
        region: Option<Region>,
        /// Keep only results matching this tradition (myanmar, thai, lao, khmer, lanka)
        #[arg(long)]
        tradition: Option<Tradition>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Search all of Myanmar when a named search finds nothing in the view
        #[arg(long)]
        nationwide_on_empty: bool,
    },
    /// Search all of Myanmar by name
    Nationwide {
        name: String,
        #[arg(long)]
        region: Option<Region>,
        #[arg(long)]
        tradition: Option<Tradition>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Geocode a place and search the area around it
    Locate {
        place: String,
        /// Zoom to search at; defaults to whatever fits the place
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
        zoom: Option<u8>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Replay `south,west,north,east,zoom[,wait_ms]` views from stdin
    Replay {
        #[arg(long)]
        name: Option<String>,
    },
    /// List calendar events
    Events {
        /// Text to match in title, monastery, city or state
        #[arg(long)]
        query: Option<String>,
        /// Month number, 1-12
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Exact state or region name
        #[arg(long)]
        state: Option<String>,
        /// Events file; defaults to `MMDIR_EVENTS_PATH`
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = mmdir_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::View {
            south,
            west,
            north,
            east,
            zoom,
            name,
            region,
            tradition,
            format,
            nationwide_on_empty,
        }) => {
            if south > north || west > east {
                anyhow::bail!("--south/--west must not exceed --north/--east");
            }
            let viewport = Viewport::new(BoundingBox::new(south, west, north, east), zoom);
            let filter = PlaceFilter {
                text: name.clone(),
                region,
                tradition,
            };
            search::run_view(
                &config,
                viewport,
                name.as_deref(),
                &filter,
                format,
                nationwide_on_empty,
            )
            .await?;
        }
        Some(Commands::Nationwide {
            name,
            region,
            tradition,
            format,
        }) => {
            let filter = PlaceFilter {
                text: Some(name.clone()),
                region,
                tradition,
            };
            search::run_nationwide(&config, &name, &filter, format).await?;
        }
        Some(Commands::Locate {
            place,
            zoom,
            name,
            format,
        }) => {
            search::run_locate(&config, &place, zoom, name.as_deref(), format).await?;
        }
        Some(Commands::Replay { name }) => replay::run_replay(&config, name).await?,
        Some(Commands::Events {
            query,
            month,
            state,
            file,
        }) => {
            let path = file.unwrap_or_else(|| config.events_path.clone());
            let filter = EventFilter {
                text: query,
                month,
                state,
            };
            events::run_events(&path, &filter);
        }
        None => println!("mmdir: pass --help for the list of commands"),
    }

    Ok(())
}
