use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};

mod models;
mod utils;

use crate::utils::conf_helper::init_config;
use wfb_analysis::{EventList, EventPayload, FacetSelector, LabelSummary, SeriesChart, TimelineMode};

#[derive(Parser, Debug)]
#[command(name = "wfb-analysis", about = "Spectra and label summaries for waveform browser events")]
struct Cli {
    /// Analysis settings (JSON)
    #[arg(long, global = true, default_value = "wfb.json")]
    config: PathBuf,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Row-major table of one series from an event payload
    Chart {
        #[arg(long)]
        event: PathBuf,
        #[arg(long)]
        series: String,
    },
    /// Magnitude spectrum of one series over a time window (ms)
    Fft {
        #[arg(long)]
        event: PathBuf,
        #[arg(long)]
        series: String,
        #[arg(long, allow_negative_numbers = true)]
        start: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        end: Option<f64>,
    },
    /// Heat maps and dot plots for a list of labeled events
    Summary {
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        mode: Option<TimelineMode>,
        #[arg(long)]
        facet: Option<FacetSelector>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = init_config(&cli.config).await?;

    match cli.command {
        Command::Chart { event, series } => {
            let payload = read_event(&event).await?;
            let chart = tokio::task::spawn_blocking(move || SeriesChart::from_event(&payload, &series))
                .await??;
            print_json(&chart)
        }

        Command::Fft {
            event,
            series,
            start,
            end,
        } => {
            let payload = read_event(&event).await?;
            info!("FFT of {} for event {}", series, payload.id);

            let spectrum = tokio::task::spawn_blocking(move || {
                SeriesChart::from_event(&payload, &series)?.spectrum_range(start, end)
            })
            .await??;

            debug!(
                "{} samples at {:.3} Hz -> {} bins",
                spectrum.result.samples,
                spectrum.result.sample_rate,
                spectrum.rows.len()
            );
            print_json(&spectrum)
        }

        Command::Summary {
            events,
            mode,
            facet,
        } => {
            let data = tokio::fs::read_to_string(&events)
                .await
                .with_context(|| format!("File read Error: {}", events.display()))?;
            let list = EventList::from_json(&data)?;

            let mut ctx = config.context();
            if let Some(facet) = facet {
                ctx.facet_on = facet;
            }
            let mode = mode.unwrap_or(config.timeline_mode);
            let seed = config.jitter_seed;

            let summary = tokio::task::spawn_blocking(move || {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                LabelSummary::build(&list.events, &ctx, mode, &mut rng)
            })
            .await?;

            print_json(&summary)
        }
    }
}

async fn read_event(path: &Path) -> anyhow::Result<EventPayload> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("File read Error: {}", path.display()))?;
    EventPayload::from_json(&data).with_context(|| format!("Invalid event payload: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
