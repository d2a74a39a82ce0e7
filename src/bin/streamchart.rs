//! streamchart: drive a streaming chart session from the command line.
//!
//! Seeds every configured series, advances them for a number of ticks, and
//! optionally writes the final state as an SVG chart.
//!
//! Run: `streamchart --seed 42 --ticks 10 --output chart.svg`

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use streamchart::config::Config;
use streamchart::session::StreamSession;
use streamchart::stats::WindowSummary;
use streamchart::surface::{RenderSurface, SvgSurface};
use streamchart::ticker;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// streamchart: streaming sample windows with density and trend overlays
#[derive(Parser, Debug)]
#[command(name = "streamchart")]
#[command(author = "PAIML Team")]
#[command(version)]
#[command(about = "Streaming random-walk windows with density and regression overlays", long_about = None)]
struct Cli {
    /// Config file path (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed, overriding the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "10")]
    ticks: u64,

    /// Write the final chart to this SVG file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tick on the configured wall-clock interval instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// SVG width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// SVG height in pixels
    #[arg(long, default_value = "600")]
    height: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamchart=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    if cli.seed.is_some() {
        config.stream.seed = cli.seed;
    }
    let config = Arc::new(config);

    let session = StreamSession::new(Arc::clone(&config)).context("starting session")?;
    let mut surface = SvgSurface::new(cli.width, cli.height);

    if cli.realtime {
        surface = run_realtime(session, surface, cli.ticks)?;
    } else {
        run_batch(session, &mut surface, cli.ticks)?;
    }

    if let Some(path) = &cli.output {
        surface.write_to_file(path).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote chart");
    }
    Ok(())
}

fn run_batch(mut session: StreamSession, surface: &mut SvgSurface, ticks: u64) -> Result<()> {
    surface.submit(&session.snapshot())?;
    for _ in 0..ticks {
        if let Some(redraw) = session.tick()? {
            surface.submit(&redraw)?;
        }
    }
    report(&session);
    Ok(())
}

fn run_realtime(session: StreamSession, mut surface: SvgSurface, ticks: u64) -> Result<SvgSurface> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let (handle, updates) = ticker::spawn(session);
        let period = handle.period();
        let consumer = tokio::spawn(async move {
            ticker::pump(&mut surface, updates).await.map(|submitted| (submitted, surface))
        });

        let deadline = period.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
        tokio::time::sleep(deadline + period / 2).await;
        handle.stop().await?;

        let (submitted, surface) = consumer.await.context("surface task panicked")??;
        info!(submitted, version = ?surface.version(), "realtime run finished");
        Ok::<_, anyhow::Error>(surface)
    })
}

fn report(session: &StreamSession) {
    for walk in session.walks() {
        let series = walk.series();
        if let Some(summary) = WindowSummary::of(series) {
            println!(
                "{:<16} len={:<8} last_ts={:<14} min={:<10.2} max={:<10.2} mean={:.2}",
                walk.name(),
                series.len(),
                series.last().map_or(0, |s| s.timestamp),
                summary.min,
                summary.max,
                summary.mean,
            );
        }
    }
    let trend = session.trend();
    println!(
        "{:<16} slope={:.4} intercept={:.4} r2={:.4}",
        "trend", trend.slope, trend.intercept, trend.r_squared
    );
}
