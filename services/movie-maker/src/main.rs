//! SHARP active-region movie maker.
//!
//! Fetches a time series of magnetogram frames for one active region from
//! the JSOC archive and renders it:
//! - `frames` dumps the preview as one PNG per record
//! - `export` encodes the stack as an MP4 movie
//!
//! Example, three days of active region 7117 sampled every four hours:
//!
//! ```text
//! movie-maker --harp 7117 \
//!     --start 2017.09.03_00:00_TAI --end 2017.09.06_00:00_TAI \
//!     --cadence 4h export
//! ```

mod client;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use drms_protocol::{Cadence, RecordSetQuery, DEFAULT_SERIES};
use sharp_common::{HarpId, TaiTimestamp, TimeRange};

use client::{DrmsClient, DEFAULT_BASE_URL};
use pipeline::DEFAULT_SEGMENT;

#[derive(Parser, Debug)]
#[command(name = "movie-maker")]
#[command(about = "Render SHARP active-region magnetogram series as movies")]
struct Args {
    /// HARP number of the active region
    #[arg(long)]
    harp: u32,

    /// Start of the time range (archive form, e.g. 2017.09.03_00:00_TAI)
    #[arg(long)]
    start: String,

    /// End of the time range (inclusive)
    #[arg(long)]
    end: String,

    /// Sampling cadence, e.g. 4h; omit to take every available record
    #[arg(long)]
    cadence: Option<String>,

    /// Archive data series
    #[arg(long, default_value = DEFAULT_SERIES)]
    series: String,

    /// Segment to animate
    #[arg(long, default_value = DEFAULT_SEGMENT)]
    segment: String,

    /// Color-scale limit in Gauss (symmetric, ±limit)
    #[arg(long)]
    scale_limit: Option<f32>,

    /// Archive base URL
    #[arg(long, env = "JSOC_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the preview as numbered PNG frames
    Frames {
        /// Directory for the PNG files
        #[arg(long, default_value = "frames")]
        output_dir: PathBuf,
    },
    /// Encode the stack as an MP4 movie
    Export {
        /// Directory for the movie file
        #[arg(long, default_value = "movies")]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let query = build_query(&args)?;
    info!(ds = %query, "starting movie maker");

    let client = DrmsClient::new(&args.base_url)?;
    let movie = match pipeline::assemble(&client, &query, &args.segment, args.scale_limit).await {
        Ok(movie) => movie,
        Err(e) => {
            tracing::error!(class = e.class(), error = %e, "failed to assemble frame stack");
            return Err(e.into());
        }
    };

    info!(
        title = %movie.title(),
        frames = movie.stack().len(),
        "frame stack assembled"
    );

    match args.command {
        Command::Frames { output_dir } => {
            let preview = movie.preview()?;
            std::fs::create_dir_all(&output_dir)?;

            for i in 0..preview.len() {
                let png = preview.frame_png(i)?;
                let name = match preview.timestamp(i) {
                    Some(ts) => format!("{:04}_{}.png", i, ts),
                    None => format!("{:04}.png", i),
                };
                let path = output_dir.join(name);
                std::fs::write(&path, png)?;
                info!(path = %path.display(), "wrote frame");
            }

            info!(
                frames = preview.len(),
                loop_ms = preview.loop_duration_ms(),
                dir = %output_dir.display(),
                "preview frames written"
            );
        }
        Command::Export { output_dir } => {
            let path = movie
                .export(&output_dir)
                .context("failed to export movie")?;
            info!(path = %path.display(), "movie written");
        }
    }

    Ok(())
}

/// Build the record-set query from the command line.
fn build_query(args: &Args) -> Result<RecordSetQuery> {
    let start = TaiTimestamp::parse(&args.start)
        .with_context(|| format!("invalid --start '{}'", args.start))?;
    let end = TaiTimestamp::parse(&args.end)
        .with_context(|| format!("invalid --end '{}'", args.end))?;
    let range = TimeRange::new(start, end)?;

    let mut query = RecordSetQuery::new(&args.series, HarpId::new(args.harp), range);
    if let Some(cadence) = &args.cadence {
        let cadence: Cadence = cadence
            .parse()
            .with_context(|| format!("invalid --cadence '{}'", cadence))?;
        query = query.with_cadence(cadence);
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "movie-maker",
            "--harp",
            "7117",
            "--start",
            "2017.09.03_00:00_TAI",
            "--end",
            "2017.09.06_00:00_TAI",
        ];
        argv.extend_from_slice(extra);
        argv.push("export");
        Args::parse_from(argv)
    }

    #[test]
    fn test_build_query_without_cadence() {
        let query = build_query(&base_args(&[])).unwrap();
        assert_eq!(
            query.to_query_string(),
            "hmi.sharp_cea_720s[7117][2017.09.03_00:00_TAI-2017.09.06_00:00_TAI]"
        );
    }

    #[test]
    fn test_build_query_with_cadence() {
        let query = build_query(&base_args(&["--cadence", "4h"])).unwrap();
        assert_eq!(
            query.to_query_string(),
            "hmi.sharp_cea_720s[7117][2017.09.03_00:00_TAI-2017.09.06_00:00_TAI@4h]"
        );
    }

    #[test]
    fn test_build_query_rejects_bad_start() {
        let mut args = base_args(&[]);
        args.start = "03/09/2017".to_string();
        assert!(build_query(&args).is_err());
    }

    #[test]
    fn test_build_query_rejects_reversed_range() {
        let mut args = base_args(&[]);
        std::mem::swap(&mut args.start, &mut args.end);
        assert!(build_query(&args).is_err());
    }
}
