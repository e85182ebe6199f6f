//! `replay`: runs a recorded detection dump through the speed tracker and
//! prints one JSON capture event per line.

use anyhow::{Context, Result};
use clap::Parser;
use linespeed::clock::Timestamps;
use linespeed::{Config, Frame, SpeedTracker, Tracking};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "replay", about = "Estimate vehicle speeds from a detection dump")]
struct Cli {
    /// Detection dump, one `<frame index>:<json detections>` line per frame
    input: PathBuf,
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stream name used for the scene
    #[arg(long, default_value = "main")]
    source: String,
    /// Original frame width
    #[arg(long, default_value_t = 1920)]
    width: u32,
    /// Original frame height
    #[arg(long, default_value_t = 1080)]
    height: u32,
    /// Derive timestamps from the frame index at this rate instead of the configured source
    #[arg(long)]
    fps: Option<f64>,
    /// Row of the first reference line
    #[arg(long)]
    line1: Option<f32>,
    /// Row of the second reference line
    #[arg(long)]
    line2: Option<f32>,
    /// Real distance between the lines in meters
    #[arg(long)]
    distance: Option<f64>,
    /// Process every Nth frame
    #[arg(long)]
    skip: Option<u32>,
    /// Processing scale the detections were produced at
    #[arg(long)]
    scale: Option<f32>,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(fps) = self.fps {
            cfg.timestamps = Timestamps::FrameRate { fps };
        }
        if let Some(v) = self.line1 {
            cfg.line1_y = v;
        }
        if let Some(v) = self.line2 {
            cfg.line2_y = v;
        }
        if let Some(v) = self.distance {
            cfg.real_distance_m = v;
        }
        if let Some(v) = self.skip {
            cfg.skip_factor = v;
        }
        if let Some(v) = self.scale {
            cfg.processing_scale = v;
        }

        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut tracker = SpeedTracker::new(cli.config()?)?;

    let file = std::fs::File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let reader = BufReader::new(file);

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let dims = (cli.width, cli.height);
    let mut captures = 0;

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame = match Frame::parse_dump_line(&line, dims) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(line = n + 1, %err, "skipping dump line");
                continue;
            }
        };

        if let Some(report) = tracker.update(&frame, &cli.source)? {
            for event in &report.events {
                serde_json::to_writer(&mut out, event)?;
                writeln!(out)?;
                captures += 1;
            }
        }
    }

    out.flush()?;

    let tracks = tracker.tracks(&cli.source);
    let measured = tracks.iter().filter(|t| t.speed.is_some()).count();

    if let Some(scene) = tracker.scene(&cli.source) {
        info!(
            tracks = tracks.len(),
            active = scene.active_count(),
            measured,
            captures,
            diagnostics = ?scene.diagnostics(),
            "replay done"
        );
    }

    Ok(())
}
