//! demo - finite synthetic run of the Frame Overlay Kernel
//!
//! Streams synthetic frames for a fixed duration, sweeps the device through
//! all four orientations, renders the overlay and prints a summary.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use frame_overlay::config::{parse_surface_size, DetectorSettings};
use frame_overlay::{
    LensFacing, Pipeline, PipelineSettings, RasterSurface, SyntheticConfig, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds.
    #[arg(long, default_value_t = 4)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Detector backend (synthetic, stub).
    #[arg(long, default_value = "synthetic")]
    backend: String,
    /// Inject a detection failure every n-th request.
    #[arg(long)]
    fail_every: Option<u32>,
    /// Lens facing (front, back).
    #[arg(long, default_value = "front")]
    lens: String,
    /// Preview surface size, WIDTHxHEIGHT.
    #[arg(long, default_value = "1080x1920")]
    surface: String,
    /// Write the final overlay as a JPEG (requires the snapshot-jpeg feature).
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    let lens = LensFacing::parse(&args.lens)?;
    let surface_size = parse_surface_size(&args.surface)?;

    let detector = DetectorSettings {
        backend: args.backend.to_lowercase(),
        fail_every: args.fail_every.filter(|n| *n > 0),
    };
    let service = Arc::new(detector.registry().service(&detector.backend)?);

    let source = SyntheticSource::new(SyntheticConfig {
        target_fps: args.fps,
        lens,
        ..SyntheticConfig::default()
    })?;
    let pool = source.pool();

    let settings = PipelineSettings {
        mirrored: lens.is_mirrored(),
        ..PipelineSettings::default()
    };
    let pipeline = Pipeline::start(source, service, settings)?;
    let detections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&detections);
    pipeline.add_listener(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut surface = RasterSurface::new(surface_size);
    let run_for = Duration::from_secs(args.seconds);
    let quarter = run_for / 4;
    let started = Instant::now();
    let mut max_markers = 0usize;
    let mut last_markers = 0usize;
    let mut rotations = Vec::new();

    while started.elapsed() < run_for {
        // Sweep 0 -> 90 -> 180 -> 270 across the run.
        let step = if quarter.is_zero() {
            0
        } else {
            (started.elapsed().as_millis() / quarter.as_millis().max(1)).min(3) as i32
        };
        if let Some(rotation) = pipeline.on_orientation_sample(step * 90) {
            rotations.push(rotation);
        }

        surface.clear();
        let report = pipeline.render(&mut surface);
        last_markers = report.markers_drawn;
        max_markers = max_markers.max(report.markers_drawn);
        std::thread::sleep(Duration::from_millis(33));
    }

    if let Some(path) = &args.snapshot {
        let jpeg = surface.encode_jpeg()?;
        std::fs::write(path, jpeg)
            .with_context(|| format!("write snapshot {}", path.display()))?;
        println!("snapshot written to {}", path.display());
    }

    let stats = pipeline.stats();
    pipeline.stop()?;
    let pool_stats = pool.stats();

    println!("Frame overlay demo complete.");
    println!("  frames submitted:   {}", stats.submitted);
    println!("  frames dropped:     {}", stats.dropped);
    println!("  completed/failed:   {}/{}", stats.completed, stats.failed);
    println!("  detections:         {}", detections.load(Ordering::Relaxed));
    println!("  rotations:          {:?}", rotations);
    println!("  markers (max/last): {}/{}", max_markers, last_markers);
    println!(
        "  pool buffers:       {} allocated, {} outstanding",
        pool_stats.allocated, pool_stats.outstanding
    );
    Ok(())
}
