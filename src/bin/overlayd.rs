//! overlayd - Frame Overlay Kernel daemon
//!
//! This daemon:
//! 1. Captures frames from the configured source
//! 2. Runs detection with at most one request in flight
//! 3. Tracks (simulated) device orientation and re-targets capture
//! 4. Renders the overlay onto a raster surface at the preview rate
//!
//! Stops on Ctrl-C.

use anyhow::{anyhow, Result};
use rand::Rng;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use frame_overlay::config::OverlayConfig;
use frame_overlay::{Pipeline, RasterSurface, SyntheticSource};

const ORIENTATION_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = OverlayConfig::load()?;
    let registry = cfg.detector.registry();
    log::info!("detector backends: {}", registry.list().join(", "));
    let service = Arc::new(registry.service(&cfg.detector.backend)?);

    let source = SyntheticSource::new(cfg.synthetic_source())?;
    let pool = source.pool();
    let pipeline = Pipeline::start(source, service, cfg.pipeline_settings())?;
    pipeline.add_listener(|detection| {
        log::trace!(
            "detection at ({:.1}, {:.1}) with {} contour points",
            detection.bounds.center.x,
            detection.bounds.center.y,
            detection.contour_points().count()
        );
    });

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    let mut surface = RasterSurface::new(cfg.surface);
    let preview_interval = Duration::from_secs(1) / cfg.source.target_fps;
    let mut rng = rand::thread_rng();
    let mut angle: i32 = 0;
    let mut last_sample = Instant::now();
    let mut last_health_log = Instant::now();
    let mut markers_drawn = 0usize;

    log::info!(
        "overlayd running: source={} surface={}x{} (Ctrl-C to stop)",
        cfg.source.url,
        cfg.surface.width,
        cfg.surface.height
    );

    loop {
        match rx.recv_timeout(preview_interval) {
            Ok(()) => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("signal handler channel closed"));
            }
        }

        if last_sample.elapsed() >= ORIENTATION_SAMPLE_INTERVAL {
            // Random walk; the odd negative reading stands in for "device flat".
            let sample = if rng.gen_ratio(1, 20) {
                -1
            } else {
                angle = (angle + rng.gen_range(-30..=30)).rem_euclid(360);
                angle
            };
            if let Some(rotation) = pipeline.on_orientation_sample(sample) {
                log::info!("rotation -> {:?} ({}°)", rotation, rotation.degrees());
            }
            last_sample = Instant::now();
        }

        surface.clear();
        let report = pipeline.render(&mut surface);
        markers_drawn = report.markers_drawn;

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = pipeline.stats();
            let pool_stats = pool.stats();
            log::info!(
                "submitted={} dropped={} completed={} failed={} markers={} pool_outstanding={}/{}",
                stats.submitted,
                stats.dropped,
                stats.completed,
                stats.failed,
                markers_drawn,
                pool_stats.outstanding,
                pool_stats.capacity
            );
            last_health_log = Instant::now();
        }
    }

    log::info!("shutdown signal received, stopping pipeline...");
    pipeline.stop()?;
    let pool_stats = pool.stats();
    log::info!(
        "overlayd stopped: {} buffers allocated, {} outstanding, last pass drew {} markers",
        pool_stats.allocated,
        pool_stats.outstanding,
        markers_drawn
    );
    Ok(())
}
