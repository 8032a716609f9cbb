//! Start/stop composition of source, analyzer, orientation and overlay.
//!
//! Threads:
//! - `frame-worker` pulls frames from the source and offers them to the analyzer
//! - `completion` drains the analyzer's completion queue (listeners, overlay)
//!
//! Shutdown order: stop the worker, wait for the in-flight request to be
//! released, post the shutdown marker, join the completion thread, clear the
//! overlay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::analyzer::{AnalyzerSettings, FrameAnalyzer, StatsSnapshot};
use crate::detect::{Detection, DetectionService};
use crate::ingest::FrameSource;
use crate::orientation::{OrientationTracker, RotationState};
use crate::overlay::{OverlayRenderer, OverlayStyle, RenderReport, Surface};

#[derive(Clone, Copy, Debug)]
pub struct PipelineSettings {
    /// Front-facing capture: mirror the overlay horizontally.
    pub mirrored: bool,
    pub initial_rotation: RotationState,
    pub style: OverlayStyle,
    /// Upper bound on waiting for the in-flight request during `stop`.
    pub shutdown_timeout: Duration,
    /// Pause after a source error before asking for the next frame.
    pub source_retry_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            mirrored: true,
            initial_rotation: RotationState::Up,
            style: OverlayStyle::default(),
            shutdown_timeout: Duration::from_secs(2),
            source_retry_delay: Duration::from_millis(20),
        }
    }
}

pub struct Pipeline {
    settings: PipelineSettings,
    orientation: Arc<OrientationTracker>,
    analyzer: Arc<FrameAnalyzer>,
    renderer: Arc<OverlayRenderer>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    completion: Option<JoinHandle<()>>,
}

impl Pipeline {
    pub fn start<S>(
        mut source: S,
        service: Arc<dyn DetectionService>,
        settings: PipelineSettings,
    ) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        let service_name = service.name().to_string();
        let (analyzer, queue) = FrameAnalyzer::new(
            service,
            AnalyzerSettings {
                mirrored: settings.mirrored,
                initial_rotation: settings.initial_rotation,
            },
        );
        let analyzer = Arc::new(analyzer);

        let orientation = Arc::new(OrientationTracker::with_initial(settings.initial_rotation));
        orientation.subscribe(analyzer.clone());
        if let Some(sink) = source.rotation_sink() {
            sink.rotation_changed(settings.initial_rotation);
            orientation.subscribe(sink);
        }

        let renderer = Arc::new(OverlayRenderer::new(settings.style));
        let overlay = Arc::clone(&renderer);
        analyzer.on_batch(move |batch| overlay.replace_batch(batch));

        let completion = std::thread::Builder::new()
            .name("completion".to_string())
            .spawn(move || queue.run())
            .context("spawn completion thread")?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_shutdown = Arc::clone(&shutdown);
        let worker_analyzer = Arc::clone(&analyzer);
        let retry_delay = settings.source_retry_delay;
        let worker = std::thread::Builder::new()
            .name("frame-worker".to_string())
            .spawn(move || {
                run_worker(&mut source, &worker_analyzer, &worker_shutdown, retry_delay)
            });
        let worker = match worker {
            Ok(worker) => worker,
            Err(err) => {
                analyzer.close();
                let _ = completion.join();
                return Err(anyhow!("spawn frame-worker thread: {}", err));
            }
        };

        log::info!(
            "pipeline started (detector={}, mirrored={}, rotation={:?})",
            service_name,
            settings.mirrored,
            settings.initial_rotation
        );
        Ok(Self {
            settings,
            orientation,
            analyzer,
            renderer,
            shutdown,
            worker: Some(worker),
            completion: Some(completion),
        })
    }

    /// Feed one raw sensor angle. Returns the new rotation when it changed.
    pub fn on_orientation_sample(&self, angle_degrees: i32) -> Option<RotationState> {
        self.orientation.on_sample(angle_degrees)
    }

    pub fn orientation(&self) -> Arc<OrientationTracker> {
        Arc::clone(&self.orientation)
    }

    pub fn analyzer(&self) -> Arc<FrameAnalyzer> {
        Arc::clone(&self.analyzer)
    }

    pub fn renderer(&self) -> Arc<OverlayRenderer> {
        Arc::clone(&self.renderer)
    }

    /// Register a per-detection listener (runs on the completion thread).
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&Detection) + Send + Sync + 'static,
    {
        self.analyzer.add_listener(listener);
    }

    pub fn render(&self, surface: &mut dyn Surface) -> RenderReport {
        self.renderer.render(surface)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.analyzer.stats()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop capture, wait up to `shutdown_timeout` for the in-flight request,
    /// then end the completion thread and clear the overlay.
    ///
    /// A request still running after the timeout keeps its frame until the
    /// detector returns. Once the last `FrameAnalyzer` handle is gone the
    /// detector thread is joined, so with no outside `analyzer()` handles
    /// every buffer is back in its pool when `stop` returns.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown_threads()
    }

    fn shutdown_threads(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.shutdown.store(true, Ordering::SeqCst);
        let worker_result = worker
            .join()
            .map_err(|_| anyhow!("frame-worker thread panicked"));

        if !self.analyzer.wait_idle(self.settings.shutdown_timeout) {
            log::warn!(
                "pipeline: request {:?} still in flight after {:?}; its frame is released when the detector returns",
                self.analyzer.in_flight(),
                self.settings.shutdown_timeout
            );
        }

        self.analyzer.close();
        let completion_result = match self.completion.take() {
            Some(completion) => completion
                .join()
                .map_err(|_| anyhow!("completion thread panicked")),
            None => Ok(()),
        };

        self.renderer.clear();
        let stats = self.analyzer.stats();
        log::info!(
            "pipeline stopped: submitted={} dropped={} completed={} failed={} cancelled={}",
            stats.submitted,
            stats.dropped,
            stats.completed,
            stats.failed,
            stats.cancelled
        );
        worker_result.and(completion_result)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown_threads() {
            log::error!("pipeline shutdown: {:#}", err);
        }
    }
}

fn run_worker(
    source: &mut dyn FrameSource,
    analyzer: &FrameAnalyzer,
    shutdown: &AtomicBool,
    retry_delay: Duration,
) {
    let mut consecutive_errors = 0u32;
    while !shutdown.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => {
                consecutive_errors = 0;
                frame
            }
            Err(err) => {
                consecutive_errors += 1;
                if consecutive_errors == 1 || consecutive_errors % 100 == 0 {
                    log::warn!(
                        "frame source error ({} in a row, healthy={}): {:#}",
                        consecutive_errors,
                        source.is_healthy(),
                        err
                    );
                }
                std::thread::sleep(retry_delay);
                continue;
            }
        };
        if let Err(err) = analyzer.submit(frame) {
            log::error!("frame-worker: submit failed: {:#}", err);
            break;
        }
    }
    log::debug!("frame-worker: stopped");
}
