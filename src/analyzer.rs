//! Frame analysis core.
//!
//! `FrameAnalyzer::submit` is called from the single frame worker, once per
//! captured frame, and never blocks on detection:
//!
//! ```text
//! RECEIVED ─┬─ busy ──> DROPPED ───────────────────────> RELEASED
//!           └─ idle ──> SUBMITTED ─┬─ succeed ─> COMPLETED ─> RELEASED
//!                                  ├─ fail ────> FAILED ────> RELEASED
//!                                  └─ drop ────> CANCELLED ─> RELEASED
//! ```
//!
//! A submitted frame travels inside a `PendingDetection`, a single-shot
//! completion owned by the detection service. Resolving it (`succeed`/`fail`)
//! consumes it; its drop path is the finalizer that releases the frame and then
//! frees the in-flight slot. Resolutions are posted to a `CompletionQueue`
//! that is drained on the completion context, where listeners run.
//!
//! ```compile_fail
//! use frame_overlay::PendingDetection;
//!
//! fn resolve_twice(pending: PendingDetection) {
//!     pending.succeed(Vec::new());
//!     pending.succeed(Vec::new());
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::detect::{Detection, DetectionBatch, DetectionRequest, DetectionService};
use crate::frame::Frame;
use crate::orientation::{RotationSink, RotationState, SharedRotation};
use crate::transform::SourceGeometry;
use crate::{FrameId, RequestId};

/// Per-detection callback, invoked on the completion context.
pub type DetectionListener = Box<dyn Fn(&Detection) + Send + Sync>;
type BatchHandler = Box<dyn Fn(&DetectionBatch) + Send + Sync>;
type FailureHandler = Box<dyn Fn(RequestId, &anyhow::Error) + Send + Sync>;

#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyzerSettings {
    /// Front-facing capture is mirrored relative to the viewer.
    pub mirrored: bool,
    pub initial_rotation: RotationState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(RequestId),
    /// Released immediately because another request was still in flight.
    Dropped { busy_with: RequestId },
}

// ----------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AnalyzerStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl StatsSnapshot {
    /// Requests that reached a terminal state.
    pub fn resolved(&self) -> u64 {
        self.completed + self.failed + self.cancelled
    }
}

impl AnalyzerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ----------------------------------------------------------------------------
// In-flight slot
// ----------------------------------------------------------------------------

#[derive(Default)]
struct InFlightState {
    active: Option<RequestId>,
    next_id: u64,
}

#[derive(Default)]
struct InFlight {
    state: Mutex<InFlightState>,
    idle: Condvar,
}

impl InFlight {
    /// Claim the slot for a new request, or report who holds it.
    fn try_acquire(self: &Arc<Self>) -> Result<std::result::Result<InFlightSlot, RequestId>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("in-flight lock poisoned"))?;
        if let Some(busy) = state.active {
            return Ok(Err(busy));
        }
        state.next_id += 1;
        let request_id = RequestId(state.next_id);
        state.active = Some(request_id);
        Ok(Ok(InFlightSlot {
            in_flight: Arc::clone(self),
            request_id,
        }))
    }

    fn current(&self) -> Option<RequestId> {
        self.lock().active
    }

    fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.active.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            state = match self.idle.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, InFlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by exactly one `PendingDetection`; frees the slot on drop.
struct InFlightSlot {
    in_flight: Arc<InFlight>,
    request_id: RequestId,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        let mut state = self.in_flight.lock();
        if state.active == Some(self.request_id) {
            state.active = None;
        }
        drop(state);
        self.in_flight.idle.notify_all();
    }
}

// ----------------------------------------------------------------------------
// Completion
// ----------------------------------------------------------------------------

enum Completion {
    Completed(DetectionBatch),
    Failed {
        request_id: RequestId,
        frame_id: FrameId,
        error: anyhow::Error,
    },
    Cancelled {
        request_id: RequestId,
        frame_id: FrameId,
    },
    Shutdown,
}

/// Single-shot completion for one in-flight detection request.
///
/// The detection service resolves it exactly once with `succeed` or `fail`.
/// Dropping it unresolved counts as cancellation. On every path the frame is
/// released first and the in-flight slot freed second.
pub struct PendingDetection {
    // Field order is drop order: the frame goes back before the slot frees.
    request: DetectionRequest,
    geometry: SourceGeometry,
    outcome: Option<Sender<Completion>>,
    stats: Arc<AnalyzerStats>,
    _slot: InFlightSlot,
}

impl PendingDetection {
    pub fn request(&self) -> &DetectionRequest {
        &self.request
    }

    /// Source geometry the resulting overlay batch will be drawn with.
    pub fn geometry(&self) -> SourceGeometry {
        self.geometry
    }

    pub fn succeed(mut self, detections: Vec<Detection>) {
        AnalyzerStats::bump(&self.stats.completed);
        let batch = DetectionBatch {
            request_id: self.request.id(),
            frame_id: self.request.frame().id(),
            rotation: self.request.rotation(),
            geometry: self.geometry,
            detections,
        };
        self.post(Completion::Completed(batch));
    }

    pub fn fail(mut self, error: anyhow::Error) {
        AnalyzerStats::bump(&self.stats.failed);
        let completion = Completion::Failed {
            request_id: self.request.id(),
            frame_id: self.request.frame().id(),
            error,
        };
        self.post(completion);
    }

    fn post(&mut self, completion: Completion) {
        if let Some(tx) = self.outcome.take() {
            // A closed queue means the pipeline is shutting down; the frame is
            // still released when `self` drops.
            let _ = tx.send(completion);
        }
    }
}

impl Drop for PendingDetection {
    fn drop(&mut self) {
        if self.outcome.is_some() {
            AnalyzerStats::bump(&self.stats.cancelled);
            log::debug!(
                "analyzer: {} for {} dropped unresolved",
                self.request.id(),
                self.request.frame().id()
            );
            let completion = Completion::Cancelled {
                request_id: self.request.id(),
                frame_id: self.request.frame().id(),
            };
            self.post(completion);
        }
    }
}

#[derive(Default)]
struct Handlers {
    listeners: RwLock<Vec<DetectionListener>>,
    batches: RwLock<Vec<BatchHandler>>,
    failures: RwLock<Vec<FailureHandler>>,
}

/// Receiving end of analyzer completions. Drain it on the completion context.
///
/// Handlers run while the handler lists are read-locked; registering a new
/// handler from inside a handler deadlocks.
pub struct CompletionQueue {
    rx: Receiver<Completion>,
    handlers: Arc<Handlers>,
}

impl CompletionQueue {
    /// Dispatch everything already queued. Returns the number of completions handled.
    pub fn dispatch_pending(&self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if !self.dispatch(completion) {
                break;
            }
            handled += 1;
        }
        handled
    }

    /// Dispatch until the shutdown marker arrives or every sender is gone.
    pub fn run(self) {
        while let Ok(completion) = self.rx.recv() {
            if !self.dispatch(completion) {
                break;
            }
        }
        log::debug!("analyzer: completion queue drained");
    }

    fn dispatch(&self, completion: Completion) -> bool {
        match completion {
            Completion::Completed(batch) => {
                {
                    let listeners = read(&self.handlers.listeners);
                    for detection in &batch.detections {
                        for listener in listeners.iter() {
                            listener(detection);
                        }
                    }
                }
                for handler in read(&self.handlers.batches).iter() {
                    handler(&batch);
                }
                true
            }
            Completion::Failed {
                request_id,
                frame_id,
                error,
            } => {
                log::warn!(
                    "analyzer: detection failed for {} ({}): {:#}",
                    frame_id,
                    request_id,
                    error
                );
                for handler in read(&self.handlers.failures).iter() {
                    handler(request_id, &error);
                }
                true
            }
            Completion::Cancelled {
                request_id,
                frame_id,
            } => {
                log::debug!("analyzer: {} for {} cancelled", request_id, frame_id);
                true
            }
            Completion::Shutdown => false,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// FrameAnalyzer
// ----------------------------------------------------------------------------

/// Enforces at most one in-flight detection and guarantees frame release.
pub struct FrameAnalyzer {
    service: Arc<dyn DetectionService>,
    settings: AnalyzerSettings,
    rotation: SharedRotation,
    in_flight: Arc<InFlight>,
    handlers: Arc<Handlers>,
    stats: Arc<AnalyzerStats>,
    completions: Sender<Completion>,
}

impl FrameAnalyzer {
    pub fn new(
        service: Arc<dyn DetectionService>,
        settings: AnalyzerSettings,
    ) -> (Self, CompletionQueue) {
        let (tx, rx) = mpsc::channel();
        let handlers = Arc::new(Handlers::default());
        let analyzer = Self {
            service,
            settings,
            rotation: SharedRotation::new(settings.initial_rotation),
            in_flight: Arc::new(InFlight::default()),
            handlers: Arc::clone(&handlers),
            stats: Arc::new(AnalyzerStats::default()),
            completions: tx,
        };
        (analyzer, CompletionQueue { rx, handlers })
    }

    /// Register a per-detection listener.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&Detection) + Send + Sync + 'static,
    {
        write(&self.handlers.listeners).push(Box::new(listener));
    }

    /// Register a per-batch handler; runs after the listeners, also for empty batches.
    pub fn on_batch<F>(&self, handler: F)
    where
        F: Fn(&DetectionBatch) + Send + Sync + 'static,
    {
        write(&self.handlers.batches).push(Box::new(handler));
    }

    /// Register a diagnostic sink for detection failures.
    pub fn on_failure<F>(&self, handler: F)
    where
        F: Fn(RequestId, &anyhow::Error) + Send + Sync + 'static,
    {
        write(&self.handlers.failures).push(Box::new(handler));
    }

    /// Offer one frame. Never blocks on detection.
    ///
    /// The frame is released on every path: immediately when dropped, or by the
    /// `PendingDetection` finalizer once the service resolves the request.
    pub fn submit(&self, frame: Frame) -> Result<SubmitOutcome> {
        let slot = match self.in_flight.try_acquire()? {
            Ok(slot) => slot,
            Err(busy_with) => {
                AnalyzerStats::bump(&self.stats.dropped);
                log::trace!("analyzer: dropping {} ({} in flight)", frame.id(), busy_with);
                frame.release();
                return Ok(SubmitOutcome::Dropped { busy_with });
            }
        };

        let (width, height) = frame.logical_dimensions();
        let geometry = SourceGeometry::new(width, height, self.settings.mirrored);

        let request_id = slot.request_id;
        let request = DetectionRequest::new(request_id, frame, self.rotation.load());
        let pending = PendingDetection {
            request,
            geometry,
            outcome: Some(self.completions.clone()),
            stats: Arc::clone(&self.stats),
            _slot: slot,
        };
        AnalyzerStats::bump(&self.stats.submitted);
        self.service.process(pending);
        Ok(SubmitOutcome::Submitted(request_id))
    }

    /// Rotation that the next request will be tagged with.
    pub fn rotation(&self) -> RotationState {
        self.rotation.load()
    }

    pub fn is_mirrored(&self) -> bool {
        self.settings.mirrored
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight.current()
    }

    /// Block until no request is in flight (and its frame is released).
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.in_flight.wait_idle(timeout)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Post the shutdown marker behind any queued completions.
    pub fn close(&self) {
        let _ = self.completions.send(Completion::Shutdown);
    }
}

impl RotationSink for FrameAnalyzer {
    fn rotation_changed(&self, rotation: RotationState) {
        self.rotation.store(rotation);
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::BufferRecycler;
    use crate::overlay::{OverlayRenderer, OverlayStyle, RecordingSurface};
    use crate::{BoundingBox, Point, SurfaceSize};
    use std::sync::atomic::AtomicUsize;

    /// Holds pending requests until the test resolves them.
    #[derive(Default)]
    struct ManualService {
        pending: Mutex<Vec<PendingDetection>>,
    }

    impl ManualService {
        fn take(&self) -> PendingDetection {
            self.pending.lock().unwrap().remove(0)
        }
    }

    impl DetectionService for ManualService {
        fn name(&self) -> &str {
            "manual"
        }

        fn process(&self, pending: PendingDetection) {
            self.pending.lock().unwrap().push(pending);
        }
    }

    #[derive(Default)]
    struct ReleaseLog {
        released: Mutex<Vec<FrameId>>,
    }

    impl BufferRecycler for ReleaseLog {
        fn recycle(&self, frame_id: FrameId, _buffer: Vec<u8>) {
            self.released.lock().unwrap().push(frame_id);
        }
    }

    impl ReleaseLog {
        fn ids(&self) -> Vec<FrameId> {
            self.released.lock().unwrap().clone()
        }
    }

    fn frame(id: u64, log: &Arc<ReleaseLog>) -> Frame {
        Frame::new(FrameId(id), vec![0u8; 12], 480, 640, 90)
            .unwrap()
            .with_recycler(log.clone())
    }

    fn face(x: f32, y: f32) -> Detection {
        Detection::new(BoundingBox {
            center: Point::new(x, y),
            width: 10.0,
            height: 10.0,
        })
    }

    fn analyzer(service: Arc<ManualService>) -> (FrameAnalyzer, CompletionQueue) {
        FrameAnalyzer::new(
            service,
            AnalyzerSettings {
                mirrored: true,
                initial_rotation: RotationState::Up,
            },
        )
    }

    #[test]
    fn busy_frame_is_dropped_and_released_immediately() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        analyzer.add_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let a = analyzer.submit(frame(1, &releases)).unwrap();
        assert_eq!(a, SubmitOutcome::Submitted(RequestId(1)));
        let b = analyzer.submit(frame(2, &releases)).unwrap();
        assert_eq!(
            b,
            SubmitOutcome::Dropped {
                busy_with: RequestId(1)
            }
        );
        // B released at drop time, A still held by the service.
        assert_eq!(releases.ids(), vec![FrameId(2)]);

        service.take().succeed(vec![face(1.0, 2.0)]);
        assert_eq!(releases.ids(), vec![FrameId(2), FrameId(1)]);
        assert_eq!(queue.dispatch_pending(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let stats = analyzer.stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.completed, 1);
    }

    #[test]
    fn failure_releases_and_reports_without_listeners() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());
        let detections = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(Mutex::new(Vec::new()));
        {
            let detections = detections.clone();
            analyzer.add_listener(move |_| {
                detections.fetch_add(1, Ordering::SeqCst);
            });
            let failures = failures.clone();
            analyzer.on_failure(move |id, err| {
                failures.lock().unwrap().push((id, err.to_string()));
            });
        }

        analyzer.submit(frame(5, &releases)).unwrap();
        service.take().fail(anyhow!("model not loaded"));
        assert_eq!(releases.ids(), vec![FrameId(5)]);
        assert_eq!(analyzer.in_flight(), None);

        queue.dispatch_pending();
        assert_eq!(detections.load(Ordering::SeqCst), 0);
        assert_eq!(
            failures.lock().unwrap().clone(),
            vec![(RequestId(1), "model not loaded".to_string())]
        );
        // Next frame is the retry vehicle.
        assert!(matches!(
            analyzer.submit(frame(6, &releases)).unwrap(),
            SubmitOutcome::Submitted(_)
        ));
    }

    #[test]
    fn cancellation_releases_exactly_once() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());

        analyzer.submit(frame(7, &releases)).unwrap();
        drop(service.take());
        assert_eq!(releases.ids(), vec![FrameId(7)]);
        assert_eq!(analyzer.stats().cancelled, 1);
        assert_eq!(queue.dispatch_pending(), 1);
        assert!(analyzer.wait_idle(Duration::from_millis(10)));
    }

    #[test]
    fn at_most_one_request_in_flight() {
        let service = Arc::new(ManualService::default());
        let (analyzer, _queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());

        for id in 0..20 {
            analyzer.submit(frame(id, &releases)).unwrap();
            assert!(service.pending.lock().unwrap().len() <= 1);
            if id % 5 == 4 {
                service.take().succeed(Vec::new());
            }
        }
        let stats = analyzer.stats();
        assert_eq!(stats.submitted, 4);
        assert_eq!(stats.dropped, 16);

        // The last request resolved on frame 19, so all twenty are back exactly once.
        let mut ids = releases.ids();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), releases.ids().len());
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn batch_carries_submission_rotation_and_geometry() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());
        let batches = Arc::new(Mutex::new(Vec::new()));
        {
            let batches = batches.clone();
            analyzer.on_batch(move |batch| batches.lock().unwrap().push(batch.clone()));
        }

        analyzer.rotation_changed(RotationState::Left);
        analyzer.submit(frame(1, &releases)).unwrap();
        // Rotation changes after submission apply to future requests only.
        analyzer.rotation_changed(RotationState::Down);
        let pending = service.take();
        assert_eq!(pending.request().rotation(), RotationState::Left);
        pending.succeed(Vec::new());
        queue.dispatch_pending();

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].rotation, RotationState::Left);
        assert_eq!(batches[0].geometry, SourceGeometry::new(640, 480, true));
        assert!(batches[0].is_empty());
        assert_eq!(analyzer.rotation(), RotationState::Down);
    }

    #[test]
    fn listeners_run_in_detection_order() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());
        let order = Arc::new(Mutex::new(Vec::new()));
        {
            let order = order.clone();
            analyzer.add_listener(move |d| order.lock().unwrap().push(d.bounds.center.x));
        }

        analyzer.submit(frame(1, &releases)).unwrap();
        service
            .take()
            .succeed(vec![face(3.0, 0.0), face(1.0, 0.0), face(2.0, 0.0)]);
        queue.dispatch_pending();
        assert_eq!(order.lock().unwrap().clone(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn close_stops_dispatch_after_queued_completions() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = analyzer(service.clone());
        let releases = Arc::new(ReleaseLog::default());
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = count.clone();
            analyzer.on_batch(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        analyzer.submit(frame(1, &releases)).unwrap();
        service.take().succeed(Vec::new());
        analyzer.close();
        queue.run();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn overlay_keeps_geometry_of_the_frame_its_detections_came_from() {
        let service = Arc::new(ManualService::default());
        let (analyzer, queue) = FrameAnalyzer::new(
            service.clone(),
            AnalyzerSettings {
                mirrored: false,
                initial_rotation: RotationState::Up,
            },
        );
        let renderer = Arc::new(OverlayRenderer::new(OverlayStyle::default()));
        {
            let renderer = renderer.clone();
            analyzer.on_batch(move |batch| renderer.replace_batch(batch));
        }
        let releases = Arc::new(ReleaseLog::default());

        // A: 480x640 sensor buffer rotated 90°, logical 640x480.
        analyzer.submit(frame(1, &releases)).unwrap();
        service.take().succeed(vec![face(320.0, 240.0)]);

        // B: same buffer unrotated, logical 480x640. Submitted before A's
        // completion is dispatched and left in flight.
        let upright = Frame::new(FrameId(2), vec![0u8; 12], 480, 640, 0)
            .unwrap()
            .with_recycler(releases.clone());
        assert_eq!(
            analyzer.submit(upright).unwrap(),
            SubmitOutcome::Submitted(RequestId(2))
        );
        assert_eq!(queue.dispatch_pending(), 1);
        assert_eq!(analyzer.in_flight(), Some(RequestId(2)));

        let mut surface = RecordingSurface::new(SurfaceSize::new(1080, 1920));
        let report = renderer.render(&mut surface);
        assert_eq!(report.items, 1);
        assert_eq!(
            renderer.snapshot().geometry,
            Some(SourceGeometry::new(640, 480, false))
        );
        assert_eq!(surface.calls()[0].center, Point::new(540.0, 960.0));

        service.take().succeed(vec![face(120.0, 160.0)]);
        queue.dispatch_pending();
        let mut surface = RecordingSurface::new(SurfaceSize::new(1080, 1920));
        renderer.render(&mut surface);
        assert_eq!(
            renderer.snapshot().geometry,
            Some(SourceGeometry::new(480, 640, false))
        );
        assert_eq!(surface.calls()[0].center, Point::new(270.0, 480.0));
    }
}
