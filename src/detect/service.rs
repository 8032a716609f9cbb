use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{anyhow, Result};

use crate::analyzer::PendingDetection;
use crate::detect::backend::DetectorBackend;
use crate::frame::{Frame, FrameView};
use crate::orientation::RotationState;
use crate::RequestId;

/// One frame submitted for detection, tagged with the rotation in effect at
/// submission. Immutable once built.
#[derive(Debug)]
pub struct DetectionRequest {
    id: RequestId,
    frame: Frame,
    rotation: RotationState,
}

impl DetectionRequest {
    pub(crate) fn new(id: RequestId, frame: Frame, rotation: RotationState) -> Self {
        Self {
            id,
            frame,
            rotation,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn view(&self) -> FrameView<'_> {
        self.frame.view()
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }
}

/// Asynchronous detection service.
///
/// `process` must return promptly; the service resolves the pending request
/// later, from any thread. Dropping it unresolved cancels the request, which
/// still releases the frame.
pub trait DetectionService: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, pending: PendingDetection);
}

/// Runs a synchronous `DetectorBackend` on a dedicated detector thread.
pub struct ThreadedService {
    name: String,
    tx: Option<Sender<PendingDetection>>,
    join: Option<JoinHandle<()>>,
}

impl ThreadedService {
    pub fn new<B: DetectorBackend + 'static>(backend: B) -> Result<Self> {
        Self::spawn(Arc::new(Mutex::new(backend)))
    }

    /// Spawn the detector thread for a shared (registry-owned) backend.
    pub fn spawn(backend: Arc<Mutex<dyn DetectorBackend>>) -> Result<Self> {
        let name = {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("backend lock poisoned"))?;
            guard.warm_up()?;
            guard.name().to_string()
        };

        let (tx, rx) = mpsc::channel::<PendingDetection>();
        let thread_name = format!("detector-{}", name);
        let join = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                for pending in rx {
                    let result = match backend.lock() {
                        Ok(mut guard) => {
                            let request = pending.request();
                            guard.detect(request.view(), request.rotation())
                        }
                        Err(_) => Err(anyhow!("backend lock poisoned")),
                    };
                    match result {
                        Ok(detections) => pending.succeed(detections),
                        Err(err) => pending.fail(err),
                    }
                }
            })?;
        log::info!("ThreadedService: detector thread started for backend {}", name);

        Ok(Self {
            name,
            tx: Some(tx),
            join: Some(join),
        })
    }
}

impl DetectionService for ThreadedService {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, pending: PendingDetection) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(mpsc::SendError(pending)) = tx.send(pending) {
            log::warn!(
                "ThreadedService: detector thread for {} is gone; cancelling {}",
                self.name,
                pending.request().id()
            );
        }
    }
}

impl Drop for ThreadedService {
    fn drop(&mut self) {
        // Closing the channel ends the detector loop; queued requests are cancelled.
        self.tx.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("ThreadedService: detector thread for {} panicked", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{AnalyzerSettings, FrameAnalyzer, SubmitOutcome};
    use crate::detect::result::Detection;
    use crate::{BoundingBox, FrameId};
    use std::time::Duration;

    struct FixedBackend {
        fail: bool,
    }

    impl DetectorBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(
            &mut self,
            frame: FrameView<'_>,
            _rotation: RotationState,
        ) -> Result<Vec<Detection>> {
            if self.fail {
                return Err(anyhow!("fixed backend failure"));
            }
            let (width, height) = frame.logical_dimensions();
            Ok(vec![Detection::new(BoundingBox::from_corners(
                0.0,
                0.0,
                width as f32,
                height as f32,
            ))])
        }
    }

    fn run_one(fail: bool) -> (crate::StatsSnapshot, usize) {
        let service = Arc::new(ThreadedService::new(FixedBackend { fail }).unwrap());
        let (analyzer, queue) = FrameAnalyzer::new(service, AnalyzerSettings::default());
        let seen = Arc::new(Mutex::new(0usize));
        {
            let seen = seen.clone();
            analyzer.add_listener(move |_| *seen.lock().unwrap() += 1);
        }
        let frame = Frame::new(FrameId(1), vec![1u8; 16], 640, 480, 0).unwrap();
        assert_eq!(
            analyzer.submit(frame).unwrap(),
            SubmitOutcome::Submitted(RequestId(1))
        );
        assert!(analyzer.wait_idle(Duration::from_secs(5)));
        queue.dispatch_pending();
        let count = *seen.lock().unwrap();
        (analyzer.stats(), count)
    }

    #[test]
    fn threaded_service_delivers_detections() {
        let (stats, seen) = run_one(false);
        assert_eq!(stats.completed, 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn threaded_service_reports_failures() {
        let (stats, seen) = run_one(true);
        assert_eq!(stats.failed, 1);
        assert_eq!(seen, 0);
    }
}
