use crate::core_modules::alert::{AlertEvent, AlertSink};
use crate::core_modules::frame::FrameBuffer;
use crate::pipeline::{FrameReport, SentryPipeline, SkipReason};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

struct SlotState {
    frame: Option<(FrameBuffer, Duration)>,
    dropped: u64,
    closed: bool,
}

/// Single-slot frame handoff between the acquisition side and the detection
/// worker. Latest frame wins: publishing over an unconsumed frame replaces
/// it, because freshness matters more than completeness.
#[derive(Clone)]
pub struct FrameSlot {
    state: Arc<Mutex<SlotState>>,
    notify: Arc<Notify>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState {
                frame: None,
                dropped: 0,
                closed: false,
            })),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Offers a frame to the worker, replacing any unconsumed one.
    pub fn publish(&self, frame: FrameBuffer, at: Duration) {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return;
            }
            if state.frame.replace((frame, at)).is_some() {
                state.dropped += 1;
                debug!(dropped = state.dropped, "dropped unconsumed frame");
            }
        }
        self.notify.notify_one();
    }

    /// Closes the slot; the worker drains any pending frame and exits.
    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
        self.notify.notify_one();
    }

    /// Waits for the next frame. Returns `None` once the slot is closed and
    /// drained.
    pub async fn recv(&self) -> Option<(FrameBuffer, Duration)> {
        loop {
            {
                let mut state = self.state.lock().unwrap();
                if let Some(frame) = state.frame.take() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Frames replaced before the worker could consume them.
    pub fn dropped(&self) -> u64 {
        self.state.lock().unwrap().dropped
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire-and-forget alert delivery. Events are queued on an unbounded channel
/// and each delivery runs in its own task, so a slow sink never blocks the
/// detection loop. An event is dispatched no earlier than the frame that
/// requested it; nothing else about ordering is guaranteed.
pub struct AlertDispatcher {
    sender: mpsc::UnboundedSender<AlertEvent>,
    drain: JoinHandle<()>,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<AlertEvent>();

        let drain = tokio::spawn(async move {
            let mut deliveries: Vec<JoinHandle<()>> = Vec::new();
            while let Some(event) = receiver.recv().await {
                deliveries.retain(|delivery| !delivery.is_finished());
                let sink = Arc::clone(&sink);
                deliveries.push(tokio::spawn(async move {
                    sink.deliver(&event);
                }));
            }
            // Channel closed: let outstanding side effects finish.
            join_all(deliveries).await;
        });

        Self { sender, drain }
    }

    pub fn dispatch(&self, event: AlertEvent) {
        let _ = self.sender.send(event);
    }

    /// Stops accepting events and waits for in-flight deliveries.
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.drain.await;
    }
}

/// The live detection loop: one worker task owning all mutable pipeline
/// state, fed through a `FrameSlot`, publishing per-frame reports on a watch
/// channel and alerts through an `AlertDispatcher`.
pub struct LiveDetector {
    slot: FrameSlot,
    reports: watch::Receiver<FrameReport>,
    worker: JoinHandle<SentryPipeline>,
    dispatcher: AlertDispatcher,
}

impl LiveDetector {
    pub fn spawn(pipeline: SentryPipeline, sink: Arc<dyn AlertSink>) -> Self {
        let slot = FrameSlot::new();
        let dispatcher = AlertDispatcher::new(sink);
        let (report_sender, reports) =
            watch::channel(FrameReport::Skipped(SkipReason::RegionUndefined));

        let worker_slot = slot.clone();
        let alert_sender = dispatcher.sender.clone();
        let worker = tokio::spawn(async move {
            let mut pipeline = pipeline;
            while let Some((frame, at)) = worker_slot.recv().await {
                let report = pipeline.process_frame(&frame, at);
                if let FrameReport::Analyzed(analysis) = &report {
                    if let Some(alert) = analysis.alert {
                        let _ = alert_sender.send(alert);
                    }
                }
                let _ = report_sender.send(report);
            }
            pipeline
        });

        Self {
            slot,
            reports,
            worker,
            dispatcher,
        }
    }

    /// Hands the latest frame to the worker without blocking.
    pub fn feed(&self, frame: FrameBuffer, at: Duration) {
        self.slot.publish(frame, at);
    }

    /// A receiver over the most recent per-frame report.
    pub fn reports(&self) -> watch::Receiver<FrameReport> {
        self.reports.clone()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.slot.dropped()
    }

    /// Drains the slot, stops the worker, and waits for outstanding alert
    /// deliveries. Returns the pipeline so its final state can be inspected.
    pub async fn shutdown(self) -> Result<SentryPipeline, &'static str> {
        self.slot.close();
        let pipeline = self
            .worker
            .await
            .map_err(|_| "detection worker panicked")?;
        self.dispatcher.shutdown().await;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::region::Point;
    use crate::pipeline::SentryConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    fn solid_frame(width: u32, height: u32, value: u8) -> FrameBuffer {
        FrameBuffer::new(width, height, vec![value; (width * height * 3) as usize])
    }

    struct CountingSink {
        delivered: AtomicUsize,
    }

    impl AlertSink for CountingSink {
        fn deliver(&self, _event: &AlertEvent) {
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn slot_keeps_only_the_latest_frame() {
        let slot = FrameSlot::new();
        slot.publish(solid_frame(4, 4, 10), secs(1));
        slot.publish(solid_frame(4, 4, 20), secs(2));

        let (frame, at) = slot.recv().await.unwrap();
        assert_eq!(at, secs(2));
        assert_eq!(frame.data()[0], 20);
        assert_eq!(slot.dropped(), 1);
    }

    #[tokio::test]
    async fn closed_slot_drains_then_ends() {
        let slot = FrameSlot::new();
        slot.publish(solid_frame(4, 4, 10), secs(1));
        slot.close();

        assert!(slot.recv().await.is_some());
        assert!(slot.recv().await.is_none());
        // Publishing after close is ignored.
        slot.publish(solid_frame(4, 4, 20), secs(2));
        assert!(slot.recv().await.is_none());
    }

    #[tokio::test]
    async fn dispatcher_delivers_every_event_before_shutdown() {
        let sink = Arc::new(CountingSink {
            delivered: AtomicUsize::new(0),
        });
        let dispatcher = AlertDispatcher::new(sink.clone());

        for t in 0..5 {
            dispatcher.dispatch(AlertEvent {
                severity: crate::pipeline::Severity::Transient,
                at: secs(t),
            });
        }
        dispatcher.shutdown().await;

        assert_eq!(sink.delivered.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn live_detector_runs_the_pipeline_and_dispatches() {
        let config = SentryConfig {
            area_threshold: 50.0,
            detect_duration: 3.0,
            last_beep_time_threshold: 5.0,
            gaussian_blur_kernel_size: 1,
            ..SentryConfig::default()
        };
        let mut pipeline = SentryPipeline::new(config);
        pipeline
            .set_region(Point::new(5, 5), Point::new(35, 35))
            .unwrap();

        let sink = Arc::new(CountingSink {
            delivered: AtomicUsize::new(0),
        });
        let detector = LiveDetector::spawn(pipeline, sink.clone());
        let mut reports = detector.reports();

        // Background frame first, then a frame with a bright block in the
        // region. Awaiting each report keeps the handoff deterministic.
        detector.feed(solid_frame(40, 40, 0), secs(0));
        reports.changed().await.unwrap();

        let mut bright = vec![0u8; 40 * 40 * 3];
        for y in 10..25 {
            for x in 10..25 {
                let index = (y * 40 + x) * 3;
                bright[index..index + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        detector.feed(FrameBuffer::new(40, 40, bright), secs(1));
        reports.changed().await.unwrap();

        let report = reports.borrow().clone();
        let FrameReport::Analyzed(analysis) = report else {
            panic!("expected an analyzed frame");
        };
        assert_eq!(analysis.blobs.len(), 1);
        assert!(analysis.alert.is_some());

        let pipeline = detector.shutdown().await.unwrap();
        assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
        assert!(pipeline.region().is_some());
    }
}
