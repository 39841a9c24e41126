// THEORY:
// The `pipeline` module is the final, top-level API for the sentry engine.
// It owns every piece of mutable detection state - the accepted region, the
// background statistics, the motion state machine, and the alert throttle -
// and threads one frame at a time through the full architectural stack:
// crop, blur, background subtraction, morphological cleanup, blob
// extraction, temporal decision, throttle.
//
// The pipeline never touches the wall clock and never performs a side
// effect. Callers supply a stream-relative timestamp with each frame and
// receive back a report: the blobs found this frame plus at most one
// throttled alert for a collaborator to act on.

use crate::core_modules::background::{BackgroundModel, DEFAULT_HISTORY};
use crate::core_modules::blob_extractor::blob_extractor;
use crate::core_modules::detection::DetectionStateMachine;
use crate::core_modules::filters;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::throttle::AlertThrottle;
use std::time::Duration;
use tracing::{debug, info, warn};

// Re-export key data structures for the public API.
pub use crate::config::SentryConfig;
pub use crate::core_modules::alert::{AlertEvent, Severity};
pub use crate::core_modules::blob_extractor::Blob;
pub use crate::core_modules::detection::MotionState;
pub use crate::core_modules::region::{InvalidRegion, Point, Region};

/// Why analysis did not run this frame. Both conditions are recoverable and
/// scoped to the single frame that hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No region of interest has been accepted yet.
    RegionUndefined,
    /// The region's overlap with the current frame is empty.
    DegenerateCrop,
}

/// The detailed data package for one analyzed frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Motion candidates that cleared the area threshold, in ROI-local
    /// coordinates.
    pub blobs: Vec<Blob>,
    /// The throttled alert for this frame, if one fired.
    pub alert: Option<AlertEvent>,
}

/// The primary output of the sentry pipeline for a single frame.
#[derive(Debug, Clone)]
pub enum FrameReport {
    Skipped(SkipReason),
    Analyzed(FrameAnalysis),
}

/// The main, top-level struct for the sentry engine.
pub struct SentryPipeline {
    config: SentryConfig,
    region: Option<Region>,
    background: BackgroundModel,
    state_machine: DetectionStateMachine,
    throttle: AlertThrottle,
}

impl SentryPipeline {
    pub fn new(config: SentryConfig) -> Self {
        let detect_duration = Duration::from_secs_f64(config.detect_duration);
        let min_interval = Duration::from_secs_f64(config.last_beep_time_threshold);
        Self {
            region: None,
            background: BackgroundModel::new(DEFAULT_HISTORY),
            state_machine: DetectionStateMachine::new(detect_duration),
            throttle: AlertThrottle::new(min_interval),
            config,
        }
    }

    pub fn config(&self) -> &SentryConfig {
        &self.config
    }

    /// The currently accepted region, or `None` while undefined.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn motion_state(&self) -> MotionState {
        self.state_machine.state()
    }

    /// Offers a new candidate rectangle from the selection UI. A rejected
    /// candidate leaves the current region untouched. Accepting a rectangle
    /// whose dimensions differ from the current one discards the background
    /// statistics; re-validating the active region is a no-op.
    pub fn set_region(
        &mut self,
        top_left: Point,
        bottom_right: Point,
    ) -> Result<Region, InvalidRegion> {
        let candidate = match Region::validate(top_left, bottom_right) {
            Ok(region) => region,
            Err(rejection) => {
                warn!(%rejection, "rejected region candidate");
                return Err(rejection);
            }
        };

        match self.region {
            Some(current) if current == candidate => return Ok(candidate),
            Some(current)
                if current.width() == candidate.width()
                    && current.height() == candidate.height() => {}
            _ => self.background.reset(),
        }

        info!(
            width = candidate.width(),
            height = candidate.height(),
            "region of interest accepted"
        );
        self.region = Some(candidate);
        Ok(candidate)
    }

    /// Processes one frame to completion at stream time `at`.
    pub fn process_frame(&mut self, frame: &FrameBuffer, at: Duration) -> FrameReport {
        let Some(region) = self.region else {
            return FrameReport::Skipped(SkipReason::RegionUndefined);
        };

        // Stage 1: ROI Crop
        let Some(crop) = frame.luma_crop(&region) else {
            debug!("degenerate crop, skipping frame");
            return FrameReport::Skipped(SkipReason::DegenerateCrop);
        };

        // Stage 2: Noise Suppression
        let smoothed = filters::gaussian_blur(
            &crop,
            self.config.gaussian_blur_kernel_size,
            self.config.gaussian_blur_sigma,
        );

        // Stage 3: Background Subtraction
        let mask = self.background.apply(&smoothed);

        // Stage 4: Morphological Cleanup
        let mask = filters::open(&mask);

        // Stage 5: Spatial Grouping
        let blobs = blob_extractor::extract(&mask, self.config.area_threshold);

        // Stage 6: Temporal Decision & Throttle
        let alert = self
            .state_machine
            .observe(!blobs.is_empty(), at)
            .filter(|_| self.throttle.should_fire(at))
            .map(|severity| AlertEvent { severity, at });

        if let Some(alert) = &alert {
            info!(
                severity = %alert.severity,
                at_secs = at.as_secs_f64(),
                "alert fired"
            );
        }

        FrameReport::Analyzed(FrameAnalysis { blobs, alert })
    }
}
