// THEORY:
// The `BackgroundModel` is the heart of the temporal analysis layer. It is a
// stateful, learning entity responsible for the pixels inside the current
// region of interest. Its job is to observe the stream of luminance crops
// over time, learn what the static scene looks like, and flag the pixels of
// the current crop that deviate from that learned background.
//
// Key architectural principles:
// 1.  **Per-Pixel Statistics**: Each ROI pixel carries an exponentially
//     weighted running mean and variance of its luminance. The learning rate
//     is `1 / history`, so a window of roughly `history` frames dominates
//     the estimate.
// 2.  **Adaptive Thresholding**: A pixel is foreground when its squared
//     deviation from the learned mean exceeds `VARIANCE_THRESHOLD` times the
//     learned variance. Noisy pixels earn wide variances and stay quiet;
//     stable pixels react to small changes.
// 3.  **Selective Update**: Only pixels classified as background feed their
//     statistics. A moving object therefore cannot teach itself into the
//     background within a few frames, which is what keeps "sustained motion"
//     detectable for as long as it lasts.
// 4.  **ROI-Scoped Lifetime**: The statistics are meaningful only for the
//     exact crop dimensions they were learned on. Whenever the crop
//     dimensions change, the model reinitializes from the next frame it
//     sees. The frame after a reset is always reported as all-background.
//
// There is no separate shadow class: the mask is strictly binary, matching a
// subtractor configured without shadow detection.

use crate::core_modules::frame::LumaGrid;
use tracing::debug;

/// Frames of history that dominate the running statistics.
pub const DEFAULT_HISTORY: u32 = 100;

/// Multiplier on the learned variance when testing squared deviation.
const VARIANCE_THRESHOLD: f64 = 16.0;
/// Variance assigned to every pixel at (re)initialization.
const INITIAL_VARIANCE: f64 = 225.0;
/// Floor that keeps a perfectly static pixel from locking up the gate.
const MIN_VARIANCE: f64 = 4.0;

const FOREGROUND: u8 = 255;

/// A binary image marking the crop pixels that differ from the learned
/// background. Same dimensions as the crop, one byte per pixel, 255 when
/// foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ForegroundMask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize] == FOREGROUND
    }

    pub fn set_foreground(&mut self, x: u32, y: u32) {
        self.data[(y * self.width + x) as usize] = FOREGROUND;
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&value| value == FOREGROUND).count()
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

/// Adaptive per-pixel background estimator scoped to the current ROI crop.
pub struct BackgroundModel {
    width: u32,
    height: u32,
    mean: Vec<f64>,
    variance: Vec<f64>,
    learning_rate: f64,
}

impl BackgroundModel {
    pub fn new(history: u32) -> Self {
        Self {
            width: 0,
            height: 0,
            mean: Vec::new(),
            variance: Vec::new(),
            learning_rate: 1.0 / history.max(1) as f64,
        }
    }

    /// Discards all learned statistics. The next crop reinitializes the
    /// model regardless of its dimensions.
    pub fn reset(&mut self) {
        self.width = 0;
        self.height = 0;
        self.mean.clear();
        self.variance.clear();
        debug!("background model reset");
    }

    pub fn is_initialized(&self) -> bool {
        !self.mean.is_empty()
    }

    /// Classifies every crop pixel as foreground or background, then folds
    /// the background pixels into the running statistics. A crop whose
    /// dimensions differ from the learned ones reinitializes the model and
    /// reports all-background.
    pub fn apply(&mut self, crop: &LumaGrid) -> ForegroundMask {
        if self.width != crop.width || self.height != crop.height {
            self.initialize(crop);
            return ForegroundMask::new(crop.width, crop.height);
        }

        let mut mask = ForegroundMask::new(crop.width, crop.height);
        for index in 0..self.mean.len() {
            let value = crop.data[index] as f64;
            let delta = value - self.mean[index];

            if delta * delta > VARIANCE_THRESHOLD * self.variance[index] {
                let x = index as u32 % crop.width;
                let y = index as u32 / crop.width;
                mask.set_foreground(x, y);
            } else {
                self.mean[index] += self.learning_rate * delta;
                self.variance[index] = (self.variance[index]
                    + self.learning_rate * (delta * delta - self.variance[index]))
                    .max(MIN_VARIANCE);
            }
        }
        mask
    }

    fn initialize(&mut self, crop: &LumaGrid) {
        self.width = crop.width;
        self.height = crop.height;
        self.mean = crop.data.iter().map(|&value| value as f64).collect();
        self.variance = vec![INITIAL_VARIANCE; crop.data.len()];
        debug!(
            width = crop.width,
            height = crop.height,
            "background model initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_grid(width: u32, height: u32, value: f32) -> LumaGrid {
        LumaGrid {
            width,
            height,
            data: vec![value; (width * height) as usize],
        }
    }

    #[test]
    fn first_crop_initializes_and_reports_background() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        let mask = model.apply(&flat_grid(8, 8, 40.0));
        assert!(model.is_initialized());
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn deviation_beyond_gate_is_foreground() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        model.apply(&flat_grid(8, 8, 40.0));

        // One bright pixel against the learned background.
        let mut grid = flat_grid(8, 8, 40.0);
        grid.data[9] = 250.0;
        let mask = model.apply(&grid);

        assert_eq!(mask.foreground_count(), 1);
        assert!(mask.is_foreground(1, 1));
    }

    #[test]
    fn small_deviation_stays_background() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        model.apply(&flat_grid(8, 8, 40.0));

        // Within the initial gate: sqrt(16 * 225) = 60 luminance units.
        let mask = model.apply(&flat_grid(8, 8, 70.0));
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn foreground_does_not_absorb_into_background() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        model.apply(&flat_grid(4, 4, 0.0));

        // A persistently bright crop keeps flagging; the selective update
        // never feeds foreground pixels back into the statistics.
        for _ in 0..50 {
            let mask = model.apply(&flat_grid(4, 4, 255.0));
            assert_eq!(mask.foreground_count(), 16);
        }
    }

    #[test]
    fn dimension_change_reinitializes() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        model.apply(&flat_grid(8, 8, 0.0));

        // New dimensions: stale statistics must not leak, so even a bright
        // crop reads as background on the reinitializing frame.
        let mask = model.apply(&flat_grid(6, 8, 255.0));
        assert_eq!(mask.foreground_count(), 0);
        // The frame after that is judged against the new statistics.
        let mask = model.apply(&flat_grid(6, 8, 0.0));
        assert_eq!(mask.foreground_count(), 48);
    }

    #[test]
    fn reset_discards_statistics() {
        let mut model = BackgroundModel::new(DEFAULT_HISTORY);
        model.apply(&flat_grid(8, 8, 0.0));
        model.reset();
        assert!(!model.is_initialized());

        let mask = model.apply(&flat_grid(8, 8, 255.0));
        assert_eq!(mask.foreground_count(), 0);
    }
}
