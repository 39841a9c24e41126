// THEORY:
// The `frame` module bridges the acquisition collaborator and the analysis
// pipeline. A `FrameBuffer` is the raw, packed RGB image for one time step;
// it is owned by the current iteration and never retained by the core. The
// only transformation it offers is `luma_crop`: slicing the region of
// interest out of the frame and collapsing it to the luminance plane the
// background model learns on. Everything downstream of the crop works in
// ROI-local coordinates.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::region::Region;

const CHANNELS: u32 = 3;

/// A decoded RGB frame (8 bits per channel, row-major, tightly packed).
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * CHANNELS) as usize,
            "frame buffer length must equal width * height * 3"
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let index = ((y * self.width + x) * CHANNELS) as usize;
        Pixel::from(&self.data[index..index + CHANNELS as usize])
    }

    /// Extracts the luminance plane of the region's overlap with this frame.
    /// Returns `None` when the overlap is empty (degenerate crop); the caller
    /// must skip analysis for this frame.
    pub fn luma_crop(&self, region: &Region) -> Option<LumaGrid> {
        let (x0, y0, crop_width, crop_height) = region.clamped_to(self.width, self.height)?;

        let mut data = Vec::with_capacity((crop_width * crop_height) as usize);
        for y in y0..y0 + crop_height {
            for x in x0..x0 + crop_width {
                data.push(self.pixel(x, y).luminance() as f32);
            }
        }

        Some(LumaGrid {
            width: crop_width,
            height: crop_height,
            data,
        })
    }
}

/// A single-channel luminance image in ROI-local coordinates.
#[derive(Debug, Clone)]
pub struct LumaGrid {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl LumaGrid {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}
