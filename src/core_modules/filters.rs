// THEORY:
// The `filters` module holds the two stateless image-cleaning passes that
// bracket background subtraction: a separable Gaussian blur applied to the
// luminance crop before classification, and a morphological opening applied
// to the foreground mask after it. The blur suppresses sensor noise so the
// per-pixel statistics learn the scene and not the sensor; the opening
// removes speckle from the mask without shaving genuine moving regions below
// the area threshold.

use crate::core_modules::background::ForegroundMask;
use crate::core_modules::frame::LumaGrid;

/// Radius of the fixed square structuring element used by `open` (5x5).
const STRUCTURING_RADIUS: i32 = 2;

/// Smooths the grid with a separable Gaussian kernel. `kernel_size` must be
/// a positive odd integer; a size of 1 is a no-op. A non-positive `sigma`
/// derives the deviation from the kernel size.
pub fn gaussian_blur(grid: &LumaGrid, kernel_size: u32, sigma: f64) -> LumaGrid {
    if kernel_size <= 1 {
        return grid.clone();
    }
    debug_assert!(kernel_size % 2 == 1, "blur kernel size must be odd");

    let kernel = gaussian_kernel(kernel_size, sigma);
    let half = (kernel.len() / 2) as i32;
    let width = grid.width as i32;
    let height = grid.height as i32;

    // Horizontal pass, then vertical pass over the intermediate. Samples
    // beyond an edge clamp to the nearest in-bounds sample.
    let mut horizontal = vec![0.0f32; grid.data.len()];
    for y in 0..height {
        for x in 0..width {
            let mut accumulator = 0.0f32;
            for (tap, weight) in kernel.iter().enumerate() {
                let sample_x = (x + tap as i32 - half).clamp(0, width - 1);
                accumulator += weight * grid.data[(y * width + sample_x) as usize];
            }
            horizontal[(y * width + x) as usize] = accumulator;
        }
    }

    let mut smoothed = vec![0.0f32; grid.data.len()];
    for y in 0..height {
        for x in 0..width {
            let mut accumulator = 0.0f32;
            for (tap, weight) in kernel.iter().enumerate() {
                let sample_y = (y + tap as i32 - half).clamp(0, height - 1);
                accumulator += weight * horizontal[(sample_y * width + x) as usize];
            }
            smoothed[(y * width + x) as usize] = accumulator;
        }
    }

    LumaGrid {
        width: grid.width,
        height: grid.height,
        data: smoothed,
    }
}

fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size - 1) as f64 * 0.5 - 1.0) + 0.8
    };

    let half = (size / 2) as i32;
    let mut kernel = Vec::with_capacity(size as usize);
    for tap in -half..=half {
        let distance = tap as f64;
        kernel.push((-(distance * distance) / (2.0 * sigma * sigma)).exp());
    }

    let total: f64 = kernel.iter().sum();
    kernel.iter().map(|weight| (weight / total) as f32).collect()
}

/// Morphological opening: erosion followed by dilation with a fixed 5x5
/// structuring element.
pub fn open(mask: &ForegroundMask) -> ForegroundMask {
    dilate(&erode(mask))
}

fn erode(mask: &ForegroundMask) -> ForegroundMask {
    let mut eroded = ForegroundMask::new(mask.width(), mask.height());
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if mask.is_foreground(x, y) && neighborhood_all_foreground(mask, x, y) {
                eroded.set_foreground(x, y);
            }
        }
    }
    eroded
}

fn dilate(mask: &ForegroundMask) -> ForegroundMask {
    let mut dilated = ForegroundMask::new(mask.width(), mask.height());
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if neighborhood_any_foreground(mask, x, y) {
                dilated.set_foreground(x, y);
            }
        }
    }
    dilated
}

fn neighborhood_all_foreground(mask: &ForegroundMask, x: u32, y: u32) -> bool {
    for dy in -STRUCTURING_RADIUS..=STRUCTURING_RADIUS {
        for dx in -STRUCTURING_RADIUS..=STRUCTURING_RADIUS {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            // Out-of-bounds neighbors do not veto border pixels.
            if nx < 0 || ny < 0 || nx >= mask.width() as i32 || ny >= mask.height() as i32 {
                continue;
            }
            if !mask.is_foreground(nx as u32, ny as u32) {
                return false;
            }
        }
    }
    true
}

fn neighborhood_any_foreground(mask: &ForegroundMask, x: u32, y: u32) -> bool {
    for dy in -STRUCTURING_RADIUS..=STRUCTURING_RADIUS {
        for dx in -STRUCTURING_RADIUS..=STRUCTURING_RADIUS {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= mask.width() as i32 || ny >= mask.height() as i32 {
                continue;
            }
            if mask.is_foreground(nx as u32, ny as u32) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from(width: u32, height: u32, data: Vec<f32>) -> LumaGrid {
        LumaGrid {
            width,
            height,
            data,
        }
    }

    #[test]
    fn kernel_size_one_is_a_no_op() {
        let grid = grid_from(3, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let blurred = gaussian_blur(&grid, 1, 10.0);
        assert_eq!(blurred.data, grid.data);
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let grid = grid_from(9, 9, vec![120.0; 81]);
        let blurred = gaussian_blur(&grid, 5, 2.0);
        for value in &blurred.data {
            assert!((value - 120.0).abs() < 1e-3);
        }
    }

    #[test]
    fn blur_spreads_an_impulse_symmetrically() {
        let mut data = vec![0.0f32; 49];
        data[3 * 7 + 3] = 100.0;
        let blurred = gaussian_blur(&grid_from(7, 7, data), 3, 1.0);

        let center = blurred.get(3, 3);
        assert!(center > 0.0 && center < 100.0);
        assert!((blurred.get(2, 3) - blurred.get(4, 3)).abs() < 1e-4);
        assert!((blurred.get(3, 2) - blurred.get(3, 4)).abs() < 1e-4);
        // Normalized taps conserve total energy away from edges.
        let total: f32 = blurred.data.iter().sum();
        assert!((total - 100.0).abs() < 1e-2);
    }

    fn mask_with(width: u32, height: u32, foreground: &[(u32, u32)]) -> ForegroundMask {
        let mut mask = ForegroundMask::new(width, height);
        for &(x, y) in foreground {
            mask.set_foreground(x, y);
        }
        mask
    }

    #[test]
    fn opening_removes_isolated_speckle() {
        let mask = mask_with(16, 16, &[(5, 5), (12, 3)]);
        assert_eq!(open(&mask).foreground_count(), 0);
    }

    #[test]
    fn opening_preserves_solid_regions() {
        let mut cells = Vec::new();
        for y in 4..14 {
            for x in 4..14 {
                cells.push((x, y));
            }
        }
        let mask = mask_with(20, 20, &cells);
        let opened = open(&mask);

        // A 10x10 block survives a 5x5 opening intact.
        assert_eq!(opened.foreground_count(), 100);
        for &(x, y) in &cells {
            assert!(opened.is_foreground(x, y));
        }
    }
}
