// THEORY:
// The `BlobExtractor` is the engine of the spatial grouping layer. It turns
// the binary foreground mask into a handful of coherent motion candidates.
//
// Key architectural principles & algorithm steps:
// 1.  **Connected Components**: A scan over the mask seeds a breadth-first
//     region growth at every unvisited foreground pixel, collecting all
//     pixels reachable through 8-connectivity into one component. Diagonal
//     adjacency counts, matching external-contour discovery over an opened
//     mask.
// 2.  **Area Filtering**: A component's area is its foreground pixel count.
//     Components whose area is less than or equal to the caller's threshold
//     are discarded; everything that remains is a motion candidate.
// 3.  **Data Aggregation**: Retained components are summarized by their
//     axis-aligned bounding box in ROI-local coordinates.
// 4.  **Stateless Utility**: `extract` takes the mask for a single frame and
//     produces blobs for that same frame. It has no memory of previous
//     frames, and the order of the returned blobs is unspecified.

use crate::core_modules::background::ForegroundMask;
use crate::core_modules::region::Region;

/// A connected foreground region that cleared the area threshold. Produced
/// fresh each frame, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Foreground pixel count of the component.
    pub area: f64,
    /// Axis-aligned bounding box in ROI-local coordinates (exclusive
    /// bottom-right).
    pub bounding_box: Region,
}

pub mod blob_extractor {
    use super::*;

    /// The main function of the spatial analysis layer. Labels the connected
    /// foreground components of `mask` and returns those whose area exceeds
    /// `area_threshold`.
    pub fn extract(mask: &ForegroundMask, area_threshold: f64) -> Vec<Blob> {
        let width = mask.width();
        let height = mask.height();
        let mut visited = vec![false; (width * height) as usize];
        let mut blobs = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                if visited[index] || !mask.is_foreground(x, y) {
                    continue;
                }

                visited[index] = true;
                let blob = grow_component(x, y, mask, &mut visited);
                if blob.area > area_threshold {
                    blobs.push(blob);
                }
            }
        }

        blobs
    }

    /// Performs a breadth-first search to collect one connected component,
    /// aggregating its pixel count and bounding box as it grows.
    fn grow_component(
        seed_x: u32,
        seed_y: u32,
        mask: &ForegroundMask,
        visited: &mut [bool],
    ) -> Blob {
        let width = mask.width() as i32;
        let height = mask.height() as i32;

        let mut queue: Vec<(u32, u32)> = vec![(seed_x, seed_y)];
        let mut pixel_count = 0usize;
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;

        while let Some((x, y)) = queue.pop() {
            pixel_count += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            // All 8 neighbors, diagonals included.
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }

                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width || ny >= height {
                        continue;
                    }

                    let neighbor_index = (ny * width + nx) as usize;
                    if !visited[neighbor_index] && mask.is_foreground(nx as u32, ny as u32) {
                        visited[neighbor_index] = true;
                        queue.push((nx as u32, ny as u32));
                    }
                }
            }
        }

        Blob {
            area: pixel_count as f64,
            bounding_box: Region::from_bounds(
                min_x as i32,
                min_y as i32,
                (max_x + 1) as i32,
                (max_y + 1) as i32,
            ),
        }
    }
}
