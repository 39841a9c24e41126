// THEORY:
// The `region` module defines the one piece of user-driven geometry in the
// system: the rectangular region of interest that confines every later stage
// of analysis. A `Region` can only be obtained through `validate`, so any
// `Region` held by the pipeline is known to enclose at least one pixel.
//
// Coordinates are signed because they arrive from a pointer-driven selection
// UI: a drag can end above or left of where it started, or outside the frame
// entirely. Validation only enforces ordering; reconciling the rectangle with
// the actual frame bounds is deferred to `clamped_to`, evaluated per frame.

use thiserror::Error;

/// A 2D point in frame coordinates. May lie outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A candidate rectangle that failed validation. The caller is expected to
/// keep its previous region (or none) when it sees this.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error(
    "invalid region: top-left ({}, {}) must lie strictly above and left of bottom-right ({}, {})",
    .top_left.x, .top_left.y, .bottom_right.x, .bottom_right.y
)]
pub struct InvalidRegion {
    pub top_left: Point,
    pub bottom_right: Point,
}

/// An axis-aligned rectangle with strictly positive width and height.
/// `bottom_right` is exclusive: a region from (0,0) to (1,1) covers one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    top_left: Point,
    bottom_right: Point,
}

impl Region {
    /// Accepts the candidate rectangle only if both width and height are
    /// strictly positive. Rejected candidates leave the caller's current
    /// region untouched by construction: no `Region` value is produced.
    pub fn validate(top_left: Point, bottom_right: Point) -> Result<Self, InvalidRegion> {
        if top_left.x < bottom_right.x && top_left.y < bottom_right.y {
            Ok(Self {
                top_left,
                bottom_right,
            })
        } else {
            Err(InvalidRegion {
                top_left,
                bottom_right,
            })
        }
    }

    /// Builds a region from already-ordered bounds. Used internally for
    /// bounding boxes derived from mask coordinates, which are ordered by
    /// construction.
    pub(crate) fn from_bounds(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        debug_assert!(x0 < x1 && y0 < y1);
        Self {
            top_left: Point::new(x0, y0),
            bottom_right: Point::new(x1, y1),
        }
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    pub fn width(&self) -> u32 {
        (self.bottom_right.x - self.top_left.x) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom_right.y - self.top_left.y) as u32
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Intersects the region with a `frame_width` x `frame_height` frame and
    /// returns the overlap as an (x, y, width, height) crop window, or `None`
    /// if the region lies entirely outside the frame.
    pub fn clamped_to(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.top_left.x.max(0);
        let y0 = self.top_left.y.max(0);
        let x1 = self.bottom_right.x.min(frame_width as i32);
        let y1 = self.bottom_right.y.min(frame_height as i32);

        if x0 < x1 && y0 < y1 {
            Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
        } else {
            None
        }
    }
}
