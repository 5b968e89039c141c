use crate::foundation::error::{TrackSimError, TrackSimResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Pixel dimensions of a scene, object or camera view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Build a size, rejecting zero-sized dimensions.
    pub fn new(width: u32, height: u32) -> TrackSimResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackSimError::validation(format!(
                "frame size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Round odd dimensions up to the next even value (video tooling expects even sizes).
    pub fn even(self) -> Self {
        Self {
            width: self.width + self.width % 2,
            height: self.height + self.height % 2,
        }
    }

    /// Smallest of the two sides.
    pub fn min_side(self) -> u32 {
        self.width.min(self.height)
    }

    /// Largest of the two sides.
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }

    /// Size as floating point extents.
    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Corners of the `[0,w]x[0,h]` rectangle in clockwise order starting at the origin.
    pub fn corners(self) -> [Point; 4] {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }
}

/// Axis-aligned ground-truth box in frame coordinates.
///
/// Always satisfies `x1 <= x2` and `y1 <= y2` when built through
/// [`BoundingBox::from_points_clipped`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl BoundingBox {
    /// Bounding box of `points` clipped to the pixel grid of `clip` (`[0, w-1] x [0, h-1]`).
    pub fn from_points_clipped(points: &[Point], clip: FrameSize) -> Self {
        let extent = points_extent(points);
        let max_x = f64::from(clip.width.saturating_sub(1));
        let max_y = f64::from(clip.height.saturating_sub(1));

        let x1 = extent.x0.clamp(0.0, max_x);
        let y1 = extent.y0.clamp(0.0, max_y);
        Self {
            x1,
            y1,
            x2: extent.x1.clamp(x1, max_x),
            y2: extent.y1.clamp(y1, max_y),
        }
    }

    /// Box width.
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Box height.
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// `[x1, y1, x2, y2]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// As a `kurbo` rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2, self.y2)
    }

    /// Ground-truth line `x1,y1,x2,y2` with truncated integer coordinates.
    pub fn to_csv_line(&self) -> String {
        let [x1, y1, x2, y2] = self.to_array().map(|v| v as i64);
        format!("{x1},{y1},{x2},{y2}")
    }
}

/// Axis-aligned extent of a point set. Empty input yields a zero rectangle.
pub(crate) fn points_extent(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    points
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
