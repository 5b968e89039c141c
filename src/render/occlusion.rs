use image::RgbaImage;
use rand::Rng;

use crate::foundation::core::FrameSize;
use crate::foundation::rng::{RandomStream, uniform};
use crate::render::raster::{PixelRect, copy_region};

/// Exclusive upper bound on the number of occluders per run.
pub const MAX_OCCLUDERS: usize = 10;

/// Static occluders: scene patches pasted back over the moving object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OcclusionSet {
    boxes: Vec<PixelRect>,
}

impl OcclusionSet {
    /// Sample up to [`MAX_OCCLUDERS`] rectangles no larger than `max_size` inside `scene`.
    pub fn sample(scene: FrameSize, max_size: f64, rng: &mut RandomStream) -> Self {
        let max_size = max_size.clamp(0.0, f64::from(scene.min_side()));
        let count = rng.random_range(0..MAX_OCCLUDERS);
        let boxes = (0..count)
            .map(|_| {
                let x = uniform(rng, 0.0, f64::from(scene.width) - max_size);
                let y = uniform(rng, 0.0, f64::from(scene.height) - max_size);
                let w = uniform(rng, 0.0, max_size);
                let h = uniform(rng, 0.0, max_size);
                PixelRect {
                    x0: x as u32,
                    y0: y as u32,
                    x1: (x + w) as u32,
                    y1: (y + h) as u32,
                }
            })
            .collect();
        Self { boxes }
    }

    /// Explicit set of occluders.
    pub fn from_boxes(boxes: Vec<PixelRect>) -> Self {
        Self { boxes }
    }

    /// The sampled rectangles.
    pub fn boxes(&self) -> &[PixelRect] {
        &self.boxes
    }

    /// Copy every occluder's pixels from the untouched `source` scene onto `frame`.
    pub fn apply(&self, frame: &mut RgbaImage, source: &RgbaImage) {
        for b in &self.boxes {
            copy_region(frame, source, *b);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/occlusion.rs"]
mod tests;
