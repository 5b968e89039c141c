//! Hand-tuned trajectories used when no trajectory model is supplied.

use std::f64::consts::PI;

use rand::Rng;

use crate::foundation::core::{FrameSize, Point, Size};
use crate::foundation::error::TrackSimResult;
use crate::foundation::rng::{RandomStream, uniform};
use crate::transform::path::PathSequence;
use crate::transform::transformation::{TransformOp, Transformation};

/// Object motion: mild independent scaling and rotation, translation within the view.
pub fn default_object_transforms(
    object: FrameSize,
    limits: FrameSize,
    steps: usize,
    rng: &mut RandomStream,
) -> TrackSimResult<Vec<Transformation>> {
    let side = f64::from(object.max_side());
    let max_x = f64::from(limits.width) - side;
    let max_y = f64::from(limits.height) - side;
    Ok(vec![
        Transformation::bounded_random(TransformOp::ScaleX, 0.7, 1.3, steps, rng)?,
        Transformation::bounded_random(TransformOp::ScaleY, 0.7, 1.3, steps, rng)?,
        Transformation::bounded_random(TransformOp::Rotate, -PI / 50.0, PI / 50.0, steps, rng)?,
        Transformation::bounded_random(TransformOp::TranslateX, 0.0, max_x, steps, rng)?,
        Transformation::bounded_random(TransformOp::TranslateY, 0.0, max_y, steps, rng)?,
    ])
}

/// Constant-speed pan between two points in the central 60% of the scene, with a cosine wave
/// on the other axis.
#[derive(Clone, Debug)]
pub struct BoundedTrajectory {
    x: PathSequence,
    y: PathSequence,
}

impl BoundedTrajectory {
    /// Sample a trajectory over `steps` steps inside `scene`.
    pub fn sample(scene: Size, steps: usize, rng: &mut RandomStream) -> TrackSimResult<Self> {
        let (w, h) = (scene.width, scene.height);
        let start = Point::new(uniform(rng, 0.2 * w, 0.8 * w), uniform(rng, 0.2 * h, 0.8 * h));
        let end = Point::new(uniform(rng, 0.2 * w, 0.8 * w), uniform(rng, 0.2 * h, 0.8 * h));
        tracing::debug!(?start, ?end, "bounded trajectory");

        let (x, y) = if rng.random::<f64>() > 0.5 {
            // Horizontal steps, vertical wave.
            (
                PathSequence::linear(start.x, end.x, steps)?,
                PathSequence::cosine(start.y, end.y, steps, rng)?,
            )
        } else {
            (
                PathSequence::cosine(start.x, end.x, steps, rng)?,
                PathSequence::linear(start.y, end.y, steps)?,
            )
        };
        Ok(Self { x, y })
    }

    /// Position at `step`.
    pub fn coord(&self, step: usize) -> TrackSimResult<Point> {
        Ok(Point::new(self.x.value_at(step)?, self.y.value_at(step)?))
    }

    /// Translation transformations following this path.
    pub fn transforms(&self) -> Vec<Transformation> {
        vec![
            Transformation::with_path(TransformOp::TranslateX, self.x.clone()),
            Transformation::with_path(TransformOp::TranslateY, self.y.clone()),
        ]
    }
}

/// Small jitter around the origin: rotation within ±15°, scale 0.8–1.0, translation within half
/// of `reference` on each axis.
pub fn offset_transforms(
    reference: Size,
    steps: usize,
    rng: &mut RandomStream,
) -> TrackSimResult<Vec<Transformation>> {
    let (hx, hy) = (reference.width / 2.0, reference.height / 2.0);
    tracing::debug!(
        translation = ?(-hx, -hy, hx, hy),
        rotation = PI / 12.0,
        "offset trajectory bounds"
    );
    Ok(vec![
        Transformation::bounded_random(TransformOp::Rotate, -PI / 12.0, PI / 12.0, steps, rng)?,
        Transformation::bounded_random(TransformOp::ScaleX, 0.8, 1.0, steps, rng)?,
        Transformation::bounded_random(TransformOp::ScaleY, 0.8, 1.0, steps, rng)?,
        Transformation::bounded_random(TransformOp::TranslateX, -hx, hx, steps, rng)?,
        Transformation::bounded_random(TransformOp::TranslateY, -hy, hy, steps, rng)?,
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/presets.rs"]
mod tests;
