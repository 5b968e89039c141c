use crate::foundation::core::{Affine, FrameSize};
use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::{RandomStream, uniform};
use crate::transform::affine::{compose, rotate, scale, translate};
use crate::transform::path::PathSequence;

/// Operation a [`Transformation`] applies to its per-step path value.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", content = "matrix", rename_all = "snake_case")]
pub enum TransformOp {
    /// Scale along x by the path value.
    ScaleX,
    /// Scale along y by the path value.
    ScaleY,
    /// Rotate by the path value (radians).
    Rotate,
    /// Translate along x by the path value.
    TranslateX,
    /// Translate along y by the path value.
    TranslateY,
    /// Leaves content and shape untouched.
    IdentityShape,
    /// Fixed matrix, independent of the path value (used for bounds corrections).
    Fixed(Affine),
}

/// An operation bound to the path that drives it over time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transformation {
    #[serde(flatten)]
    op: TransformOp,
    path: PathSequence,
}

impl Transformation {
    /// Random cosine path between two ordered values drawn from `[a, b]`.
    pub fn bounded_random(
        op: TransformOp,
        a: f64,
        b: f64,
        steps: usize,
        rng: &mut RandomStream,
    ) -> TrackSimResult<Self> {
        let first = uniform(rng, a, b);
        let second = uniform(rng, a, b);
        let (alpha, beta) = if first > second {
            (second, first)
        } else {
            (first, second)
        };
        Ok(Self {
            op,
            path: PathSequence::cosine(alpha, beta, steps, rng)?,
        })
    }

    /// Bind `op` to a pre-computed path.
    pub fn with_path(op: TransformOp, path: PathSequence) -> Self {
        Self { op, path }
    }

    /// Constant correction matrix applied at every step.
    pub fn correction(matrix: Affine) -> Self {
        Self {
            op: TransformOp::Fixed(matrix),
            path: PathSequence::constant(0.0),
        }
    }

    /// The bound operation.
    pub fn op(&self) -> TransformOp {
        self.op
    }

    /// The driving path.
    pub fn path(&self) -> &PathSequence {
        &self.path
    }

    /// Number of steps the path covers (1 for constant paths).
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Always false for a constructed transformation.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Content matrix at `step`.
    pub fn content_at(&self, step: usize) -> TrackSimResult<Affine> {
        let v = self.path.value_at(step)?;
        Ok(match self.op {
            TransformOp::ScaleX => scale(v, 1.0),
            TransformOp::ScaleY => scale(1.0, v),
            TransformOp::Rotate => rotate(v),
            TransformOp::TranslateX => translate(v, 0.0),
            TransformOp::TranslateY => translate(0.0, v),
            TransformOp::IdentityShape => Affine::IDENTITY,
            TransformOp::Fixed(m) => m,
        })
    }

    /// Pixel size after applying this transformation as a shape (resize) operation at `step`.
    ///
    /// Scale operations resize their axis; every other operation keeps the size.
    pub fn shape_at(&self, size: FrameSize, step: usize) -> TrackSimResult<FrameSize> {
        let v = self.path.value_at(step)?;
        match self.op {
            TransformOp::ScaleX => Ok(FrameSize {
                width: scaled_side(size.width, v)?,
                ..size
            }),
            TransformOp::ScaleY => Ok(FrameSize {
                height: scaled_side(size.height, v)?,
                ..size
            }),
            _ => Ok(size),
        }
    }

    fn clamp_step(&self, step: usize) -> usize {
        step.min(self.path.len().saturating_sub(1))
    }
}

fn scaled_side(side: u32, factor: f64) -> TrackSimResult<u32> {
    let v = (f64::from(side) * factor).round();
    if !v.is_finite() || v < 1.0 || v > f64::from(u32::MAX) {
        return Err(TrackSimError::geometry(format!(
            "shape scale {factor} turns side {side} into an invalid size"
        )));
    }
    Ok(v as u32)
}

/// Compose every transformation at `step`, first to last.
///
/// Paths shorter than `step` hold their final value.
pub fn compose_at(transforms: &[Transformation], step: usize) -> TrackSimResult<Affine> {
    let matrices = transforms
        .iter()
        .map(|t| t.content_at(t.clamp_step(step)))
        .collect::<TrackSimResult<Vec<_>>>()?;
    Ok(compose(matrices))
}

/// Apply every shape transformation at `step` to `size`, first to last.
pub fn shape_at(
    transforms: &[Transformation],
    size: FrameSize,
    step: usize,
) -> TrackSimResult<FrameSize> {
    transforms
        .iter()
        .try_fold(size, |acc, t| t.shape_at(acc, t.clamp_step(step)))
}

#[cfg(test)]
#[path = "../../tests/unit/transform/transformation.rs"]
mod tests;
