//! Worst-case fitting of a trajectory inside frame limits.
//!
//! The correction is global: one uniform shrink and one translation, computed from the extent
//! the reference shape covers over every step, keep the whole trajectory inside the limits.

use rand::Rng;

use crate::foundation::core::{Point, Rect, Size, Vec2, points_extent};
use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::RandomStream;
use crate::transform::affine::{apply_to_points, scale, translate};
use crate::transform::transformation::{Transformation, compose_at};

/// Safety margin applied on top of the minimal shrink factor.
pub const SHRINK_MARGIN: f64 = 0.9;

const FIT_TOLERANCE: f64 = 1e-6;

/// Fits transformation lists so a reference shape stays within `[0, w] x [0, h]`.
#[derive(Clone, Debug)]
pub struct BoundsCorrector<'a> {
    reference: &'a [Point],
    limits: Size,
    steps: usize,
}

impl<'a> BoundsCorrector<'a> {
    /// Corrector for `reference` points over steps `0..steps` against `limits`.
    pub fn new(reference: &'a [Point], limits: Size, steps: usize) -> TrackSimResult<Self> {
        if reference.is_empty() {
            return Err(TrackSimError::validation("reference shape has no points"));
        }
        if steps == 0 {
            return Err(TrackSimError::validation("bounds correction needs at least one step"));
        }
        if !(limits.width > 0.0 && limits.height > 0.0)
            || !limits.width.is_finite()
            || !limits.height.is_finite()
        {
            return Err(TrackSimError::validation(format!(
                "bounds limits must be finite and positive, got {limits:?}"
            )));
        }
        Ok(Self {
            reference,
            limits,
            steps,
        })
    }

    /// Extent covered by the transformed reference across all steps.
    pub fn worst_case(&self, transforms: &[Transformation]) -> TrackSimResult<Rect> {
        let mut points = Vec::with_capacity(self.reference.len() * self.steps);
        for step in 0..self.steps {
            let m = compose_at(transforms, step)?;
            points.extend(apply_to_points(m, self.reference));
        }
        let extent = points_extent(&points);
        if !(extent.x0.is_finite()
            && extent.y0.is_finite()
            && extent.x1.is_finite()
            && extent.y1.is_finite())
        {
            return Err(TrackSimError::geometry(format!(
                "trajectory extent is not finite: {extent:?}"
            )));
        }
        Ok(extent)
    }

    /// Uniform shrink factor making the worst-case extent fit; `1.0` when it already fits.
    pub fn scale_correction(&self, transforms: &[Transformation]) -> TrackSimResult<f64> {
        let extent = self.worst_case(transforms)?;
        let size = extent.size();
        tracing::debug!(?extent, ?size, limits = ?self.limits, "scale correction input");
        if size.width < self.limits.width && size.height < self.limits.height {
            return Ok(1.0);
        }
        let ratio = (self.limits.width / size.width).min(self.limits.height / size.height);
        let factor = SHRINK_MARGIN * ratio;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(TrackSimError::geometry(format!(
                "cannot derive a shrink factor for extent {size:?} within {:?}",
                self.limits
            )));
        }
        tracing::debug!(factor, "scale correction");
        Ok(factor)
    }

    /// Offset moving the worst-case extent to a random admissible position; zero when the
    /// extent is already strictly inside the limits.
    pub fn translation_correction(
        &self,
        transforms: &[Transformation],
        rng: &mut RandomStream,
    ) -> TrackSimResult<Vec2> {
        let extent = self.worst_case(transforms)?;
        if self.strictly_inside(extent) {
            return Ok(Vec2::ZERO);
        }
        let gap = Size::new(
            self.limits.width - extent.width(),
            self.limits.height - extent.height(),
        );
        if gap.width < 0.0 || gap.height < 0.0 {
            return Err(TrackSimError::geometry(format!(
                "extent {:?} is larger than limits {:?}; apply scale correction first",
                extent.size(),
                self.limits
            )));
        }
        let target = Point::new(
            rng.random_range(0..=gap.width.floor() as u64) as f64,
            rng.random_range(0..=gap.height.floor() as u64) as f64,
        );
        let offset = target - extent.origin();
        tracing::debug!(?gap, ?target, ?offset, "translation correction");
        Ok(offset)
    }

    /// Append the scale and then the translation correction that keep `transforms` in bounds.
    pub fn fit(
        &self,
        mut transforms: Vec<Transformation>,
        rng: &mut RandomStream,
    ) -> TrackSimResult<Vec<Transformation>> {
        let factor = self.scale_correction(&transforms)?;
        if factor != 1.0 {
            transforms.push(Transformation::correction(scale(factor, factor)));
        }
        let offset = self.translation_correction(&transforms, rng)?;
        if offset != Vec2::ZERO {
            transforms.push(Transformation::correction(translate(offset.x, offset.y)));
        }

        let extent = self.worst_case(&transforms)?;
        if !self.within(extent, FIT_TOLERANCE) {
            tracing::warn!(
                ?extent,
                limits = ?self.limits,
                "corrected trajectory still leaves the frame limits"
            );
        }
        Ok(transforms)
    }

    fn strictly_inside(&self, r: Rect) -> bool {
        r.x0 > 0.0 && r.y0 > 0.0 && r.x1 < self.limits.width && r.y1 < self.limits.height
    }

    fn within(&self, r: Rect, tol: f64) -> bool {
        r.x0 >= -tol
            && r.y0 >= -tol
            && r.x1 <= self.limits.width + tol
            && r.y1 <= self.limits.height + tol
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/bounds.rs"]
mod tests;
