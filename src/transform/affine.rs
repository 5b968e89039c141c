//! Homogeneous 2D transform algebra.
//!
//! Matrices are `kurbo::Affine` values, i.e. the top two rows of a 3x3 homogeneous matrix whose
//! last row is implicitly `[0, 0, 1]`.

use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{TrackSimError, TrackSimResult};

const SINGULAR_EPS: f64 = 1e-12;

/// Independent scaling along x and y.
#[inline]
pub fn scale(sx: f64, sy: f64) -> Affine {
    Affine::scale_non_uniform(sx, sy)
}

/// Rotation by `theta` radians. Positive angles turn counter-clockwise on screen (y axis down).
#[inline]
pub fn rotate(theta: f64) -> Affine {
    Affine::rotate(-theta)
}

/// Translation by `(tx, ty)`.
#[inline]
pub fn translate(tx: f64, ty: f64) -> Affine {
    Affine::translate(Vec2::new(tx, ty))
}

/// Fold transforms left to right onto an identity accumulator (`acc = m * acc`).
///
/// The first transform is applied to points first; `[A, B, C]` composes to `C * B * A`.
pub fn compose<I>(transforms: I) -> Affine
where
    I: IntoIterator<Item = Affine>,
{
    transforms
        .into_iter()
        .fold(Affine::IDENTITY, |acc, m| m * acc)
}

/// Checked inverse. Singular or non-finite matrices are a precondition violation.
pub fn invert(m: Affine) -> TrackSimResult<Affine> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPS {
        return Err(TrackSimError::geometry(format!(
            "cannot invert singular transform {:?} (det={det})",
            m.as_coeffs()
        )));
    }
    Ok(m.inverse())
}

/// Apply `m` to every point.
pub fn apply_to_points(m: Affine, points: &[Point]) -> Vec<Point> {
    points.iter().map(|p| m * *p).collect()
}

/// Full 3x3 homogeneous form, row-major.
pub fn homogeneous(m: Affine) -> [[f64; 3]; 3] {
    let [a, b, c, d, e, f] = m.as_coeffs();
    [[a, c, e], [b, d, f], [0.0, 0.0, 1.0]]
}

#[cfg(test)]
#[path = "../../tests/unit/transform/affine.rs"]
mod tests;
