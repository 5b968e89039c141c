//! Affine resampling of premultiplied RGBA8 images.

use image::{Rgba, RgbaImage};

use crate::foundation::core::{Affine, FrameSize, Point};
use crate::foundation::error::TrackSimResult;
use crate::transform::affine::invert;

const MAX_SUPERSAMPLE: u32 = 4;

/// Warp `src` by the source-to-destination transform `forward` into an `out`-sized image.
///
/// Each destination pixel is mapped back through the inverse of `forward`. Reads outside `src`
/// are transparent. Minifying transforms are supersampled so shrunk content stays smooth.
pub fn warp_image(src: &RgbaImage, forward: Affine, out: FrameSize) -> TrackSimResult<RgbaImage> {
    let inverse = invert(forward)?;
    Ok(warp_with_inverse(src, inverse, out))
}

pub(crate) fn warp_with_inverse(src: &RgbaImage, inverse: Affine, out: FrameSize) -> RgbaImage {
    let n = supersample_factor(inverse);
    let step = 1.0 / f64::from(n);
    let weight = 1.0 / f64::from(n * n);

    let mut dst = RgbaImage::new(out.width, out.height);
    for (x, y, px) in dst.enumerate_pixels_mut() {
        let mut acc = [0.0f64; 4];
        for sy in 0..n {
            for sx in 0..n {
                let dp = Point::new(
                    f64::from(x) + (f64::from(sx) + 0.5) * step,
                    f64::from(y) + (f64::from(sy) + 0.5) * step,
                );
                let sp = inverse * dp;
                let sample = sample_bilinear(src, sp.x - 0.5, sp.y - 0.5);
                for (a, s) in acc.iter_mut().zip(sample) {
                    *a += s * weight;
                }
            }
        }
        *px = Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8));
    }
    dst
}

/// Grid size needed to cover one destination pixel's footprint in the source.
fn supersample_factor(inverse: Affine) -> u32 {
    let [a, b, c, d, _, _] = inverse.as_coeffs();
    let stretch = a.hypot(b).max(c.hypot(d));
    if !stretch.is_finite() {
        return 1;
    }
    (stretch.ceil() as u32).clamp(1, MAX_SUPERSAMPLE)
}

fn sample_bilinear(src: &RgbaImage, fx: f64, fy: f64) -> [f64; 4] {
    let (w, h) = src.dimensions();
    let x0 = fx.floor();
    let y0 = fy.floor();
    if x0 < -1.0 || y0 < -1.0 || x0 >= f64::from(w) || y0 >= f64::from(h) {
        return [0.0; 4];
    }
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut out = [0.0f64; 4];
    for (dx, dy, wgt) in [
        (0, 0, (1.0 - tx) * (1.0 - ty)),
        (1, 0, tx * (1.0 - ty)),
        (0, 1, (1.0 - tx) * ty),
        (1, 1, tx * ty),
    ] {
        if wgt <= 0.0 {
            continue;
        }
        let (sx, sy) = (x0 + dx, y0 + dy);
        if sx < 0 || sy < 0 || sx >= i64::from(w) || sy >= i64::from(h) {
            continue;
        }
        let texel = src.get_pixel(sx as u32, sy as u32).0;
        for (o, t) in out.iter_mut().zip(texel) {
            *o += wgt * f64::from(t);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/transform/warp.rs"]
mod tests;
