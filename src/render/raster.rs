//! Raster helpers over premultiplied RGBA8 buffers.
//!
//! Every `RgbaImage` flowing through the engine holds premultiplied pixels; conversion to
//! straight alpha happens only at export time ([`to_straight_rgba`]).

use std::path::Path;

use anyhow::Context;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{BezPath, Shape};

use crate::foundation::core::{FrameSize, Point};
use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::math::{over, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x0: u32,
    /// Top edge (inclusive).
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

impl PixelRect {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    fn clamp_to(self, w: u32, h: u32) -> Self {
        Self {
            x0: self.x0.min(w),
            y0: self.y0.min(h),
            x1: self.x1.min(w),
            y1: self.y1.min(h),
        }
    }
}

/// Decode encoded image bytes into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TrackSimResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let mut rgba = dyn_img.to_rgba8();
    premultiply_rgba8_in_place(&mut rgba);
    Ok(rgba)
}

/// Read and decode an image file into premultiplied RGBA8.
pub fn load_image(path: &Path) -> TrackSimResult<RgbaImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    decode_image(&bytes).map_err(|e| {
        TrackSimError::Other(anyhow::anyhow!("decode image '{}': {e}", path.display()))
    })
}

/// Copy of `img` with straight (non-premultiplied) alpha.
pub fn to_straight_rgba(img: &RgbaImage) -> RgbaImage {
    let mut out = img.clone();
    unpremultiply_rgba8_in_place(&mut out);
    out
}

fn polygon_points(polygon: &[f64]) -> TrackSimResult<Vec<Point>> {
    if polygon.len() < 6 || polygon.len() % 2 != 0 {
        return Err(TrackSimError::validation(format!(
            "polygon needs an even number of coordinates for at least 3 vertices, got {}",
            polygon.len()
        )));
    }
    if polygon.iter().any(|v| !v.is_finite()) {
        return Err(TrackSimError::validation(
            "polygon coordinates must be finite",
        ));
    }
    Ok(polygon
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0], xy[1]))
        .collect())
}

/// Integer axis-aligned bounds of a flat `x0,y0,x1,y1,..` polygon.
pub fn polygon_bounds(polygon: &[f64]) -> TrackSimResult<PixelRect> {
    let points = polygon_points(polygon)?;
    let extent = crate::foundation::core::points_extent(&points);
    let rect = PixelRect {
        x0: extent.x0.max(0.0) as u32,
        y0: extent.y0.max(0.0) as u32,
        x1: extent.x1.max(0.0) as u32,
        y1: extent.y1.max(0.0) as u32,
    };
    if rect.width() == 0 || rect.height() == 0 {
        return Err(TrackSimError::validation(format!(
            "polygon bounds are degenerate: {rect:?}"
        )));
    }
    Ok(rect)
}

/// Mask `image` with `polygon` and crop to the polygon's bounds.
///
/// Pixels whose centers fall outside the polygon become transparent.
pub fn segment_crop(image: &RgbaImage, polygon: &[f64]) -> TrackSimResult<RgbaImage> {
    let bounds = polygon_bounds(polygon)?.clamp_to(image.width(), image.height());
    if bounds.width() == 0 || bounds.height() == 0 {
        return Err(TrackSimError::validation(format!(
            "polygon bounds {bounds:?} fall outside the {}x{} object image",
            image.width(),
            image.height()
        )));
    }

    let points = polygon_points(polygon)?;
    let mut path = BezPath::new();
    path.move_to(points[0]);
    for p in &points[1..] {
        path.line_to(*p);
    }
    path.close_path();

    let mut crop =
        imageops::crop_imm(image, bounds.x0, bounds.y0, bounds.width(), bounds.height()).to_image();
    for (x, y, px) in crop.enumerate_pixels_mut() {
        let center = Point::new(
            f64::from(bounds.x0 + x) + 0.5,
            f64::from(bounds.y0 + y) + 0.5,
        );
        if !path.contains(center) {
            px.0 = [0, 0, 0, 0];
        }
    }
    Ok(crop)
}

/// Smoothly resample `img` to `size`.
pub fn resize_to(img: &RgbaImage, size: FrameSize) -> RgbaImage {
    if img.dimensions() == (size.width, size.height) {
        return img.clone();
    }
    imageops::resize(img, size.width, size.height, FilterType::Triangle)
}

/// Anchor `img` at the origin of a transparent `size` canvas, cropping whatever overflows.
pub fn crop_or_pad(img: &RgbaImage, size: FrameSize) -> RgbaImage {
    if img.dimensions() == (size.width, size.height) {
        return img.clone();
    }
    let mut out = RgbaImage::new(size.width, size.height);
    imageops::replace(&mut out, img, 0, 0);
    out
}

/// Composite `src` over `dst` with its top-left corner at the origin.
pub fn paste_over(dst: &mut RgbaImage, src: &RgbaImage) {
    let w = dst.width().min(src.width());
    let h = dst.height().min(src.height());
    for y in 0..h {
        for x in 0..w {
            let s = src.get_pixel(x, y).0;
            let d = dst.get_pixel_mut(x, y);
            d.0 = over(d.0, s);
        }
    }
}

/// Copy the pixels of `rect` from `src` onto `dst` at the same coordinates.
pub fn copy_region(dst: &mut RgbaImage, src: &RgbaImage, rect: PixelRect) {
    let rect = rect
        .clamp_to(dst.width(), dst.height())
        .clamp_to(src.width(), src.height());
    for y in rect.y0..rect.y1 {
        for x in rect.x0..rect.x1 {
            dst.put_pixel(x, y, *src.get_pixel(x, y));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
