//! Debug annotations drawn straight into premultiplied frames.

use image::{Rgba, RgbaImage};

use crate::foundation::core::{Point, Rect};

pub(crate) const BOX_COLOR: [u8; 4] = [255, 255, 255, 255];
pub(crate) const CAMERA_COLOR: [u8; 4] = [0, 255, 0, 255];
pub(crate) const OBJECT_COLOR: [u8; 4] = [0, 0, 255, 255];
pub(crate) const AXIS_X_COLOR: [u8; 4] = [0, 255, 0, 255];
pub(crate) const AXIS_Y_COLOR: [u8; 4] = [255, 0, 0, 255];

fn plot(img: &mut RgbaImage, x: i64, y: i64, color: [u8; 4]) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, Rgba(color));
    }
}

/// One-pixel line between two points; parts outside the image are skipped.
pub(crate) fn draw_line(img: &mut RgbaImage, a: Point, b: Point, color: [u8; 4]) {
    let bounds = Rect::new(
        -1.0,
        -1.0,
        f64::from(img.width()) + 1.0,
        f64::from(img.height()) + 1.0,
    );
    let Some((a, b)) = clip_segment(a, b, bounds) else {
        return;
    };
    let d = b - a;
    let n = d.x.abs().max(d.y.abs()).ceil().max(1.0) as i64;
    for i in 0..=n {
        let p = a + d * (i as f64 / n as f64);
        plot(img, p.x.round() as i64, p.y.round() as i64, color);
    }
}

/// Liang-Barsky clip of segment `a..b` against `r`.
fn clip_segment(a: Point, b: Point, r: Rect) -> Option<(Point, Point)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-d.x, a.x - r.x0),
        (d.x, r.x1 - a.x),
        (-d.y, a.y - r.y0),
        (d.y, r.y1 - a.y),
    ] {
        if !p.is_finite() || !q.is_finite() {
            return None;
        }
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Closed outline through `points`.
pub(crate) fn draw_polygon(img: &mut RgbaImage, points: &[Point], color: [u8; 4]) {
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_line(img, *a, b, color);
    }
}

/// Axis-aligned rectangle outline from `(x1, y1)` to `(x2, y2)`.
pub(crate) fn draw_rect(img: &mut RgbaImage, rect: [f64; 4], color: [u8; 4]) {
    let [x1, y1, x2, y2] = rect;
    draw_polygon(
        img,
        &[
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ],
        color,
    );
}

fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 4]) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, Rgba(color));
        }
    }
}

/// Thick axis bars anchored at the top-left corner: y axis red, x axis green.
pub(crate) fn draw_axes(img: &mut RgbaImage) {
    let min_side = img.width().min(img.height());
    let width = (min_side / 10).max(1);
    let length = (min_side * 3 / 10).max(width);
    fill_rect(img, 0, 0, width, length, AXIS_Y_COLOR);
    fill_rect(img, 0, 0, length, width, AXIS_X_COLOR);
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
