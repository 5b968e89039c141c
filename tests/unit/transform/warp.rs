use super::*;
use crate::transform::affine::{scale, translate};

fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba(px))
}

#[test]
fn identity_warp_is_lossless() {
    let mut src = solid(8, 6, [10, 20, 30, 255]);
    src.put_pixel(3, 2, Rgba([200, 100, 50, 255]));
    let out = warp_image(&src, Affine::IDENTITY, FrameSize::new(8, 6).unwrap()).unwrap();
    assert_eq!(out, src);
}

#[test]
fn translation_moves_content_and_leaves_transparency() {
    let src = solid(4, 4, [255, 0, 0, 255]);
    let out = warp_image(&src, translate(5.0, 0.0), FrameSize::new(12, 4).unwrap()).unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(out.get_pixel(6, 1).0, [255, 0, 0, 255]);
    assert_eq!(out.get_pixel(11, 3).0, [0, 0, 0, 0]);
}

#[test]
fn minification_averages_footprint() {
    // 2x2 checker of opaque black/white shrunk to one pixel averages to grey.
    let mut src = solid(2, 2, [0, 0, 0, 255]);
    src.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    src.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
    let out = warp_image(&src, scale(0.5, 0.5), FrameSize::new(1, 1).unwrap()).unwrap();
    let px = out.get_pixel(0, 0).0;
    assert_eq!(px[3], 255);
    assert!((i16::from(px[0]) - 128).abs() <= 2, "{px:?}");
}

#[test]
fn singular_forward_transform_fails() {
    let src = solid(2, 2, [0, 0, 0, 255]);
    assert!(warp_image(&src, scale(1.0, 0.0), FrameSize::new(2, 2).unwrap()).is_err());
}
