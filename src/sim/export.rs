use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::foundation::core::BoundingBox;
use crate::foundation::error::TrackSimResult;
use crate::render::raster::to_straight_rgba;

/// Ground-truth log file name inside an output directory.
pub const GROUND_TRUTH_FILE: &str = "groundtruth_rect.txt";
/// Extension of exported frame images.
pub const FRAME_EXTENSION: &str = "jpg";

/// `NNNN.jpg` for a step index.
pub fn frame_file_name(step: usize) -> String {
    format!("{step:04}.{FRAME_EXTENSION}")
}

/// Append-only `x1,y1,x2,y2` log, one line per exported frame.
#[derive(Debug)]
pub struct GroundTruthWriter {
    path: PathBuf,
    file: File,
}

impl GroundTruthWriter {
    /// Start a fresh log at `path`, truncating any previous run.
    pub fn create(path: impl Into<PathBuf>) -> TrackSimResult<Self> {
        let path = path.into();
        let file = File::create(&path)
            .with_context(|| format!("create ground truth '{}'", path.display()))?;
        Ok(Self { path, file })
    }

    /// Log location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one box.
    pub fn push(&mut self, bbox: &BoundingBox) -> TrackSimResult<()> {
        writeln!(self.file, "{}", bbox.to_csv_line())
            .with_context(|| format!("append ground truth '{}'", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("flush ground truth '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Write a premultiplied frame as an image; the format follows the file extension.
pub fn save_frame_image(frame: &RgbaImage, path: &Path) -> TrackSimResult<()> {
    let straight = DynamicImage::ImageRgba8(to_straight_rgba(frame));
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown image format for '{}'", path.display()))?;
    let encoded = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(straight.to_rgb8()),
        _ => straight,
    };
    encoded
        .save_with_format(path, format)
        .with_context(|| format!("write frame '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/sim/export.rs"]
mod tests;
