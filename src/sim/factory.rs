use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rand::Rng;

use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::{RandomStream, stream_from_seed};
use crate::sim::simulator::{Simulator, SimulatorOpts};
use crate::trajectory::model::TrajectoryModel;

/// Directory, relative to the data root, holding scene and object images by default.
pub const DEFAULT_IMAGE_DIR: &str = "images/train2014";

/// One annotated object in a [`DatasetSummary`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SummaryEntry {
    /// Category id, a key of [`DatasetSummary::categories`].
    pub category_id: u64,
    /// Source image id.
    pub image_id: u64,
    /// Segmentation polygons as flat `[x0, y0, x1, y1, ...]` lists.
    pub segmentation: Vec<Vec<f64>>,
    /// Image file name, relative to the object directory.
    pub file_name: String,
}

/// Annotated objects to draw simulation targets from.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetSummary {
    /// Object annotations.
    pub summary: Vec<SummaryEntry>,
    /// Category id to human-readable name.
    #[serde(default)]
    pub categories: BTreeMap<u64, String>,
}

impl DatasetSummary {
    /// Parse a summary from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TrackSimResult<Self> {
        let summary: Self = serde_json::from_reader(r)
            .map_err(|e| TrackSimError::serde(format!("parse dataset summary JSON: {e}")))?;
        summary.validate()?;
        Ok(summary)
    }

    /// Parse a summary from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TrackSimResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading dataset summary");
        let f = File::open(path)
            .with_context(|| format!("open dataset summary '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Require at least one entry and at least one polygon per entry.
    pub fn validate(&self) -> TrackSimResult<()> {
        if self.summary.is_empty() {
            return Err(TrackSimError::validation("dataset summary has no entries"));
        }
        if let Some(e) = self.summary.iter().find(|e| e.segmentation.is_empty()) {
            return Err(TrackSimError::validation(format!(
                "summary entry for '{}' has no segmentation polygon",
                e.file_name
            )));
        }
        Ok(())
    }

    /// Category name for `id`, if known.
    pub fn category_name(&self, id: u64) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }
}

/// Randomly chosen inputs for one simulator instance.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceInputs {
    /// Scene image.
    pub scene_path: PathBuf,
    /// Image the object is segmented from.
    pub object_path: PathBuf,
    /// Segmentation polygon of the object.
    pub polygon: Vec<f64>,
    /// Seed for the instance's own random stream.
    pub seed: u64,
}

impl InstanceInputs {
    /// Load the images and build a simulator, seeding it with [`InstanceInputs::seed`].
    pub fn build(
        &self,
        mut opts: SimulatorOpts,
        model: Option<Arc<TrajectoryModel>>,
    ) -> TrackSimResult<Simulator> {
        opts.seed = Some(self.seed);
        let sim = Simulator::open(
            &self.scene_path,
            &self.object_path,
            self.polygon.clone(),
            opts,
        )?;
        match model {
            Some(model) => sim.with_trajectory_model(model),
            None => Ok(sim),
        }
    }
}

/// Produces simulators over random scenes and annotated objects from a data directory.
#[derive(Debug)]
pub struct SimulatorFactory {
    data_dir: PathBuf,
    object_dir: PathBuf,
    scenes: Vec<PathBuf>,
    summary: DatasetSummary,
    model: Option<Arc<TrajectoryModel>>,
    rng: RandomStream,
}

impl SimulatorFactory {
    /// Factory reading scenes and objects from [`DEFAULT_IMAGE_DIR`] under `data_dir`.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        summary: DatasetSummary,
        seed: Option<u64>,
    ) -> TrackSimResult<Self> {
        Self::with_dirs(data_dir, DEFAULT_IMAGE_DIR, DEFAULT_IMAGE_DIR, summary, seed)
    }

    /// Factory over explicit scene and object directories, relative to `data_dir`.
    pub fn with_dirs(
        data_dir: impl Into<PathBuf>,
        scene_dir: impl AsRef<Path>,
        object_dir: impl AsRef<Path>,
        summary: DatasetSummary,
        seed: Option<u64>,
    ) -> TrackSimResult<Self> {
        summary.validate()?;
        let data_dir = data_dir.into();
        let scenes = list_images(&data_dir.join(scene_dir))?;
        Ok(Self {
            object_dir: data_dir.join(object_dir),
            data_dir,
            scenes,
            summary,
            model: None,
            rng: stream_from_seed(seed),
        })
    }

    /// Attach a trajectory model shared by every created instance.
    pub fn with_trajectory_model(mut self, model: Arc<TrajectoryModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Dataset root.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Candidate scene images, sorted.
    pub fn scenes(&self) -> &[PathBuf] {
        &self.scenes
    }

    /// Shared trajectory model, if any.
    pub fn trajectory_model(&self) -> Option<&Arc<TrajectoryModel>> {
        self.model.as_ref()
    }

    /// Draw a scene, an annotated object, one of its polygons and an instance seed.
    pub fn next_inputs(&mut self) -> TrackSimResult<InstanceInputs> {
        let scene_path = self.scenes[self.rng.random_range(0..self.scenes.len())].clone();
        let entry = &self.summary.summary[self.rng.random_range(0..self.summary.summary.len())];
        let polygon =
            entry.segmentation[self.rng.random_range(0..entry.segmentation.len())].clone();
        tracing::info!(
            category = self.summary.category_name(entry.category_id).unwrap_or("unknown"),
            image_id = entry.image_id,
            scene = %scene_path.display(),
            "segmenting object"
        );
        Ok(InstanceInputs {
            scene_path,
            object_path: self.object_dir.join(entry.file_name.trim()),
            polygon,
            seed: self.rng.random(),
        })
    }

    /// Build a simulator over freshly drawn inputs. The instance seed overrides `opts.seed`.
    pub fn create_instance(&mut self, opts: SimulatorOpts) -> TrackSimResult<Simulator> {
        let inputs = self.next_inputs()?;
        inputs.build(opts, self.model.clone())
    }
}

fn list_images(dir: &Path) -> TrackSimResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("list scene dir '{}'", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("list scene dir '{}'", dir.display()))?
            .path();
        if path.is_file() {
            out.push(path);
        }
    }
    if out.is_empty() {
        return Err(TrackSimError::validation(format!(
            "scene dir '{}' has no files",
            dir.display()
        )));
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/sim/factory.rs"]
mod tests;
