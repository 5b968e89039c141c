//! Clustered statistical trajectory model and its sampler.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rand::Rng;

use crate::foundation::core::Size;
use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::RandomStream;
use crate::transform::path::PathSequence;
use crate::transform::transformation::{TransformOp, Transformation};

/// Default exclusive upper bound on how many centroids are averaged per sample.
pub const DEFAULT_MAX_CLUSTERS: usize = 10;
/// Default base used to bring log-space scale curves back to linear factors.
pub const DEFAULT_SCALE_BASE: f64 = 10.0;

/// Order of the four stacked parameter curves inside each centroid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveLayout {
    /// `scale_x, scale_y, translate_x, translate_y`.
    #[default]
    ScaleFirst,
    /// `translate_x, translate_y, scale_x, scale_y`.
    TranslateFirst,
}

/// Pretrained clustering of real trajectories.
///
/// Each centroid stacks four normalized curves of equal length: translations as fractions of the
/// scene size, scales in log space. Relative models store per-step deltas.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrajectoryModel {
    /// Cluster centroids, each `4 * L` values.
    pub means: Vec<Vec<f64>>,
    /// Whether curves are per-step deltas that must be integrated.
    pub relative: bool,
    /// Log-space starting value of integrated scale curves.
    #[serde(default)]
    pub scale_offset: f64,
    /// Stacking order of the curves.
    #[serde(default)]
    pub layout: CurveLayout,
}

impl TrajectoryModel {
    /// Parse a model from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TrackSimResult<Self> {
        let model: Self = serde_json::from_reader(r)
            .map_err(|e| TrackSimError::serde(format!("parse trajectory model JSON: {e}")))?;
        model.curve_length()?;
        Ok(model)
    }

    /// Parse a model from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TrackSimResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TrackSimError::model(format!("open trajectory model '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Number of clusters.
    pub fn n_components(&self) -> usize {
        self.means.len()
    }

    /// Length `L` of each parameter curve, validating that all centroids agree.
    pub fn curve_length(&self) -> TrackSimResult<usize> {
        let first = self
            .means
            .first()
            .ok_or_else(|| TrackSimError::model("model has no centroids"))?;
        if first.is_empty() || first.len() % 4 != 0 {
            return Err(TrackSimError::model(format!(
                "centroid length {} is not a positive multiple of 4",
                first.len()
            )));
        }
        if let Some((i, m)) = self
            .means
            .iter()
            .enumerate()
            .find(|(_, m)| m.len() != first.len())
        {
            return Err(TrackSimError::model(format!(
                "centroid {i} has {} values, expected {}",
                m.len(),
                first.len()
            )));
        }
        if self.means.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TrackSimError::model("centroid values must be finite"));
        }
        Ok(first.len() / 4)
    }
}

/// Draws denormalized scale/translation trajectories from a shared [`TrajectoryModel`].
#[derive(Clone, Debug)]
pub struct TrajectorySampler {
    model: Arc<TrajectoryModel>,
    length: usize,
    max_clusters: usize,
    base: f64,
}

impl TrajectorySampler {
    /// Sampler over `model`, whose curves must have exactly `length` samples.
    pub fn new(model: Arc<TrajectoryModel>, length: usize) -> TrackSimResult<Self> {
        let actual = model.curve_length()?;
        if actual != length {
            return Err(TrackSimError::model(format!(
                "model curves have {actual} samples, expected {length}"
            )));
        }
        Ok(Self {
            model,
            length,
            max_clusters: DEFAULT_MAX_CLUSTERS,
            base: DEFAULT_SCALE_BASE,
        })
    }

    /// Override the exclusive upper bound on averaged clusters (at least 2).
    pub fn with_max_clusters(mut self, max_clusters: usize) -> TrackSimResult<Self> {
        if max_clusters < 2 {
            return Err(TrackSimError::validation(
                "max_clusters must be >= 2 so at least one cluster can be drawn",
            ));
        }
        self.max_clusters = max_clusters;
        Ok(self)
    }

    /// Override the log-space base for scale curves.
    pub fn with_base(mut self, base: f64) -> TrackSimResult<Self> {
        if !base.is_finite() || base <= 0.0 {
            return Err(TrackSimError::validation("scale base must be finite and > 0"));
        }
        self.base = base;
        Ok(self)
    }

    /// Curve length `L`.
    pub fn length(&self) -> usize {
        self.length
    }

    /// The shared model.
    pub fn model(&self) -> &Arc<TrajectoryModel> {
        &self.model
    }

    /// Sample `[scale_x, scale_y, translate_x, translate_y]` for a frame of size `scene`.
    pub fn sample(
        &self,
        scene: Size,
        rng: &mut RandomStream,
    ) -> TrackSimResult<Vec<Transformation>> {
        let k = self.model.n_components();
        let picks = rng.random_range(1..self.max_clusters);
        let mut mean = vec![0.0; 4 * self.length];
        for _ in 0..picks {
            let centroid = &self.model.means[rng.random_range(0..k)];
            for (acc, v) in mean.iter_mut().zip(centroid) {
                *acc += v;
            }
        }
        for v in &mut mean {
            *v /= picks as f64;
        }

        let mut curves = mean.chunks_exact(self.length).map(<[f64]>::to_vec);
        let mut next = || curves.next().unwrap_or_default();
        let (mut sx, mut sy, mut tx, mut ty) = match self.model.layout {
            CurveLayout::ScaleFirst => (next(), next(), next(), next()),
            CurveLayout::TranslateFirst => {
                let (tx, ty) = (next(), next());
                let (sx, sy) = (next(), next());
                (sx, sy, tx, ty)
            }
        };

        let (tx0, ty0) = if self.model.relative {
            let start = (
                rng.random::<f64>() * scene.width,
                rng.random::<f64>() * scene.height,
            );
            for curve in [&mut sx, &mut sy, &mut tx, &mut ty] {
                cumulative_sum(curve);
            }
            for curve in [&mut sx, &mut sy] {
                curve.iter_mut().for_each(|v| *v += self.model.scale_offset);
            }
            start
        } else {
            (0.0, 0.0)
        };

        tx.iter_mut().for_each(|v| *v = *v * scene.width + tx0);
        ty.iter_mut().for_each(|v| *v = *v * scene.height + ty0);
        sx.iter_mut().for_each(|v| *v = self.base.powf(*v));
        sy.iter_mut().for_each(|v| *v = self.base.powf(*v));

        tracing::debug!(clusters = picks, relative = self.model.relative, "sampled trajectory");

        Ok(vec![
            Transformation::with_path(TransformOp::ScaleX, PathSequence::from_values(sx)?),
            Transformation::with_path(TransformOp::ScaleY, PathSequence::from_values(sy)?),
            Transformation::with_path(TransformOp::TranslateX, PathSequence::from_values(tx)?),
            Transformation::with_path(TransformOp::TranslateY, PathSequence::from_values(ty)?),
        ])
    }
}

fn cumulative_sum(values: &mut [f64]) {
    let mut acc = 0.0;
    for v in values {
        acc += *v;
        *v = acc;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/model.rs"]
mod tests;
