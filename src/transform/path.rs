//! Per-step scalar paths driving one transform parameter.

use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::foundation::rng::{RandomStream, uniform};

/// Number of samples in the canonical time axis (`t = 0.0, 0.1, .. 5.9`).
pub const CANONICAL_STEPS: usize = 60;
/// Upper (exclusive) end of the time axis cosine paths are evaluated on.
pub const TIME_SPAN: f64 = 6.0;

const MIN_AMPLITUDE: f64 = 0.2;
const MAX_AMPLITUDE: f64 = 1.2;
const MIN_PERIOD: f64 = 0.25;
const MAX_PERIOD: f64 = 1.0;
const MIN_PHASE: f64 = 0.0;
const MAX_PHASE: f64 = 1.0;
const MIN_VSHIFT: f64 = -0.5;
const MAX_VSHIFT: f64 = 0.5;

/// Immutable sequence of per-step values.
///
/// A single-value sequence is a constant path: it yields its value for every step.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PathSequence {
    values: Vec<f64>,
}

impl PathSequence {
    /// Wrap explicit values. Empty or non-finite input is rejected.
    pub fn from_values(values: Vec<f64>) -> TrackSimResult<Self> {
        if values.is_empty() {
            return Err(TrackSimError::geometry("path sequence must not be empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TrackSimError::geometry(
                "path sequence values must be finite",
            ));
        }
        Ok(Self { values })
    }

    /// Constant path.
    pub fn constant(value: f64) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// Affinely rescale `values` into `[lo, hi]`, preserving shape.
    ///
    /// The input must not be constant.
    pub fn stretch(values: &[f64], lo: f64, hi: f64) -> TrackSimResult<Self> {
        let (mi, ma) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(mi, ma), v| {
                (mi.min(*v), ma.max(*v))
            });
        if !(ma > mi) {
            return Err(TrackSimError::geometry(format!(
                "cannot stretch a degenerate sequence (min={mi}, max={ma})"
            )));
        }
        Self::from_values(
            values
                .iter()
                .map(|v| (hi - lo) * ((v - mi) / (ma - mi)) + lo)
                .collect(),
        )
    }

    /// Constant-speed path from `lo` to `hi` over `steps` samples.
    pub fn linear(lo: f64, hi: f64, steps: usize) -> TrackSimResult<Self> {
        Self::stretch(&time_axis(steps)?, lo, hi)
    }

    /// Randomized cosine curve rescaled into `[lo, hi]`.
    pub fn cosine(lo: f64, hi: f64, steps: usize, rng: &mut RandomStream) -> TrackSimResult<Self> {
        let amplitude = uniform(rng, MIN_AMPLITUDE, MAX_AMPLITUDE);
        let period = uniform(rng, MIN_PERIOD, MAX_PERIOD);
        let phase = uniform(rng, MIN_PHASE, MAX_PHASE);
        let shift = uniform(rng, MIN_VSHIFT, MAX_VSHIFT);

        let curve: Vec<f64> = time_axis(steps)?
            .into_iter()
            .map(|t| amplitude * (period * t - phase).cos() + shift)
            .collect();
        Self::stretch(&curve, lo, hi)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed path; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether this path yields one value for every step.
    pub fn is_constant(&self) -> bool {
        self.values.len() == 1
    }

    /// Value at `step`. Out of range steps are rejected unless the path is constant.
    pub fn value_at(&self, step: usize) -> TrackSimResult<f64> {
        if self.is_constant() {
            return Ok(self.values[0]);
        }
        self.values.get(step).copied().ok_or_else(|| {
            TrackSimError::geometry(format!(
                "step {step} out of range for path of length {}",
                self.values.len()
            ))
        })
    }

    /// Borrow the raw samples.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// `steps` evenly spaced samples over `[0, TIME_SPAN)`.
fn time_axis(steps: usize) -> TrackSimResult<Vec<f64>> {
    if steps < 2 {
        return Err(TrackSimError::geometry(format!(
            "a path needs at least 2 steps, got {steps}"
        )));
    }
    let dt = TIME_SPAN / steps as f64;
    Ok((0..steps).map(|i| i as f64 * dt).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/transform/path.rs"]
mod tests;
