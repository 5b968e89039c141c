use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::foundation::error::{TrackSimError, TrackSimResult};
use crate::sim::factory::{InstanceInputs, SimulatorFactory};
use crate::sim::simulator::SimulatorOpts;

/// Outcome of one generated sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceReport {
    /// Directory the frames and ground truth were written to.
    pub dir: PathBuf,
    /// Number of frames exported.
    pub frames: usize,
}

/// Generate `count` sequences into `out_dir/seq_NNNN`, in parallel.
///
/// Inputs are drawn from `factory` up front, so a seeded factory yields the same batch whatever
/// the thread count.
pub fn generate_batch(
    factory: &mut SimulatorFactory,
    opts: &SimulatorOpts,
    out_dir: &Path,
    count: usize,
    threads: Option<usize>,
) -> TrackSimResult<Vec<SequenceReport>> {
    opts.validate()?;
    let jobs = (0..count)
        .map(|i| -> TrackSimResult<(PathBuf, InstanceInputs)> {
            Ok((out_dir.join(format!("seq_{i:04}")), factory.next_inputs()?))
        })
        .collect::<TrackSimResult<Vec<_>>>()?;
    let model = factory.trajectory_model().cloned();

    let pool = build_thread_pool(threads)?;
    pool.install(|| {
        jobs.into_par_iter()
            .map(|(dir, inputs)| -> TrackSimResult<SequenceReport> {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("create sequence dir '{}'", dir.display()))?;
                let mut sim = inputs.build(opts.clone(), model.clone())?;
                sim.start()?;
                let frames = sim.run_to_end(&dir)?;
                Ok(SequenceReport { dir, frames })
            })
            .collect()
    })
}

fn build_thread_pool(threads: Option<usize>) -> TrackSimResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TrackSimError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/sim/batch.rs"]
mod tests;
