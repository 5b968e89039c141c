//! Explicitly owned random streams.
//!
//! Every simulator, occlusion generator and path construction draws from its own stream so a run
//! can be reproduced from a single seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Random stream type used throughout the engine.
pub type RandomStream = SmallRng;

/// Seeded stream, or one seeded from the OS when `seed` is `None`.
pub fn stream_from_seed(seed: Option<u64>) -> RandomStream {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Derive an independent child stream from `parent`.
pub fn fork_stream(parent: &mut RandomStream) -> RandomStream {
    SmallRng::seed_from_u64(parent.random::<u64>())
}

/// Uniform sample in `[lo, hi)` (`lo` when the range is empty).
pub fn uniform(rng: &mut RandomStream, lo: f64, hi: f64) -> f64 {
    (hi - lo) * rng.random::<f64>() + lo
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/rng.rs"]
mod tests;
