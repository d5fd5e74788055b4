//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::deform::THREADS_AVAILABLE;
use crate::params::AnimationParameters;

/// Configuration for a [`ComputationEngine`](crate::engine::ComputationEngine).
/// Every field has a default, so hosts may pass a partial object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parameters hosts fall back to when they have none of their own.
    pub default_params: AnimationParameters,

    /// Worker threads for batch compute; 0 and 1 both mean serial. Ignored on
    /// targets without threads (wasm32).
    pub workers: usize,

    /// Batches below this many vertices always run serially.
    pub parallel_min_vertices: usize,

    /// Log a warning when a single compute call takes longer than this.
    pub slow_call_warn_ms: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_params: AnimationParameters::default(),
            workers: 1,
            parallel_min_vertices: 64 * 1024,
            slow_call_warn_ms: None,
        }
    }
}

impl Config {
    /// Whether a batch of `vertices` should be split across workers.
    #[inline]
    pub fn use_parallel(&self, vertices: usize) -> bool {
        THREADS_AVAILABLE && self.workers > 1 && vertices >= self.parallel_min_vertices
    }
}
