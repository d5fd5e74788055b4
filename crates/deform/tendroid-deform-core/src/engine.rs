//! ComputationEngine: the single API surface handed to the host.
//!
//! The deformation kernel runs outside any lock (its output is caller-owned and
//! call-scoped). Statistics and the registry, which holds the attached document, sit
//! behind one mutex so the engine can be shared across host threads.

use std::sync::{Mutex, MutexGuard, PoisonError};

use instant::Instant;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bridge;
use crate::config::Config;
use crate::deform;
use crate::document::{AttributeHandle, Document};
use crate::error::Result;
use crate::params::{AnimationParameters, ShapeBatchDescriptor};
use crate::registry::MeshRegistry;
use crate::stats::{PerfSnapshot, PerformanceTracker};

/// How the engine is currently wired to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMode {
    /// No document attached; compute calls only.
    ComputeOnly,
    /// A document is attached; bridge writes are available.
    Document,
}

/// Result of [`ComputationEngine::update_frame`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    pub vertices_processed: usize,
    pub shapes_updated: usize,
}

#[derive(Debug)]
struct EngineState<D> {
    stats: PerformanceTracker,
    registry: MeshRegistry<D>,
}

/// Composition root owning the statistics and the mesh registry.
#[derive(Debug)]
pub struct ComputationEngine<D> {
    cfg: Config,
    state: Mutex<EngineState<D>>,
}

impl<D: Document> Default for ComputationEngine<D> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<D: Document> ComputationEngine<D> {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            state: Mutex::new(EngineState {
                stats: PerformanceTracker::new(),
                registry: MeshRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Crate version string.
    pub fn version(&self) -> &'static str {
        crate::VERSION
    }

    pub fn mode(&self) -> IntegrationMode {
        if self.is_attached() {
            IntegrationMode::Document
        } else {
            IntegrationMode::ComputeOnly
        }
    }

    // Counters and handles stay consistent even if a holder panicked.
    fn state(&self) -> MutexGuard<'_, EngineState<D>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- registry -------------------------------------------------------------

    pub fn attach(&self, document: D) -> bool {
        self.state().registry.attach(document)
    }

    /// Detach and return the document; registrations are dropped.
    pub fn detach(&self) -> Option<D> {
        self.state().registry.detach()
    }

    pub fn is_attached(&self) -> bool {
        self.state().registry.is_attached()
    }

    pub fn register(&self, identifier: &str) -> bool {
        self.state().registry.register(identifier)
    }

    pub fn try_register(&self, identifier: &str) -> Result<AttributeHandle> {
        self.state().registry.try_register(identifier)
    }

    /// Register each identifier; returns how many succeeded.
    pub fn register_all<I, S>(&self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state();
        identifiers
            .into_iter()
            .filter(|id| state.registry.register(id.as_ref()))
            .count()
    }

    pub fn mesh_count(&self) -> usize {
        self.state().registry.count()
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.state().registry.is_registered(identifier)
    }

    /// Registered identifiers in registration order.
    pub fn identifiers(&self) -> Vec<String> {
        self.state()
            .registry
            .entries()
            .map(|e| e.identifier.to_string())
            .collect()
    }

    pub fn clear(&self) {
        let mut state = self.state();
        debug!("clear: dropping {} registrations", state.registry.count());
        state.registry.clear();
    }

    // --- compute --------------------------------------------------------------

    /// Deform a batch of contiguous shapes into `output`, recording the call.
    pub fn compute_batch(
        &self,
        base: &[f32],
        output: &mut [f32],
        descriptor: &ShapeBatchDescriptor,
        params: &AnimationParameters,
    ) -> Result<usize> {
        let parallel = descriptor
            .total_vertices()
            .map_or(false, |n| self.cfg.use_parallel(n));
        let started = Instant::now();
        let vertices = if parallel {
            deform::compute_batch_parallel(base, output, descriptor, params, self.cfg.workers)?
        } else {
            deform::compute_batch(base, output, descriptor, params)?
        };
        self.finish_call(vertices, started);
        Ok(vertices)
    }

    /// Deform one shape spanning the whole buffer, recording the call.
    pub fn compute_single(
        &self,
        base: &[f32],
        output: &mut [f32],
        params: &AnimationParameters,
    ) -> Result<usize> {
        let started = Instant::now();
        let vertices = deform::compute_single(base, output, params)?;
        self.finish_call(vertices, started);
        Ok(vertices)
    }

    fn finish_call(&self, vertices: usize, started: Instant) {
        let elapsed = started.elapsed();
        self.state().stats.record(vertices, elapsed);
        if let Some(threshold) = self.cfg.slow_call_warn_ms {
            let ms = elapsed.as_secs_f64() * 1000.0;
            if ms > threshold {
                warn!("compute: {vertices} vertices took {ms:.3}ms (threshold {threshold}ms)");
            }
        }
    }

    // --- bridge ---------------------------------------------------------------

    pub fn bridge_write(&self, identifier: &str, vertices: &[f32], vertex_count: usize) -> bool {
        bridge::write(&mut self.state().registry, identifier, vertices, vertex_count)
    }

    pub fn try_bridge_write(
        &self,
        identifier: &str,
        vertices: &[f32],
        vertex_count: usize,
    ) -> Result<()> {
        bridge::try_write(&mut self.state().registry, identifier, vertices, vertex_count)
    }

    pub fn bridge_write_batch(
        &self,
        vertices: &[f32],
        total_vertex_count: usize,
        vertices_per_shape: usize,
    ) -> usize {
        bridge::write_batch(
            &mut self.state().registry,
            vertices,
            total_vertex_count,
            vertices_per_shape,
        )
    }

    /// Compute a batch and, when a document is attached, write it to the registered
    /// shapes. Compute errors are returned; a short bridge write is only reported.
    pub fn update_frame(
        &self,
        base: &[f32],
        output: &mut [f32],
        descriptor: &ShapeBatchDescriptor,
        params: &AnimationParameters,
    ) -> Result<FrameReport> {
        let vertices_processed = self.compute_batch(base, output, descriptor, params)?;
        let mut state = self.state();
        let shapes_updated = if state.registry.is_attached() {
            bridge::write_batch(
                &mut state.registry,
                output,
                vertices_processed,
                descriptor.vertices_per_shape,
            )
        } else {
            0
        };
        Ok(FrameReport {
            vertices_processed,
            shapes_updated,
        })
    }

    // --- stats ----------------------------------------------------------------

    pub fn stats_snapshot(&self) -> PerfSnapshot {
        self.state().stats.snapshot()
    }

    pub fn stats_reset(&self) {
        self.state().stats.reset();
    }
}
