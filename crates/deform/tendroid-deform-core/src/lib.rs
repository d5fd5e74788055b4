//! Tendroid Deform Core (host-agnostic)
//!
//! Batch vertex deformation for tubular "tendroid" meshes. The host owns the scene
//! and every vertex buffer; this crate computes the animated positions into
//! caller-provided memory, keeps call statistics, and (optionally) pushes results
//! into the host document through the narrow [`Document`] interface.
//!
//! Modules, leaves first: `params`, `deform` (kernel), `stats`, `document`,
//! `registry`, `bridge`, `engine` (composition root).

pub mod bridge;
pub mod config;
pub mod deform;
pub mod document;
pub mod engine;
pub mod error;
pub mod params;
pub mod registry;
pub mod stats;

// Re-exports for consumers (adapters)
pub use config::Config;
pub use deform::{
    compute_batch, compute_batch_parallel, compute_single, deform_vertex, THREADS_AVAILABLE,
};
pub use document::{AttributeHandle, Document, DocumentError, MemoryDocument};
pub use engine::{ComputationEngine, FrameReport, IntegrationMode};
pub use error::{DeformError, Result};
pub use params::{AnimationParameters, ShapeBatchDescriptor, COMPONENTS};
pub use registry::{MeshRegistry, RegistryEntry};
pub use stats::{PerfSnapshot, PerformanceTracker};

/// Crate version reported by [`ComputationEngine::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
