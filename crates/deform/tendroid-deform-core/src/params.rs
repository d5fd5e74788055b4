//! Per-frame animation parameters and batch layout descriptors.

use serde::{Deserialize, Serialize};

use crate::error::{DeformError, Result};

/// Floats per vertex in every buffer handled by the core (interleaved x, y, z).
pub const COMPONENTS: usize = 3;

/// Scalars driving the travelling-wave breathing deformation.
///
/// `amplitude == 0` (or a zero `sin`) degenerates to the identity transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationParameters {
    /// Animation clock in seconds.
    pub time: f32,
    pub wave_speed: f32,
    pub amplitude: f32,
    pub frequency: f32,
}

impl AnimationParameters {
    pub fn new(time: f32, wave_speed: f32, amplitude: f32, frequency: f32) -> Self {
        Self {
            time,
            wave_speed,
            amplitude,
            frequency,
        }
    }

    /// Same parameters at a different point in time.
    #[inline]
    pub fn at(self, time: f32) -> Self {
        Self { time, ..self }
    }

    /// Phase offset contributed by the clock, shared by every vertex of a call.
    #[inline]
    pub(crate) fn time_phase(&self) -> f32 {
        self.time * self.wave_speed
    }
}

impl Default for AnimationParameters {
    fn default() -> Self {
        Self {
            time: 0.0,
            wave_speed: 2.0,
            amplitude: 0.1,
            frequency: 1.0,
        }
    }
}

/// How a flat vertex buffer partitions into contiguous per-shape segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeBatchDescriptor {
    pub num_shapes: usize,
    pub vertices_per_shape: usize,
}

impl ShapeBatchDescriptor {
    pub fn new(num_shapes: usize, vertices_per_shape: usize) -> Self {
        Self {
            num_shapes,
            vertices_per_shape,
        }
    }

    /// Descriptor for a single shape spanning `vertex_count` vertices.
    pub fn single(vertex_count: usize) -> Self {
        Self::new(1, vertex_count)
    }

    /// Total vertices covered by the batch.
    pub fn total_vertices(&self) -> Result<usize> {
        self.num_shapes
            .checked_mul(self.vertices_per_shape)
            .ok_or_else(|| {
                DeformError::invalid(format!(
                    "{} shapes x {} vertices overflows",
                    self.num_shapes, self.vertices_per_shape
                ))
            })
    }

    /// Floats covered by the batch (`total_vertices * 3`).
    pub fn total_floats(&self) -> Result<usize> {
        self.total_vertices()?
            .checked_mul(COMPONENTS)
            .ok_or_else(|| DeformError::invalid("descriptor float count overflows"))
    }

    /// Floats in one shape segment.
    #[inline]
    pub fn shape_stride(&self) -> usize {
        self.vertices_per_shape * COMPONENTS
    }
}
