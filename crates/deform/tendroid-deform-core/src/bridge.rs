//! Pushes computed vertex buffers into the attached document.
//!
//! The flat `x, y, z` buffer is reinterpreted in place as `[[f32; 3]]` for the commit;
//! nothing is copied on the core side. Failures never escalate past this module's
//! boolean/count entry points: they are logged and reported, and the bridge never
//! retries.

use log::{debug, warn};

use crate::document::{AttributeHandle, Document};
use crate::error::{DeformError, Result};
use crate::params::COMPONENTS;
use crate::registry::MeshRegistry;

fn as_points(vertices: &[f32]) -> Result<&[[f32; 3]]> {
    bytemuck::try_cast_slice(vertices)
        .map_err(|e| DeformError::invalid(format!("vertex buffer is not xyz triples: {e}")))
}

fn commit_segment<D: Document>(
    document: &mut D,
    identifier: &str,
    attribute: AttributeHandle,
    segment: &[f32],
) -> Result<()> {
    let points = as_points(segment)?;
    document
        .commit(attribute, points)
        .map_err(|source| DeformError::ExternalCommit {
            identifier: identifier.to_string(),
            source,
        })
}

/// Commit `vertices` (exactly `vertex_count * 3` floats) to a registered shape.
pub fn try_write<D: Document>(
    registry: &mut MeshRegistry<D>,
    identifier: &str,
    vertices: &[f32],
    vertex_count: usize,
) -> Result<()> {
    let (document, entries) = registry.split_mut()?;
    let attribute = *entries
        .get(identifier)
        .ok_or_else(|| DeformError::UnknownIdentifier {
            identifier: identifier.to_string(),
        })?;
    if vertex_count.checked_mul(COMPONENTS) != Some(vertices.len()) {
        return Err(DeformError::invalid(format!(
            "buffer has {} floats, expected {vertex_count} vertices",
            vertices.len()
        )));
    }
    commit_segment(document, identifier, attribute, vertices)
}

/// [`try_write`] with the error logged and absorbed.
pub fn write<D: Document>(
    registry: &mut MeshRegistry<D>,
    identifier: &str,
    vertices: &[f32],
    vertex_count: usize,
) -> bool {
    match try_write(registry, identifier, vertices, vertex_count) {
        Ok(()) => true,
        Err(err) => {
            warn!("write: {err}");
            false
        }
    }
}

/// Slice `vertices` into `vertices_per_shape` segments and commit them to the
/// registered shapes in registration order.
///
/// Iteration stops at the first shape whose segment would end past
/// `total_vertex_count`, or past the end of `vertices` when the buffer holds fewer
/// vertices than claimed; a shape whose commit fails is skipped. Returns the number of
/// shapes committed. A partial batch is a normal outcome, not an error.
pub fn write_batch<D: Document>(
    registry: &mut MeshRegistry<D>,
    vertices: &[f32],
    total_vertex_count: usize,
    vertices_per_shape: usize,
) -> usize {
    let (document, entries) = match registry.split_mut() {
        Ok(parts) => parts,
        Err(err) => {
            warn!("write_batch: {err}");
            return 0;
        }
    };
    if vertices_per_shape == 0 {
        warn!("write_batch: vertices_per_shape is 0");
        return 0;
    }
    let available = vertices.len() / COMPONENTS;
    let total_vertex_count = if total_vertex_count > available {
        warn!(
            "write_batch: buffer holds {available} vertices, fewer than {total_vertex_count}"
        );
        available
    } else {
        total_vertex_count
    };

    let mut updated = 0;
    let mut start = 0usize;
    for (visited, (identifier, attribute)) in entries.iter().enumerate() {
        let end = match start.checked_add(vertices_per_shape) {
            Some(end) if end <= total_vertex_count => end,
            _ => {
                warn!(
                    "write_batch: buffer covers {visited} of {} registered shapes",
                    entries.len()
                );
                break;
            }
        };
        let segment = &vertices[start * COMPONENTS..end * COMPONENTS];
        match commit_segment(document, identifier, *attribute, segment) {
            Ok(()) => updated += 1,
            Err(err) => warn!("write_batch: {err}"),
        }
        start = end;
    }
    debug!("write_batch: {updated}/{} shapes updated", entries.len());
    updated
}
