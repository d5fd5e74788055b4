//! Vertex deformation kernel.
//!
//! A radial breathing deformation driven by a wave travelling along each shape's
//! long axis (y):
//!
//! ```text
//! phase = y * frequency + time * wave_speed
//! scale = 1 + amplitude * sin(phase)
//! (x, y, z) -> (x * scale, y, z * scale)
//! ```
//!
//! Buffers are interleaved `x, y, z` floats, shapes laid out contiguously in index
//! order. Every entry point runs the same per-span loop, shape-major then
//! vertex-minor, so batch, single and parallel results are bit-identical. The
//! kernel never allocates and only writes inside the range the descriptor covers.

use crate::error::{DeformError, Result};
use crate::params::{AnimationParameters, ShapeBatchDescriptor, COMPONENTS};

/// Whether the target can spawn threads. `wasm32-unknown-unknown` cannot, so the
/// parallel path degrades to the serial kernel there.
pub const THREADS_AVAILABLE: bool = !cfg!(target_arch = "wasm32");

/// Deform one vertex. Exposed for hosts that need the law outside a buffer.
#[inline]
pub fn deform_vertex(v: [f32; 3], params: &AnimationParameters) -> [f32; 3] {
    let scale = radial_scale(v[1], params.frequency, params.time_phase(), params.amplitude);
    [v[0] * scale, v[1], v[2] * scale]
}

#[inline(always)]
fn radial_scale(y: f32, frequency: f32, time_phase: f32, amplitude: f32) -> f32 {
    let phase = y * frequency + time_phase;
    1.0 + amplitude * phase.sin()
}

/// Core loop over a contiguous run of whole vertices.
#[inline]
fn deform_span(base: &[f32], out: &mut [f32], params: &AnimationParameters) {
    let time_phase = params.time_phase();
    let (frequency, amplitude) = (params.frequency, params.amplitude);
    for (src, dst) in base
        .chunks_exact(COMPONENTS)
        .zip(out.chunks_exact_mut(COMPONENTS))
    {
        let scale = radial_scale(src[1], frequency, time_phase, amplitude);
        dst[0] = src[0] * scale;
        dst[1] = src[1];
        dst[2] = src[2] * scale;
    }
}

/// Check buffer/descriptor invariants and return the number of floats covered.
fn validate(base: &[f32], out: &[f32], descriptor: &ShapeBatchDescriptor) -> Result<usize> {
    if base.len() != out.len() {
        return Err(DeformError::invalid(format!(
            "base buffer has {} floats but output buffer has {}",
            base.len(),
            out.len()
        )));
    }
    if base.len() % COMPONENTS != 0 {
        return Err(DeformError::invalid(format!(
            "buffer length {} is not a multiple of {COMPONENTS}",
            base.len()
        )));
    }
    let floats = descriptor.total_floats()?;
    if floats > base.len() {
        return Err(DeformError::invalid(format!(
            "descriptor needs {floats} floats ({} shapes x {} vertices) but buffer holds {}",
            descriptor.num_shapes,
            descriptor.vertices_per_shape,
            base.len()
        )));
    }
    Ok(floats)
}

/// Deform `descriptor.num_shapes` contiguous shapes from `base` into `out`.
///
/// Returns the number of vertices processed. Fails with
/// [`DeformError::InvalidArgument`] before touching `out` when the buffers differ in
/// length, are not whole vertices, or are too short for the descriptor. Floats past
/// the descriptor's range are left untouched.
pub fn compute_batch(
    base: &[f32],
    out: &mut [f32],
    descriptor: &ShapeBatchDescriptor,
    params: &AnimationParameters,
) -> Result<usize> {
    let floats = validate(base, out, descriptor)?;
    let stride = descriptor.shape_stride();
    if stride == 0 {
        return Ok(0);
    }
    for (src, dst) in base[..floats]
        .chunks_exact(stride)
        .zip(out[..floats].chunks_exact_mut(stride))
    {
        deform_span(src, dst, params);
    }
    Ok(floats / COMPONENTS)
}

/// [`compute_batch`] with a single shape spanning the whole buffer.
pub fn compute_single(base: &[f32], out: &mut [f32], params: &AnimationParameters) -> Result<usize> {
    let descriptor = ShapeBatchDescriptor::single(base.len() / COMPONENTS);
    compute_batch(base, out, &descriptor, params)
}

/// [`compute_batch`] with shapes partitioned across up to `workers` scoped threads.
///
/// Each worker owns a disjoint run of whole shapes, so the output is identical to the
/// serial kernel for any worker count. `workers <= 1` runs on the calling thread, as
/// does every call on targets without threads.
pub fn compute_batch_parallel(
    base: &[f32],
    out: &mut [f32],
    descriptor: &ShapeBatchDescriptor,
    params: &AnimationParameters,
    workers: usize,
) -> Result<usize> {
    let floats = validate(base, out, descriptor)?;
    let stride = descriptor.shape_stride();
    if !THREADS_AVAILABLE || workers <= 1 || descriptor.num_shapes <= 1 || stride == 0 {
        return compute_batch(base, out, descriptor, params);
    }

    let shapes_per_worker = descriptor.num_shapes.div_ceil(workers);
    let chunk = shapes_per_worker * stride;
    std::thread::scope(|scope| {
        for (src, dst) in base[..floats]
            .chunks(chunk)
            .zip(out[..floats].chunks_mut(chunk))
        {
            scope.spawn(move || {
                for (s, d) in src.chunks_exact(stride).zip(dst.chunks_exact_mut(stride)) {
                    deform_span(s, d, params);
                }
            });
        }
    });
    Ok(floats / COMPONENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn ramp(vertices: usize) -> Vec<f32> {
        (0..vertices * 3).map(|i| i as f32 * 0.25 - 3.0).collect()
    }

    #[test]
    fn zero_amplitude_is_identity() {
        let base = ramp(8);
        let mut out = vec![0.0; base.len()];
        let params = AnimationParameters::new(1.3, 2.0, 0.0, 1.0);
        let n = compute_batch(&base, &mut out, &ShapeBatchDescriptor::new(2, 4), &params).unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, base);
    }

    #[test]
    fn zero_phase_keeps_vertex() {
        let base = [1.0, 0.0, 0.0];
        let mut out = [9.0; 3];
        let params = AnimationParameters::new(0.0, 2.0, 0.5, 1.0);
        assert_eq!(compute_single(&base, &mut out, &params).unwrap(), 1);
        assert_eq!(out, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn quarter_wave_doubles_radius() {
        let base = [2.0, FRAC_PI_2, 0.0];
        let mut out = [0.0; 3];
        let params = AnimationParameters::new(0.0, 0.0, 1.0, 1.0);
        compute_single(&base, &mut out, &params).unwrap();
        approx(out[0], 4.0, 1e-5);
        assert_eq!(out[1], FRAC_PI_2);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn y_is_never_changed() {
        let base = ramp(16);
        let mut out = vec![0.0; base.len()];
        let params = AnimationParameters::new(0.7, 3.0, 0.4, 2.0);
        compute_single(&base, &mut out, &params).unwrap();
        for (b, o) in base.chunks_exact(3).zip(out.chunks_exact(3)) {
            assert_eq!(b[1], o[1]);
        }
    }

    #[test]
    fn matches_deform_vertex() {
        let base = ramp(5);
        let mut out = vec![0.0; base.len()];
        let params = AnimationParameters::new(0.2, 1.5, 0.3, 0.8);
        compute_single(&base, &mut out, &params).unwrap();
        for (b, o) in base.chunks_exact(3).zip(out.chunks_exact(3)) {
            assert_eq!(deform_vertex([b[0], b[1], b[2]], &params), [o[0], o[1], o[2]]);
        }
    }

    #[test]
    fn length_mismatch_rejected_without_write() {
        let base = ramp(4);
        let mut out = vec![7.0; 9];
        let err = compute_batch(
            &base,
            &mut out,
            &ShapeBatchDescriptor::new(1, 3),
            &AnimationParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeformError::InvalidArgument { .. }));
        assert!(out.iter().all(|v| *v == 7.0));
    }

    #[test]
    fn descriptor_past_buffer_rejected() {
        let base = ramp(6);
        let mut out = vec![7.0; base.len()];
        let err = compute_batch(
            &base,
            &mut out,
            &ShapeBatchDescriptor::new(3, 3),
            &AnimationParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeformError::InvalidArgument { .. }));
        assert!(out.iter().all(|v| *v == 7.0));
    }

    #[test]
    fn non_vertex_length_rejected() {
        let base = vec![0.0; 7];
        let mut out = vec![0.0; 7];
        assert!(compute_single(&base, &mut out, &AnimationParameters::default()).is_err());
    }

    #[test]
    fn tail_past_descriptor_untouched() {
        let base = ramp(10);
        let mut out = vec![-42.0; base.len()];
        let n = compute_batch(
            &base,
            &mut out,
            &ShapeBatchDescriptor::new(2, 4),
            &AnimationParameters::new(0.5, 2.0, 0.25, 1.0),
        )
        .unwrap();
        assert_eq!(n, 8);
        assert!(out[24..].iter().all(|v| *v == -42.0));
    }

    #[test]
    fn empty_descriptor_processes_nothing() {
        let base = ramp(3);
        let mut out = vec![5.0; base.len()];
        let n = compute_batch(
            &base,
            &mut out,
            &ShapeBatchDescriptor::new(0, 3),
            &AnimationParameters::default(),
        )
        .unwrap();
        assert_eq!(n, 0);
        assert!(out.iter().all(|v| *v == 5.0));
    }

    #[test]
    fn parallel_matches_serial_for_any_worker_count() {
        let base = ramp(7 * 12);
        let descriptor = ShapeBatchDescriptor::new(7, 12);
        let params = AnimationParameters::new(2.5, 2.0, 0.35, 1.7);
        let mut serial = vec![0.0; base.len()];
        compute_batch(&base, &mut serial, &descriptor, &params).unwrap();
        for workers in [0, 1, 2, 3, 7, 16] {
            let mut parallel = vec![0.0; base.len()];
            let n = compute_batch_parallel(&base, &mut parallel, &descriptor, &params, workers)
                .unwrap();
            assert_eq!(n, 84);
            assert_eq!(parallel, serial, "workers={workers}");
        }
    }

    #[test]
    fn parallel_validates_before_spawning() {
        let base = ramp(4);
        let mut out = vec![0.0; 6];
        let err = compute_batch_parallel(
            &base,
            &mut out,
            &ShapeBatchDescriptor::new(2, 2),
            &AnimationParameters::default(),
            4,
        )
        .unwrap_err();
        assert!(matches!(err, DeformError::InvalidArgument { .. }));
    }
}
