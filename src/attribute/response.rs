//! Segment-wise peak picking and the response attributes built on it.
//!
//! Each trace is partitioned into segments bounded by strict local minima
//! of a reference signal (the envelope). Within a segment, the sample of
//! maximum reference value is located, and a value taken at that peak is
//! broadcast to every sample of the segment. Four attributes share this
//! engine, differing only in the companion signal and pick mode.
//!
//! Traces are independent: the per-trace loop touches only that trace's
//! slice of the output, so the work parallelizes across traces while
//! staying sequential along the depth axis within a trace.

use crate::attribute::analytic::{envelope_impl, instantaneous_phase_impl};
use crate::attribute::formulas::instantaneous_frequency_impl;
use crate::attribute::AttributeParams;
use crate::error::{AttributeError, AttributeResult};
use crate::signal::AnalyticKernel;
use crate::volume::{as_volume_shape, from_f64_like, to_f64_vec, validate_volume_dtype};
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// What value a segment's peak contributes to the broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    /// Broadcast the companion's value at the peak index.
    TakeCompanion,
    /// Broadcast the reference value at the peak, signed by the companion.
    SignedPeak,
}

/// Partition every trace at local minima of `reference` and broadcast a
/// per-segment peak value across each segment.
///
/// Boundary samples are never flagged as minima, so a trace without any
/// interior minimum forms a single whole-trace segment. Argmax ties resolve
/// to the lowest index. Any NaN in the output is replaced with 0; this is
/// the only place the crate scrubs numeric degeneracies.
pub fn pick_and_broadcast<R>(
    reference: &Tensor<R>,
    companion: &Tensor<R>,
    mode: PickMode,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
{
    let shape = as_volume_shape(reference.shape(), "pick_and_broadcast")?;
    validate_volume_dtype(reference.dtype(), "pick_and_broadcast")?;
    if companion.shape() != reference.shape() {
        return Err(AttributeError::ShapeMismatch {
            expected: reference.shape().to_vec(),
            actual: companion.shape().to_vec(),
            context: "companion volume".to_string(),
        });
    }

    let trace_len = shape[2];
    let ref_data = to_f64_vec(reference);
    let comp_data = to_f64_vec(companion);
    let mut out = vec![0.0; ref_data.len()];

    for trace_start in (0..ref_data.len()).step_by(trace_len) {
        let trace = &ref_data[trace_start..trace_start + trace_len];
        let mut segment_start = 0;
        for t in 1..trace_len.saturating_sub(1) {
            if trace[t] < trace[t - 1] && trace[t] < trace[t + 1] {
                broadcast_segment(
                    trace,
                    &comp_data[trace_start..trace_start + trace_len],
                    &mut out[trace_start..trace_start + trace_len],
                    segment_start..t,
                    mode,
                );
                segment_start = t;
            }
        }
        broadcast_segment(
            trace,
            &comp_data[trace_start..trace_start + trace_len],
            &mut out[trace_start..trace_start + trace_len],
            segment_start..trace_len,
            mode,
        );
    }

    for v in &mut out {
        if v.is_nan() {
            *v = 0.0;
        }
    }

    Ok(from_f64_like(&out, reference.shape(), reference))
}

/// Fill one segment of a trace with its peak value.
fn broadcast_segment(
    reference: &[f64],
    companion: &[f64],
    out: &mut [f64],
    segment: std::ops::Range<usize>,
    mode: PickMode,
) {
    if segment.is_empty() {
        return;
    }
    let mut peak = segment.start;
    for t in segment.clone() {
        if reference[t] > reference[peak] {
            peak = t;
        }
    }
    let value = match mode {
        PickMode::TakeCompanion => companion[peak],
        PickMode::SignedPeak => reference[peak] * sign(companion[peak]),
    };
    for t in segment {
        out[t] = value;
    }
}

/// Sign with a zero at zero; NaN maps to 0, matching the NaN scrub.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Instantaneous phase at each segment's envelope peak.
pub(crate) fn response_phase_impl<R, C, K>(
    client: &C,
    kernel_cb: &K,
    darray: &Tensor<R>,
    params: &AttributeParams<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    let env = envelope_impl(client, kernel_cb, darray, params)?;
    let phase = instantaneous_phase_impl(client, kernel_cb, darray, params)?;
    pick_and_broadcast(&env, &phase, PickMode::TakeCompanion)
}

/// Instantaneous frequency at each segment's envelope peak.
pub(crate) fn response_frequency_impl<R, C, K>(
    client: &C,
    kernel_cb: &K,
    darray: &Tensor<R>,
    params: &AttributeParams<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    let env = envelope_impl(client, kernel_cb, darray, params)?;
    let freq = instantaneous_frequency_impl(client, kernel_cb, darray, params)?;
    pick_and_broadcast(&env, &freq, PickMode::TakeCompanion)
}

/// Input amplitude at each segment's envelope peak.
pub(crate) fn response_amplitude_impl<R, C, K>(
    client: &C,
    kernel_cb: &K,
    darray: &Tensor<R>,
    params: &AttributeParams<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    let env = envelope_impl(client, kernel_cb, darray, params)?;
    pick_and_broadcast(&env, darray, PickMode::TakeCompanion)
}

/// Envelope peak value signed by the input amplitude at the peak.
pub(crate) fn apparent_polarity_impl<R, C, K>(
    client: &C,
    kernel_cb: &K,
    darray: &Tensor<R>,
    params: &AttributeParams<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    let env = envelope_impl(client, kernel_cb, darray, params)?;
    pick_and_broadcast(&env, darray, PickMode::SignedPeak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::{CpuDevice, CpuRuntime};
    use numr::tensor::Tensor;

    fn trace(device: &CpuDevice, data: &[f64]) -> Tensor<CpuRuntime> {
        Tensor::from_slice(data, &[1, 1, data.len()], device)
    }

    #[test]
    fn test_two_segment_trace_broadcasts_peaks() {
        // Local minimum at index 4 only; segments [0,4) and [4,8) with
        // peaks of value 5 each.
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 3.0, 5.0, 3.0, 1.0, 3.0, 5.0, 1.0]);

        let out = pick_and_broadcast(&reference, &reference, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        assert_eq!(data, vec![5.0; 8]);
    }

    #[test]
    fn test_companion_value_is_taken_at_peak() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 3.0, 5.0, 3.0, 1.0, 3.0, 5.0, 1.0]);
        let companion = trace(&device, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        // Segment 0 peak at index 2, segment 1 peak at index 6.
        assert_eq!(
            data,
            vec![30.0, 30.0, 30.0, 30.0, 70.0, 70.0, 70.0, 70.0]
        );
    }

    #[test]
    fn test_single_valley_gives_two_segments() {
        let device = CpuDevice::new();
        // Strictly decreasing then increasing: one minimum at index 3.
        let reference = trace(&device, &[9.0, 7.0, 5.0, 1.0, 4.0, 6.0, 8.0]);
        let companion = trace(&device, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        // Segment [0,3) peaks at index 0, segment [3,7) at index 6.
        assert_eq!(data, vec![1.0, 1.0, 1.0, 7.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_no_minima_is_a_single_segment() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 2.0, 3.0, 4.0]);
        let companion = trace(&device, &[5.0, 6.0, 7.0, 8.0]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        assert_eq!(data, vec![8.0; 4]);
    }

    #[test]
    fn test_argmax_ties_take_first_occurrence() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[2.0, 5.0, 5.0, 2.0]);
        let companion = trace(&device, &[0.0, 1.0, 2.0, 3.0]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        assert_eq!(data, vec![1.0; 4]);
    }

    #[test]
    fn test_signed_peak_carries_companion_sign() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 3.0, 5.0, 3.0, 1.0, 3.0, 5.0, 1.0]);
        let companion = trace(&device, &[1.0, 1.0, -2.0, 1.0, 1.0, 1.0, 2.0, 1.0]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::SignedPeak).unwrap();
        let data: Vec<f64> = out.to_vec();
        assert_eq!(
            data,
            vec![-5.0, -5.0, -5.0, -5.0, 5.0, 5.0, 5.0, 5.0]
        );
    }

    #[test]
    fn test_segments_partition_each_trace() {
        // Every sample is written exactly once: broadcasting trace-position
        // markers must tile the trace with per-segment constants.
        let device = CpuDevice::new();
        let reference = trace(
            &device,
            &[4.0, 2.0, 6.0, 1.0, 3.0, 2.0, 9.0, 5.0, 1.0, 2.0],
        );
        let companion = trace(
            &device,
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        );

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        // Minima at indices 1, 3, 5, 8 -> segments [0,1) [1,3) [3,5) [5,8) [8,10).
        assert_eq!(
            data,
            vec![0.0, 2.0, 2.0, 4.0, 4.0, 6.0, 6.0, 6.0, 9.0, 9.0]
        );
    }

    #[test]
    fn test_nan_output_is_scrubbed_to_zero() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 2.0, 1.0]);
        let companion = trace(&device, &[f64::NAN, f64::NAN, f64::NAN]);

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        assert_eq!(data, vec![0.0; 3]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let device = CpuDevice::new();
        let reference = trace(&device, &[1.0, 2.0, 1.0]);
        let companion = trace(&device, &[1.0, 2.0]);

        let err = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap_err();
        assert!(matches!(err, AttributeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_traces_are_picked_independently() {
        let device = CpuDevice::new();
        // Two traces with different segmentation.
        let reference = Tensor::<CpuRuntime>::from_slice(
            &[1.0, 5.0, 1.0, 5.0, 1.0, 5.0, 3.0, 1.0],
            &[1, 2, 4],
            &device,
        );
        let companion = Tensor::<CpuRuntime>::from_slice(
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            &[1, 2, 4],
            &device,
        );

        let out = pick_and_broadcast(&reference, &companion, PickMode::TakeCompanion).unwrap();
        let data: Vec<f64> = out.to_vec();
        // Trace 0: minimum at index 2 -> segments [0,2) [2,4), peaks 1 and 3.
        // Trace 1: no interior minimum -> single segment, peak at index 1.
        assert_eq!(data, vec![2.0, 2.0, 4.0, 4.0, 6.0, 6.0, 6.0, 6.0]);
    }
}
