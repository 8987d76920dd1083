//! Phase unwrapping along the depth axis.

use crate::error::AttributeResult;
use crate::volume::{as_volume_shape, from_f64_like, to_f64_vec, validate_volume_dtype};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use std::f64::consts::PI;

/// Unwrap a phase volume (radians) along the depth axis.
///
/// Each trace is corrected independently: consecutive differences larger
/// than pi in magnitude are brought back into (-pi, pi] by adding multiples
/// of 2 pi, making the phase continuous along the trace. Unwrapping is
/// inherently sequential along the trace but independent across traces.
pub fn unwrap_phase<R, C>(_client: &C, phase: &Tensor<R>) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: RuntimeClient<R>,
{
    let shape = as_volume_shape(phase.shape(), "unwrap_phase")?;
    validate_volume_dtype(phase.dtype(), "unwrap_phase")?;

    let trace_len = shape[2];
    let data = to_f64_vec(phase);
    let mut out = vec![0.0; data.len()];

    for trace_start in (0..data.len()).step_by(trace_len) {
        out[trace_start] = data[trace_start];
        for t in 1..trace_len {
            let mut diff = data[trace_start + t] - data[trace_start + t - 1];
            while diff > PI {
                diff -= 2.0 * PI;
            }
            while diff < -PI {
                diff += 2.0 * PI;
            }
            out[trace_start + t] = out[trace_start + t - 1] + diff;
        }
    }

    Ok(from_f64_like(&out, phase.shape(), phase))
}
