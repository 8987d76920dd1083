//! Attribute formulas composed from the analytic and derivative stages.
//!
//! Every formula is pure: it recomputes its dependencies from the input
//! volume instead of caching intermediates. Numeric degeneracies (division
//! by a zero envelope or amplitude change) propagate as NaN/Inf so callers
//! can detect them; nothing here scrubs values.

use crate::attribute::analytic::{envelope_impl, instantaneous_phase_impl};
use crate::attribute::AttributeParams;
use crate::error::{AttributeError, AttributeResult};
use crate::signal::{first_derivative, unwrap_phase, AnalyticKernel};
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use std::f64::consts::PI;

/// Floor applied to instantaneous frequency in the sweetness denominator.
const SWEETNESS_FREQUENCY_FLOOR: f64 = 5.0;

/// Envelope derivative over envelope, clipped to [-1, 1].
pub(crate) fn relative_amplitude_change_impl<R, C, K>(
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
    let env_prime = first_derivative(client, &env, -1)?;
    let ratio = client.div(&env_prime, &env)?;
    Ok(client.clamp(&ratio, -1.0, 1.0)?)
}

/// Derivative of relative amplitude change along the depth axis.
pub(crate) fn amplitude_acceleration_impl<R, C, K>(
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
    let rac = relative_amplitude_change_impl(client, kernel_cb, darray, params)?;
    first_derivative(client, &rac, -1)
}

/// Instantaneous frequency in Hz, from the unwrapped phase derivative.
pub(crate) fn instantaneous_frequency_impl<R, C, K>(
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
    if params.sample_rate <= 0.0 {
        return Err(AttributeError::Configuration {
            context: format!(
                "sample rate must be positive milliseconds, got {}",
                params.sample_rate
            ),
        });
    }
    let fs = 1000.0 / params.sample_rate;

    let phase_deg = instantaneous_phase_impl(client, kernel_cb, darray, params)?;
    let phase_rad = client.mul_scalar(&phase_deg, PI / 180.0)?;
    let unwrapped = unwrap_phase(client, &phase_rad)?;
    let phase_prime = first_derivative(client, &unwrapped, -1)?;
    Ok(client.abs(&client.mul_scalar(&phase_prime, fs / (2.0 * PI))?)?)
}

/// Instantaneous bandwidth: |relative amplitude change| / 2 pi.
pub(crate) fn instantaneous_bandwidth_impl<R, C, K>(
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
    let rac = relative_amplitude_change_impl(client, kernel_cb, darray, params)?;
    Ok(client.mul_scalar(&client.abs(&rac)?, 1.0 / (2.0 * PI))?)
}

/// Dominant frequency: hypot of instantaneous frequency and bandwidth.
pub(crate) fn dominant_frequency_impl<R, C, K>(
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
    let freq = instantaneous_frequency_impl(client, kernel_cb, darray, params)?;
    let band = instantaneous_bandwidth_impl(client, kernel_cb, darray, params)?;
    let f2 = client.mul(&freq, &freq)?;
    let b2 = client.mul(&band, &band)?;
    Ok(client.sqrt(&client.add(&f2, &b2)?)?)
}

/// Derivative of instantaneous frequency along the depth axis.
pub(crate) fn frequency_change_impl<R, C, K>(
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
    let freq = instantaneous_frequency_impl(client, kernel_cb, darray, params)?;
    first_derivative(client, &freq, -1)
}

/// Sweetness: envelope over instantaneous frequency floored at 5 Hz.
pub(crate) fn sweetness_impl<R, C, K>(
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
    let freq = instantaneous_frequency_impl(client, kernel_cb, darray, params)?;
    let floored = client.clamp(&freq, SWEETNESS_FREQUENCY_FLOOR, f64::INFINITY)?;
    let env = envelope_impl(client, kernel_cb, darray, params)?;
    Ok(client.div(&env, &floored)?)
}

/// Quality factor: pi times instantaneous frequency over relative amplitude
/// change. A zero denominator yields Inf/NaN, which is propagated.
pub(crate) fn quality_factor_impl<R, C, K>(
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
    let freq = instantaneous_frequency_impl(client, kernel_cb, darray, params)?;
    let rac = relative_amplitude_change_impl(client, kernel_cb, darray, params)?;
    Ok(client.div(&client.mul_scalar(&freq, PI)?, &rac)?)
}

/// Angle, in degrees, of the phase-in-degrees volume.
///
/// This mirrors the reference implementation literally: it takes the angle
/// of an already real-valued phase array (0 where the phase is
/// non-negative, 180 where it is negative) rather than the cosine its name
/// suggests.
pub(crate) fn cosine_instantaneous_phase_impl<R, C, K>(
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
    let phase = instantaneous_phase_impl(client, kernel_cb, darray, params)?;
    let zeros = Tensor::zeros(phase.shape(), phase.dtype(), client.device());
    let angle = client.atan2(&zeros, &phase)?;
    Ok(client.mul_scalar(&angle, 180.0 / PI)?)
}
