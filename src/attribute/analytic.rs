//! The analytic-signal stage: chunk, extend, transform per block, trim.

use crate::attribute::AttributeParams;
use crate::error::{AttributeError, AttributeResult};
use crate::signal::{AnalyticKernel, AnalyticSignal};
use crate::volume::{
    as_volume_shape, compute_chunk_shape, dtype_itemsize, validate_volume_dtype, ChunkPlan,
    ChunkedVolume,
};
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use std::f64::consts::PI;

/// Compute the analytic signal of a volume.
///
/// Pipeline: chunk planning, halo extension, per-block kernel application,
/// halo trimming, reassembly. The result covers the input's full index
/// range; samples near the volume faces were computed against
/// boundary-filled context.
pub(crate) fn analytic_impl<R, C, K>(
    client: &C,
    kernel_cb: &K,
    darray: &Tensor<R>,
    params: &AttributeParams<R>,
) -> AttributeResult<AnalyticSignal<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    let shape = as_volume_shape(darray.shape(), "analytic")?;
    validate_volume_dtype(darray.dtype(), "analytic")?;

    let kernel = params.kernel;
    let halo = [kernel[0] / 2, kernel[1] / 2, kernel[2] / 2];
    if kernel_cb.half_support() > halo[2] {
        return Err(AttributeError::Configuration {
            context: format!(
                "analytic kernel half-support {} exceeds operator half-window {}",
                kernel_cb.half_support(),
                halo[2]
            ),
        });
    }

    let chunk_shape = compute_chunk_shape(
        shape,
        dtype_itemsize(darray.dtype()),
        Some(kernel),
        params.preview,
    )?;
    let plan = ChunkPlan::new(shape, chunk_shape)?;
    let extended = ChunkedVolume::extend(client, darray, plan, halo, &params.boundary)?;

    let mut real_blocks = Vec::with_capacity(extended.blocks().len());
    let mut imag_blocks = Vec::with_capacity(extended.blocks().len());
    for block in extended.blocks() {
        let analytic = kernel_cb.apply(block)?;
        if analytic.real.shape() != block.shape() || analytic.imag.shape() != block.shape() {
            return Err(AttributeError::ShapeMismatch {
                expected: block.shape().to_vec(),
                actual: analytic.real.shape().to_vec(),
                context: "analytic kernel output".to_string(),
            });
        }
        real_blocks.push(analytic.real);
        imag_blocks.push(analytic.imag);
    }

    let real = extended
        .with_blocks(real_blocks)?
        .trim(kernel)?
        .assemble(client)?;
    let imag = extended
        .with_blocks(imag_blocks)?
        .trim(kernel)?
        .assemble(client)?;
    Ok(AnalyticSignal { real, imag })
}

/// Envelope: magnitude of the analytic signal. Non-negative everywhere.
pub(crate) fn envelope_impl<R, C, K>(
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
    let analytic = analytic_impl(client, kernel_cb, darray, params)?;
    let re2 = client.mul(&analytic.real, &analytic.real)?;
    let im2 = client.mul(&analytic.imag, &analytic.imag)?;
    Ok(client.sqrt(&client.add(&re2, &im2)?)?)
}

/// Instantaneous phase in degrees, in [-180, 180].
pub(crate) fn instantaneous_phase_impl<R, C, K>(
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
    let analytic = analytic_impl(client, kernel_cb, darray, params)?;
    let angle = client.atan2(&analytic.imag, &analytic.real)?;
    Ok(client.mul_scalar(&angle, 180.0 / PI)?)
}
