//! Chunked 3D volume handling.
//!
//! A seismic volume is a rank-3 tensor in (inline, crossline, depth) order.
//! This module decides how to partition such a volume into blocks
//! ([`compute_chunk_shape`], [`ChunkPlan`]), extends blocks with a halo so
//! windowed operators see enough context at block boundaries
//! ([`ChunkedVolume::extend`]), and trims the halo back off after the
//! operator has run ([`ChunkedVolume::trim`]).
//!
//! Halo-extended volumes are transient: they exist for one operator
//! application and are trimmed immediately after, so peak memory is bounded
//! by (block size + 2 x halo) per in-flight block rather than volume size.

pub mod boundary;
pub mod chunk;
pub mod chunked;

pub use boundary::BoundaryFill;
pub use chunk::{compute_chunk_shape, ChunkPlan, PreviewAxis};
pub use chunked::ChunkedVolume;

use crate::error::{AttributeError, AttributeResult};
use crate::DType;

/// Number of axes in a volume.
pub const VOLUME_RANK: usize = 3;

/// Validate that a tensor dtype is a supported volume element type.
pub(crate) fn validate_volume_dtype(dtype: DType, context: &str) -> AttributeResult<()> {
    match dtype {
        DType::F32 | DType::F64 => Ok(()),
        _ => Err(AttributeError::UnsupportedDtype {
            dtype,
            context: context.to_string(),
        }),
    }
}

/// Bytes per element for a supported volume dtype.
pub(crate) fn dtype_itemsize(dtype: DType) -> usize {
    match dtype {
        DType::F32 => 4,
        _ => 8,
    }
}

/// Read a volume into an f64 buffer, converting F32 data as needed.
pub(crate) fn to_f64_vec<R>(tensor: &numr::tensor::Tensor<R>) -> Vec<f64>
where
    R: numr::runtime::Runtime,
{
    let contig = tensor.contiguous();
    match tensor.dtype() {
        DType::F32 => {
            let data: Vec<f32> = contig.to_vec();
            data.into_iter().map(|v| v as f64).collect()
        }
        _ => contig.to_vec(),
    }
}

/// Build a tensor from an f64 buffer with the dtype and device of `like`.
pub(crate) fn from_f64_like<R>(
    data: &[f64],
    shape: &[usize],
    like: &numr::tensor::Tensor<R>,
) -> numr::tensor::Tensor<R>
where
    R: numr::runtime::Runtime,
{
    match like.dtype() {
        DType::F32 => {
            let demoted: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            numr::tensor::Tensor::from_slice(&demoted, shape, like.device())
        }
        _ => numr::tensor::Tensor::from_slice(data, shape, like.device()),
    }
}

/// Interpret a tensor shape as a rank-3 volume shape.
pub(crate) fn as_volume_shape(shape: &[usize], context: &str) -> AttributeResult<[usize; 3]> {
    if shape.len() != VOLUME_RANK {
        return Err(AttributeError::Configuration {
            context: format!("{}: expected a rank-3 volume, got shape {:?}", context, shape),
        });
    }
    if shape.iter().any(|&s| s == 0) {
        return Err(AttributeError::Configuration {
            context: format!("{}: volume extents must be positive, got {:?}", context, shape),
        });
    }
    Ok([shape[0], shape[1], shape[2]])
}
