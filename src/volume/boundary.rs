//! Boundary fill policies for halo extension.
//!
//! Interior block faces read neighbor data; the outermost faces of the
//! volume have no neighbor and are filled according to a [`BoundaryFill`]
//! policy instead. Fill values only ever live in the halo region, so they
//! are never read back once the halo is trimmed.

use crate::error::{AttributeError, AttributeResult};
use crate::volume::as_volume_shape;
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// How to fill the halo on the outermost faces of the volume.
#[derive(Debug, Clone)]
pub enum BoundaryFill<R: Runtime> {
    /// Mirror existing samples, excluding the boundary sample itself:
    /// c b | a b c d | c b
    Reflect,
    /// Repeat the edge sample: a a | a b c d | d d
    Nearest,
    /// Fill with a constant value.
    Constant(f64),
    /// Take fill values from a caller-supplied volume of the halo-extended
    /// global shape. The interior of that volume is ignored.
    Volume(Tensor<R>),
}

impl<R: Runtime> Default for BoundaryFill<R> {
    fn default() -> Self {
        Self::Reflect
    }
}

/// Pad a volume by the halo on every side, filling outer faces per policy.
///
/// The result has shape `shape[axis] + 2 * halo[axis]` along every axis.
pub(crate) fn pad_volume<R, C>(
    client: &C,
    input: &Tensor<R>,
    halo: [usize; 3],
    fill: &BoundaryFill<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
{
    let shape = as_volume_shape(input.shape(), "pad_volume")?;
    if halo.iter().all(|&h| h == 0) {
        return Ok(input.contiguous());
    }

    match fill {
        BoundaryFill::Constant(value) => {
            // numr's pad takes (before, after) pairs from the last axis
            // backwards.
            let padding = [halo[2], halo[2], halo[1], halo[1], halo[0], halo[0]];
            Ok(client.pad(input, &padding, *value)?)
        }
        BoundaryFill::Reflect | BoundaryFill::Nearest => {
            let mut result = input.contiguous();
            for axis in 0..3 {
                if halo[axis] > 0 {
                    result = pad_axis_named(client, &result, axis, halo[axis], fill)?;
                }
            }
            Ok(result)
        }
        BoundaryFill::Volume(source) => pad_from_volume(client, input, shape, halo, source),
    }
}

/// Pad one axis with a named fill mode.
fn pad_axis_named<R, C>(
    client: &C,
    input: &Tensor<R>,
    axis: usize,
    pad: usize,
    fill: &BoundaryFill<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
{
    let len = input.shape()[axis];
    let axis = axis as isize;

    let (before, after) = match fill {
        BoundaryFill::Reflect => {
            if pad > len.saturating_sub(1) {
                return Err(AttributeError::Configuration {
                    context: format!(
                        "reflect fill needs a halo of at most extent - 1 ({}), got {}",
                        len.saturating_sub(1),
                        pad
                    ),
                });
            }
            let before = input.narrow(axis, 1, pad)?.flip(axis)?;
            let after = input.narrow(axis, len - 1 - pad, pad)?.flip(axis)?;
            (before, after)
        }
        BoundaryFill::Nearest => {
            let mut repeat_shape = [1usize; 3];
            repeat_shape[axis as usize] = pad;
            let first = input.narrow(axis, 0, 1)?;
            let last = input.narrow(axis, len - 1, 1)?;
            (
                client.repeat(&first, &repeat_shape)?,
                client.repeat(&last, &repeat_shape)?,
            )
        }
        _ => unreachable!("pad_axis_named only handles named fill modes"),
    };

    let parts = [&before, input, &after];
    Ok(client.cat(&parts, axis)?)
}

/// Pad every axis with slabs taken from a caller-supplied fill volume.
fn pad_from_volume<R, C>(
    client: &C,
    input: &Tensor<R>,
    shape: [usize; 3],
    halo: [usize; 3],
    source: &Tensor<R>,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ShapeOps<R> + RuntimeClient<R>,
{
    let expected: Vec<usize> = (0..3).map(|a| shape[a] + 2 * halo[a]).collect();
    if source.shape() != expected.as_slice() {
        return Err(AttributeError::ShapeMismatch {
            expected,
            actual: source.shape().to_vec(),
            context: "boundary fill volume".to_string(),
        });
    }

    let mut result = input.contiguous();
    for axis in 0..3 {
        if halo[axis] == 0 {
            continue;
        }
        // Slab cross-sections: axes already padded span the full extended
        // extent, axes not yet padded are restricted to the interior.
        let mut before = source.narrow(axis as isize, 0, halo[axis])?;
        let mut after = source.narrow(axis as isize, halo[axis] + shape[axis], halo[axis])?;
        for other in (axis + 1)..3 {
            before = before.narrow(other as isize, halo[other], shape[other])?;
            after = after.narrow(other as isize, halo[other], shape[other])?;
        }
        let parts = [&before, &result, &after];
        result = client.cat(&parts, axis as isize)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use numr::runtime::cpu::{CpuClient, CpuDevice};
    use numr::tensor::Tensor;

    fn setup() -> (CpuClient, CpuDevice) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (client, device)
    }

    #[test]
    fn test_reflect_pad_along_depth() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 4], &device);

        let padded = pad_volume(&client, &v, [0, 0, 2], &BoundaryFill::Reflect).unwrap();
        let data: Vec<f64> = padded.to_vec();
        assert_eq!(data, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_nearest_pad_along_depth() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 4], &device);

        let padded = pad_volume(&client, &v, [0, 0, 2], &BoundaryFill::Nearest).unwrap();
        let data: Vec<f64> = padded.to_vec();
        assert_eq!(data, vec![1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_constant_pad_along_depth() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[1.0, 2.0], &[1, 1, 2], &device);

        let padded = pad_volume(&client, &v, [0, 0, 1], &BoundaryFill::Constant(0.0)).unwrap();
        let data: Vec<f64> = padded.to_vec();
        assert_eq!(data, vec![0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_volume_fill_takes_border_samples() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[5.0, 6.0], &[1, 1, 2], &device);
        let source = Tensor::from_slice(&[9.0, 0.0, 0.0, 8.0], &[1, 1, 4], &device);

        let padded =
            pad_volume(&client, &v, [0, 0, 1], &BoundaryFill::Volume(source)).unwrap();
        let data: Vec<f64> = padded.to_vec();
        assert_eq!(data, vec![9.0, 5.0, 6.0, 8.0]);
    }

    #[test]
    fn test_volume_fill_shape_is_checked() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[5.0, 6.0], &[1, 1, 2], &device);
        let source = Tensor::from_slice(&[9.0, 0.0, 8.0], &[1, 1, 3], &device);

        let err = pad_volume(&client, &v, [0, 0, 1], &BoundaryFill::Volume(source)).unwrap_err();
        assert!(matches!(err, AttributeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_reflect_rejects_oversized_halo() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[1.0, 2.0], &[1, 1, 2], &device);

        assert!(pad_volume(&client, &v, [0, 0, 2], &BoundaryFill::Reflect).is_err());
    }

    #[test]
    fn test_pad_multiple_axes() {
        let (client, device) = setup();
        let v = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2], &device);

        let padded = pad_volume(&client, &v, [0, 1, 1], &BoundaryFill::Nearest).unwrap();
        assert_eq!(padded.shape(), &[1, 4, 4]);
        let data: Vec<f64> = padded.to_vec();
        // Rows: [1 1 2 2] repeated above, [1 1 2 2], [3 3 4 4], repeated below.
        assert_eq!(
            data,
            vec![
                1.0, 1.0, 2.0, 2.0, //
                1.0, 1.0, 2.0, 2.0, //
                3.0, 3.0, 4.0, 4.0, //
                3.0, 3.0, 4.0, 4.0,
            ]
        );
    }
}
