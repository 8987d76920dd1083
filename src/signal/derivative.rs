//! Finite-difference first derivative along a volume axis.

use crate::error::{AttributeError, AttributeResult};
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

/// First derivative along `axis`: central difference in the interior,
/// one-sided at the two edge samples. Output shape equals input shape.
///
/// Supports negative axis indexing; the depth axis is `-1`.
pub fn first_derivative<R, C>(
    client: &C,
    input: &Tensor<R>,
    axis: isize,
) -> AttributeResult<Tensor<R>>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
{
    let ndim = input.ndim() as isize;
    let normalized = if axis < 0 { ndim + axis } else { axis };
    if normalized < 0 || normalized >= ndim {
        return Err(AttributeError::Configuration {
            context: format!("axis {} out of range for rank {}", axis, input.ndim()),
        });
    }
    let axis = normalized;
    let len = input.shape()[axis as usize];
    if len < 2 {
        return Err(AttributeError::Configuration {
            context: format!("derivative needs at least 2 samples along axis {}", axis),
        });
    }

    let first = client.sub(&input.narrow(axis, 1, 1)?, &input.narrow(axis, 0, 1)?)?;
    let last = client.sub(
        &input.narrow(axis, len - 1, 1)?,
        &input.narrow(axis, len - 2, 1)?,
    )?;

    if len == 2 {
        let parts = [&first, &last];
        return Ok(client.cat(&parts, axis)?);
    }

    let forward = input.narrow(axis, 2, len - 2)?;
    let backward = input.narrow(axis, 0, len - 2)?;
    let interior = client.mul_scalar(&client.sub(&forward, &backward)?, 0.5)?;

    let parts = [&first, &interior, &last];
    Ok(client.cat(&parts, axis)?)
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
    fn test_ramp_has_unit_slope() {
        let (client, device) = setup();
        let x = Tensor::from_slice(&[0.0, 1.0, 2.0, 3.0, 4.0], &[1, 1, 5], &device);

        let dx = first_derivative(&client, &x, -1).unwrap();
        assert_eq!(dx.shape(), x.shape());
        let data: Vec<f64> = dx.to_vec();
        for &d in &data {
            assert!((d - 1.0).abs() < 1e-12, "slope should be 1.0, got {}", d);
        }
    }

    #[test]
    fn test_edges_are_one_sided() {
        let (client, device) = setup();
        let x = Tensor::from_slice(&[0.0, 4.0, 4.0, 4.0, 0.0], &[1, 1, 5], &device);

        let dx = first_derivative(&client, &x, -1).unwrap();
        let data: Vec<f64> = dx.to_vec();
        assert_eq!(data[0], 4.0); // x[1] - x[0]
        assert_eq!(data[1], 2.0); // (x[2] - x[0]) / 2
        assert_eq!(data[2], 0.0);
        assert_eq!(data[3], -2.0);
        assert_eq!(data[4], -4.0); // x[4] - x[3]
    }

    #[test]
    fn test_two_sample_axis() {
        let (client, device) = setup();
        let x = Tensor::from_slice(&[1.0, 3.0], &[1, 1, 2], &device);

        let dx = first_derivative(&client, &x, -1).unwrap();
        let data: Vec<f64> = dx.to_vec();
        assert_eq!(data, vec![2.0, 2.0]);
    }

    #[test]
    fn test_short_axis_is_rejected() {
        let (client, device) = setup();
        let x = Tensor::from_slice(&[1.0], &[1, 1, 1], &device);
        assert!(first_derivative(&client, &x, -1).is_err());
    }

    #[test]
    fn test_derivative_along_other_axis() {
        let (client, device) = setup();
        // Values increase by 10 per inline step.
        let x = Tensor::from_slice(&[0.0, 1.0, 10.0, 11.0, 20.0, 21.0], &[3, 1, 2], &device);

        let dx = first_derivative(&client, &x, 0).unwrap();
        let data: Vec<f64> = dx.to_vec();
        for &d in &data {
            assert!((d - 10.0).abs() < 1e-12);
        }
    }
}
