//! Analytic-signal kernels.
//!
//! The attribute engine treats the analytic-signal transform as a pluggable
//! capability: any [`AnalyticKernel`] mapping a real block to a same-shape
//! complex block (represented as a real/imaginary tensor pair) can be
//! injected at engine construction. The engine only guarantees that each
//! block sees enough halo context for the kernel's support; it does not
//! certify equivalence with a global transform for kernels of unbounded
//! support.
//!
//! [`FirHilbert`] is the default kernel: a Hamming-windowed FIR Hilbert
//! filter applied zero-phase along the depth axis, whose support matches
//! the engine's operator window.

use crate::error::AttributeResult;
use crate::volume::{from_f64_like, to_f64_vec, validate_volume_dtype};
use numr::runtime::Runtime;
use numr::tensor::Tensor;
use std::f64::consts::PI;

/// A complex-valued volume stored as a real/imaginary tensor pair.
#[derive(Debug, Clone)]
pub struct AnalyticSignal<R: Runtime> {
    /// Real part (the input signal).
    pub real: Tensor<R>,
    /// Imaginary part (the quadrature signal).
    pub imag: Tensor<R>,
}

/// A windowed analytic-signal transform applied per block.
///
/// Implementations must preserve block shape and treat every trace along
/// the depth axis independently; the engine relies on both properties when
/// trimming halos.
pub trait AnalyticKernel<R: Runtime> {
    /// Transform a real block into its analytic signal.
    fn apply(&self, block: &Tensor<R>) -> AttributeResult<AnalyticSignal<R>>;

    /// Number of samples of depth-axis context the kernel needs on each
    /// side to produce an exact interior sample.
    fn half_support(&self) -> usize;
}

/// Hamming-windowed FIR Hilbert transformer.
///
/// Taps follow the ideal Hilbert response 2/(pi n) at odd offsets from the
/// center (zero elsewhere), shaped by a Hamming window. The filter is
/// applied centered, so the real part needs no group-delay compensation.
#[derive(Debug, Clone)]
pub struct FirHilbert {
    taps: Vec<f64>,
}

impl FirHilbert {
    /// Build a transformer with the given tap count.
    ///
    /// `num_taps` should be odd; an even count is incremented. A minimum of
    /// 3 taps is enforced.
    pub fn new(num_taps: usize) -> Self {
        let num_taps = if num_taps % 2 == 0 {
            num_taps + 1
        } else {
            num_taps
        };
        let num_taps = num_taps.max(3);
        Self {
            taps: Self::design_taps(num_taps),
        }
    }

    /// Number of taps in the filter.
    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    fn design_taps(num_taps: usize) -> Vec<f64> {
        let center = num_taps / 2;
        let mut taps = vec![0.0; num_taps];
        for (i, tap) in taps.iter_mut().enumerate() {
            let offset = i as f64 - center as f64;
            if (i + center) % 2 == 1 {
                let ideal = 2.0 / (PI * offset);
                let window =
                    0.54 - 0.46 * (2.0 * PI * i as f64 / (num_taps - 1) as f64).cos();
                *tap = ideal * window;
            }
        }
        taps
    }
}

impl<R> AnalyticKernel<R> for FirHilbert
where
    R: Runtime,
{
    fn apply(&self, block: &Tensor<R>) -> AttributeResult<AnalyticSignal<R>> {
        validate_volume_dtype(block.dtype(), "FirHilbert")?;

        let shape = block.shape().to_vec();
        let trace_len = *shape.last().unwrap_or(&0);
        let data = to_f64_vec(block);
        let center = self.taps.len() / 2;

        let mut imag = vec![0.0; data.len()];
        if trace_len > 0 {
            for trace_start in (0..data.len()).step_by(trace_len) {
                let trace = &data[trace_start..trace_start + trace_len];
                for t in 0..trace_len {
                    let mut acc = 0.0;
                    for (k, &tap) in self.taps.iter().enumerate() {
                        if tap == 0.0 {
                            continue;
                        }
                        // Centered convolution: sample at offset t + center - k.
                        let pos = t + center;
                        if pos >= k && pos - k < trace_len {
                            acc += tap * trace[pos - k];
                        }
                    }
                    imag[trace_start + t] = acc;
                }
            }
        }

        Ok(AnalyticSignal {
            real: block.contiguous(),
            imag: from_f64_like(&imag, block.shape(), block),
        })
    }

    fn half_support(&self) -> usize {
        self.taps.len() / 2
    }
}
