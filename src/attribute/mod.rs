//! The complex-trace attribute engine.
//!
//! [`ComplexTrace`] is an explicit context object: it holds the numeric
//! backend client and the analytic-signal kernel, both injected at
//! construction, and exposes one method per attribute. Every method takes
//! the input volume and an [`AttributeParams`] and returns a volume of the
//! same logical shape and dtype.
//!
//! Attributes form a directed acyclic graph of pure functions: amplitude
//! acceleration depends on relative amplitude change, which depends on the
//! envelope, which depends on the analytic signal. Each attribute
//! recomputes its dependencies from the input volume; nothing mutates
//! another attribute's output.

pub mod analytic;
pub mod formulas;
pub mod response;

pub use response::{pick_and_broadcast, PickMode};

use crate::error::AttributeResult;
use crate::signal::{AnalyticKernel, AnalyticSignal, FirHilbert};
use crate::volume::{BoundaryFill, PreviewAxis};
use numr::ops::{ScalarOps, ShapeOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;
use std::marker::PhantomData;

/// Default operator footprint: windowing along the depth axis only.
pub const DEFAULT_KERNEL: [usize; 3] = [1, 1, 25];

/// Default sample rate in milliseconds.
pub const DEFAULT_SAMPLE_RATE_MS: f64 = 4.0;

/// Per-call parameters shared by every attribute.
#[derive(Debug, Clone)]
pub struct AttributeParams<R: Runtime> {
    /// Operator footprint (odd positive extents). Determines the halo.
    pub kernel: [usize; 3],
    /// Sample rate in milliseconds.
    pub sample_rate: f64,
    /// Optional orientation hint: keep this axis unsplit for screening.
    pub preview: Option<PreviewAxis>,
    /// Fill policy for halos on the outermost volume faces.
    pub boundary: BoundaryFill<R>,
}

impl<R: Runtime> Default for AttributeParams<R> {
    fn default() -> Self {
        Self {
            kernel: DEFAULT_KERNEL,
            sample_rate: DEFAULT_SAMPLE_RATE_MS,
            preview: None,
            boundary: BoundaryFill::Reflect,
        }
    }
}

impl<R: Runtime> AttributeParams<R> {
    /// Create default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operator footprint.
    pub fn with_kernel(mut self, kernel: [usize; 3]) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the sample rate in milliseconds.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the preview orientation.
    pub fn with_preview(mut self, preview: PreviewAxis) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Set the boundary fill policy.
    pub fn with_boundary(mut self, boundary: BoundaryFill<R>) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Complex-trace attribute engine over a numr backend.
///
/// Construction injects the two capabilities every attribute needs: the
/// backend client and the analytic-signal kernel applied per block.
pub struct ComplexTrace<'a, R, C, K> {
    client: &'a C,
    analytic_kernel: K,
    _runtime: PhantomData<fn() -> R>,
}

impl<'a, R, C> ComplexTrace<'a, R, C, FirHilbert>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
{
    /// Engine with the built-in FIR Hilbert kernel sized to the default
    /// operator window.
    pub fn with_default_kernel(client: &'a C) -> Self {
        Self::new(client, FirHilbert::new(DEFAULT_KERNEL[2]))
    }
}

impl<'a, R, C, K> ComplexTrace<'a, R, C, K>
where
    R: Runtime,
    C: ScalarOps<R> + ShapeOps<R> + TensorOps<R> + RuntimeClient<R>,
    K: AnalyticKernel<R>,
{
    /// Create an engine from a backend client and an analytic kernel.
    pub fn new(client: &'a C, analytic_kernel: K) -> Self {
        Self {
            client,
            analytic_kernel,
            _runtime: PhantomData,
        }
    }

    /// The analytic signal of the volume (real/imaginary pair).
    pub fn analytic(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<AnalyticSignal<R>> {
        analytic::analytic_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Envelope (instantaneous amplitude).
    pub fn envelope(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        analytic::envelope_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Instantaneous phase in degrees.
    pub fn instantaneous_phase(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        analytic::instantaneous_phase_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Angle of the instantaneous phase volume, in degrees.
    pub fn cosine_instantaneous_phase(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::cosine_instantaneous_phase_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Relative amplitude change, clipped to [-1, 1].
    pub fn relative_amplitude_change(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::relative_amplitude_change_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Amplitude acceleration.
    pub fn amplitude_acceleration(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::amplitude_acceleration_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Instantaneous frequency in Hz.
    pub fn instantaneous_frequency(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::instantaneous_frequency_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Instantaneous bandwidth.
    pub fn instantaneous_bandwidth(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::instantaneous_bandwidth_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Dominant frequency.
    pub fn dominant_frequency(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::dominant_frequency_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Frequency change.
    pub fn frequency_change(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::frequency_change_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Sweetness.
    pub fn sweetness(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::sweetness_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Quality factor.
    pub fn quality_factor(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        formulas::quality_factor_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Response phase: instantaneous phase at each segment's envelope peak.
    pub fn response_phase(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        response::response_phase_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Response frequency: instantaneous frequency at each segment's
    /// envelope peak.
    pub fn response_frequency(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        response::response_frequency_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Response amplitude: input amplitude at each segment's envelope peak.
    pub fn response_amplitude(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        response::response_amplitude_impl(self.client, &self.analytic_kernel, darray, params)
    }

    /// Apparent polarity: signed envelope peak per segment.
    pub fn apparent_polarity(
        &self,
        darray: &Tensor<R>,
        params: &AttributeParams<R>,
    ) -> AttributeResult<Tensor<R>> {
        response::apparent_polarity_impl(self.client, &self.analytic_kernel, darray, params)
    }
}
