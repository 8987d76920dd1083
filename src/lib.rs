//! Complex trace attributes for chunked 3D seismic volumes.
//!
//! This crate computes derived scalar volumes (envelope, instantaneous
//! phase/frequency/bandwidth, dominant frequency, sweetness, quality factor,
//! response phase/frequency/amplitude, apparent polarity) from 3D seismic
//! amplitude volumes that are too large to process as a single block.
//!
//! # Architecture
//!
//! The engine partitions a volume into blocks sized for a memory target,
//! extends each block with a halo so windowed operators produce correct
//! results at block boundaries, applies an analytic-signal kernel per block,
//! trims the halo back off, and composes attribute formulas on top.
//!
//! All volumes are `numr` tensors; implementations are generic over the
//! runtime and take a client bounded by the `numr::ops` capability traits,
//! so any backend satisfying the bounds can execute them. Blocks are
//! independent units of work: nothing here shares mutable state between
//! blocks, and outputs are combined by position.
//!
//! # Modules
//!
//! - [`volume`]: chunk planning, halo extension/trimming, boundary fill
//! - [`signal`]: derivative, phase unwrap, analytic-signal kernels
//! - [`attribute`]: the [`ComplexTrace`] engine and attribute formulas
//! - [`error`]: the [`AttributeError`] taxonomy
//!
//! # Attribute overview
//!
//! | Attribute | Definition |
//! |-----------|------------|
//! | envelope | magnitude of the analytic signal |
//! | instantaneous phase | angle of the analytic signal, degrees |
//! | relative amplitude change | envelope derivative / envelope, clipped to [-1, 1] |
//! | amplitude acceleration | derivative of relative amplitude change |
//! | instantaneous frequency | unwrapped phase derivative, scaled to Hz |
//! | instantaneous bandwidth | \|relative amplitude change\| / 2pi |
//! | dominant frequency | hypot(frequency, bandwidth) |
//! | frequency change | derivative of instantaneous frequency |
//! | sweetness | envelope / max(frequency, 5) |
//! | quality factor | pi * frequency / relative amplitude change |
//! | response phase/frequency/amplitude | companion value at the envelope peak of each trace segment |
//! | apparent polarity | signed envelope peak of each trace segment |
//!
//! The response attributes and apparent polarity share one segment-wise
//! peak-pick engine: each trace is partitioned at local minima of the
//! envelope, and a value taken at the segment's envelope peak is broadcast
//! to the whole segment.

pub mod attribute;
pub mod error;
pub mod signal;
pub mod volume;

pub use numr::dtype::DType;

pub use attribute::{AttributeParams, ComplexTrace, PickMode};
pub use error::{AttributeError, AttributeResult};
pub use signal::{AnalyticKernel, AnalyticSignal, FirHilbert};
pub use volume::{compute_chunk_shape, BoundaryFill, ChunkPlan, ChunkedVolume, PreviewAxis};
