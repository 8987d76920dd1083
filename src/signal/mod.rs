//! Signal-processing collaborators for the attribute formulas.
//!
//! These operators are block-local along every axis except at the two edge
//! samples, so they run on trimmed volumes without any halo:
//!
//! - [`first_derivative`]: central difference with one-sided edges
//! - [`unwrap_phase`]: per-trace phase unwrap along the depth axis
//! - [`AnalyticKernel`] / [`FirHilbert`]: the pluggable analytic-signal
//!   kernel applied per halo-extended block

pub mod analytic;
pub mod derivative;
pub mod phase;

pub use analytic::{AnalyticKernel, AnalyticSignal, FirHilbert};
pub use derivative::first_derivative;
pub use phase::unwrap_phase;
