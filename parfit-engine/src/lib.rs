//! Function minimization with error analysis.
//!
//! The engine minimizes an [`Fcn`] over a set of user [`Parameters`]
//! (optionally bounded or fixed) and reports a [`FunctionMinimum`]. The
//! minimum can then be refined with [`Hesse`], queried for asymmetric
//! intervals with [`Minos`], traced with [`Contours`] or probed with [`Scan`].

pub use crate::contours::{ContourPoints, Contours};
pub use crate::error::EngineError;
pub use crate::fcn::{Fcn, packed_index};
pub use crate::hesse::Hesse;
pub use crate::migrad::Migrad;
pub use crate::minimize::Minimize;
pub use crate::minimum::{Covariance, FunctionMinimum, UserState};
pub use crate::minos::{Minos, MinosError};
pub use crate::parameters::{Parameter, Parameters};
pub use crate::scan::Scan;
pub use crate::simplex::Simplex;
pub use crate::strategy::Strategy;

/// Two-dimensional function contours around a minimum.
mod contours;
/// Root-finding along a profile, shared by Minos and contours.
mod crossing;
mod error;
/// Counting evaluator that maps internal coordinates to user coordinates.
mod evaluator;
/// The objective trait.
mod fcn;
/// Numerical and analytic gradients in internal coordinates.
mod gradient;
/// Full second-derivative matrix and covariance refinement.
mod hesse;
/// Small dense helpers on top of faer.
mod linalg;
/// Variable-metric minimizer.
mod migrad;
/// Migrad with a simplex fallback.
mod minimize;
/// The minimization result.
mod minimum;
/// Asymmetric parameter intervals.
mod minos;
/// User parameters.
mod parameters;
/// One-dimensional parameter scans.
mod scan;
/// Nelder-Mead simplex minimizer.
mod simplex;
/// Speed/accuracy tradeoffs for derivative calculations.
mod strategy;
/// Bound transformations between user and internal coordinates.
mod transform;

/// Name reported by harnesses that drive this engine.
pub const ENGINE_NAME: &str = "parfit-engine";

/// Default call budget for a minimization over `n_free` free parameters.
pub fn default_max_fcn(n_free: usize) -> usize {
    200 + 100 * n_free + 5 * n_free * n_free
}

/// Default convergence tolerance.
pub const DEFAULT_TOLERANCE: f64 = 0.1;
