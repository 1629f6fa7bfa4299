use parfit_engine::{Fcn, FunctionMinimum, Hesse, Migrad, Parameters, Strategy};

use crate::ingest::Dataset;

/// Objective value whenever a model prediction or the sum itself is not finite.
pub const PENALTY: f64 = 1e30;

/// A model `f(params, x)`.
pub type Model = fn(&[f64], f64) -> f64;

/// Sum of squared (optionally sigma-weighted) residuals of a model over a
/// dataset. Borrows the data so repeated solves don't copy it.
#[derive(Clone, Copy)]
pub struct LeastSquares<'a> {
    x: &'a [f64],
    y: &'a [f64],
    sigma: Option<&'a [f64]>,
    model: Model,
}

impl<'a> LeastSquares<'a> {
    /// Unweighted residuals.
    pub fn new(x: &'a [f64], y: &'a [f64], model: Model) -> Self {
        Self {
            x,
            y,
            sigma: None,
            model,
        }
    }

    /// Residuals divided by `sigma`, i.e. χ².
    pub fn weighted(x: &'a [f64], y: &'a [f64], sigma: &'a [f64], model: Model) -> Self {
        Self {
            x,
            y,
            sigma: Some(sigma),
            model,
        }
    }

    /// χ² over `data` if it carries uncertainties, plain least squares
    /// otherwise.
    pub fn of(data: &'a Dataset, model: Model) -> Self {
        match &data.sigma {
            Some(sigma) => Self::weighted(&data.x, &data.y, sigma, model),
            None => Self::new(&data.x, &data.y, model),
        }
    }

    /// Number of data points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// No data points?
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

impl Fcn for LeastSquares<'_> {
    fn value(&self, par: &[f64]) -> f64 {
        let mut sum = 0.0;
        for (i, (&x, &y)) in self.x.iter().zip(self.y).enumerate() {
            let prediction = (self.model)(par, x);
            if !prediction.is_finite() {
                return PENALTY;
            }
            let residual = match self.sigma {
                Some(sigma) => (y - prediction) / sigma[i],
                None => y - prediction,
            };
            sum += residual * residual;
        }
        if sum.is_finite() { sum } else { PENALTY }
    }
}

/// Budget and tolerance of a single case fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    /// Engine strategy level.
    pub strategy: u32,
    /// Maximum objective evaluations.
    pub max_fcn: usize,
    /// Convergence tolerance.
    pub tolerance: f64,
}

impl FitConfig {
    /// Settings of the single-start case fits.
    pub const CASE: Self = Self {
        strategy: 2,
        max_fcn: 300_000,
        tolerance: 0.01,
    };

    /// Settings of each multi-start attempt.
    pub const MULTI_START: Self = Self {
        strategy: 2,
        max_fcn: 600_000,
        tolerance: 0.001,
    };

    /// Run Migrad with these settings.
    pub fn migrad(self, fcn: &dyn Fcn, parameters: &Parameters) -> FunctionMinimum {
        Migrad::new(fcn, parameters)
            .with_strategy(Strategy::new(self.strategy))
            .with_max_fcn(self.max_fcn)
            .with_tolerance(self.tolerance)
            .minimize()
    }

    /// Run Migrad, then refine the covariance with Hesse.
    pub fn migrad_hesse(self, fcn: &dyn Fcn, parameters: &Parameters) -> FunctionMinimum {
        let mut minimum = self.migrad(fcn, parameters);
        Hesse::new().refine(fcn, &mut minimum);
        minimum
    }
}
