use tracing::debug;

use crate::{DEFAULT_TOLERANCE, Fcn, FunctionMinimum, Migrad, Parameters, Simplex, Strategy};

/// Migrad first; if that fails, a simplex pass followed by Migrad again
/// from the simplex result. Evaluation counts accumulate across passes.
pub struct Minimize<'f> {
    fcn: &'f dyn Fcn,
    parameters: Parameters,
    strategy: Strategy,
    max_fcn: Option<usize>,
    tolerance: f64,
}

impl<'f> Minimize<'f> {
    /// Combined minimizer starting from the given parameters.
    pub fn new(fcn: &'f dyn Fcn, parameters: &Parameters) -> Self {
        Self {
            fcn,
            parameters: parameters.clone(),
            strategy: Strategy::default(),
            max_fcn: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cap the evaluations of each pass.
    pub fn with_max_fcn(mut self, max_fcn: usize) -> Self {
        self.max_fcn = Some(max_fcn);
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Run the minimization.
    pub fn minimize(&self) -> FunctionMinimum {
        let first = self.configure(Migrad::new(self.fcn, &self.parameters)).minimize();
        if first.is_valid() {
            return first;
        }
        debug!("migrad did not converge, trying simplex");
        let mut simplex = Simplex::new(self.fcn, &self.parameters)
            .with_strategy(self.strategy)
            .with_tolerance(self.tolerance);
        if let Some(max_fcn) = self.max_fcn {
            simplex = simplex.with_max_fcn(max_fcn);
        }
        let simplex = simplex.minimize();
        let restart = simplex.user_state().parameters();
        let mut second = self.configure(Migrad::new(self.fcn, restart)).minimize();
        second.add_calls(first.nfcn() + simplex.nfcn());
        second
    }

    fn configure(&self, migrad: Migrad<'f>) -> Migrad<'f> {
        let migrad = migrad
            .with_strategy(self.strategy)
            .with_tolerance(self.tolerance);
        match self.max_fcn {
            Some(max_fcn) => migrad.with_max_fcn(max_fcn),
            None => migrad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rosenbrock;

    impl Fcn for Rosenbrock {
        fn value(&self, p: &[f64]) -> f64 {
            100.0 * (p[1] - p[0] * p[0]).powi(2) + (1.0 - p[0]).powi(2)
        }
    }

    #[test]
    fn falls_back_and_accumulates_calls() {
        let mut params = Parameters::new();
        params.add("x", -1.2, 0.1);
        params.add("y", 1.0, 0.1);
        // Too small for migrad alone, so the fallback runs.
        let min = Minimize::new(&Rosenbrock, &params)
            .with_max_fcn(30)
            .minimize();
        assert!(min.nfcn() > 30);
    }

    #[test]
    fn valid_first_pass_is_returned_as_is() {
        let mut params = Parameters::new();
        params.add("x", 0.0, 0.1);
        params.add("y", 0.0, 0.1);
        let direct = Migrad::new(&Rosenbrock, &params).minimize();
        let combined = Minimize::new(&Rosenbrock, &params).minimize();
        if direct.is_valid() {
            assert_eq!(direct.nfcn(), combined.nfcn());
        }
        assert!(combined.fval() < 0.5);
    }
}
