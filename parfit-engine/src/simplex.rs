use tracing::debug;

use crate::{
    DEFAULT_TOLERANCE, Fcn, FunctionMinimum, Parameters, Strategy, default_max_fcn,
    evaluator::Evaluator,
    gradient::GradientState,
    migrad::{edm_target, fixed_point},
    minimum::{InternalState, Status},
    transform::Transformation,
};

/// Nelder-Mead simplex minimizer. Needs no derivatives and produces no
/// covariance; errors are taken from the extent of the final simplex.
pub struct Simplex<'f> {
    fcn: &'f dyn Fcn,
    parameters: Parameters,
    strategy: Strategy,
    max_fcn: Option<usize>,
    tolerance: f64,
}

impl<'f> Simplex<'f> {
    /// Simplex starting from the given parameters.
    pub fn new(fcn: &'f dyn Fcn, parameters: &Parameters) -> Self {
        Self {
            fcn,
            parameters: parameters.clone(),
            strategy: Strategy::default(),
            max_fcn: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the strategy. Only affects the seed gradient kept in the result.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cap the number of objective evaluations.
    pub fn with_max_fcn(mut self, max_fcn: usize) -> Self {
        self.max_fcn = Some(max_fcn);
        self
    }

    /// Stop once the spread of objective values across the simplex drops
    /// below `0.002 * tolerance * up`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Run the minimization.
    pub fn minimize(&self) -> FunctionMinimum {
        let trafo = Transformation::new(&self.parameters);
        let eval = Evaluator::new(self.fcn, &trafo);
        let max_fcn = self
            .max_fcn
            .unwrap_or_else(|| default_max_fcn(trafo.n_free()));
        let edm_max = edm_target(self.tolerance, eval.up());
        let (state, status) = if trafo.n_free() == 0 {
            (fixed_point(&eval), Status::Converged)
        } else {
            nelder_mead(&eval, max_fcn, edm_max)
        };
        debug!(
            fval = state.fval,
            edm = state.edm,
            nfcn = eval.calls(),
            ?status,
            strategy = self.strategy.level(),
            "simplex finished"
        );
        FunctionMinimum::new(trafo.clone(), state, eval.up(), eval.calls(), status)
    }
}

fn nelder_mead(eval: &Evaluator<'_>, max_fcn: usize, edm_max: f64) -> (InternalState, Status) {
    let x0 = eval.trafo().initial_internal();
    let steps = eval.trafo().initial_steps(&x0);
    let n = x0.len();

    let mut vertices: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    let f0 = eval.value(&x0);
    vertices.push((x0.clone(), f0));
    for (k, step) in steps.iter().enumerate() {
        let mut v = x0.clone();
        v[k] += step;
        let f = eval.value(&v);
        vertices.push((v, f));
    }

    let status = loop {
        vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
        let spread = vertices[n].1 - vertices[0].1;
        if spread < edm_max {
            break Status::Converged;
        }
        if eval.calls() >= max_fcn {
            break Status::CallLimit;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|k| vertices[..n].iter().map(|(v, _)| v[k]).sum::<f64>() / n as f64)
            .collect();
        let worst = vertices[n].clone();
        let towards = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&worst.0)
                .map(|(c, w)| c + coef * (c - w))
                .collect()
        };

        let reflected = towards(1.0);
        let fr = eval.value(&reflected);
        if fr < vertices[0].1 {
            let expanded = towards(2.0);
            let fe = eval.value(&expanded);
            vertices[n] = if fe < fr {
                (expanded, fe)
            } else {
                (reflected, fr)
            };
        } else if fr < vertices[n - 1].1 {
            vertices[n] = (reflected, fr);
        } else {
            let contracted = if fr < worst.1 { towards(0.5) } else { towards(-0.5) };
            let fc = eval.value(&contracted);
            if fc < fr.min(worst.1) {
                vertices[n] = (contracted, fc);
            } else {
                let best = vertices[0].0.clone();
                for vertex in vertices.iter_mut().skip(1) {
                    let shrunk: Vec<f64> = best
                        .iter()
                        .zip(&vertex.0)
                        .map(|(b, v)| b + 0.5 * (v - b))
                        .collect();
                    let f = eval.value(&shrunk);
                    *vertex = (shrunk, f);
                }
            }
        }
    };

    vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
    let spread = vertices[n].1 - vertices[0].1;
    let (mut x, mut fval) = vertices[0].clone();
    let centroid: Vec<f64> = (0..n)
        .map(|k| vertices.iter().map(|(v, _)| v[k]).sum::<f64>() / (n + 1) as f64)
        .collect();
    let fc = eval.value(&centroid);
    if fc < fval {
        x = centroid;
        fval = fc;
    }

    let step_errors: Vec<f64> = (0..n)
        .map(|k| {
            let extent = vertices
                .iter()
                .map(|(v, _)| (v[k] - x[k]).abs())
                .fold(0.0, f64::max);
            if extent > 0.0 { extent } else { steps[k] }
        })
        .collect();
    let grad = GradientState::initial(eval, &x);
    let state = InternalState {
        x,
        fval,
        grad,
        inv_hessian: None,
        step_errors,
        edm: spread,
        dcovar: 1.0,
    };
    (state, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tilted;

    impl Fcn for Tilted {
        fn value(&self, p: &[f64]) -> f64 {
            (p[0] - 1.0).powi(2) + 4.0 * (p[1] + 2.0).powi(2) + 0.3 * p[0] * p[1]
        }
    }

    #[test]
    fn converges_near_minimum_without_covariance() {
        let mut params = Parameters::new();
        params.add("x", 0.4, 0.1);
        params.add("y", -1.0, 0.1);
        let min = Simplex::new(&Tilted, &params).minimize();
        assert!(min.is_valid(), "{min:?}");
        // Stationary point of the tilted quadratic.
        let det = 2.0 * 8.0 - 0.09;
        let x = (2.0 * 8.0 + 0.3 * 16.0) / det;
        let y = (-16.0 * 2.0 - 0.3 * 2.0) / det;
        let p = min.params();
        assert!((p[0] - x).abs() < 0.05, "{p:?}");
        assert!((p[1] - y).abs() < 0.05, "{p:?}");
        assert!(min.user_state().covariance().is_none());
        assert!(min.user_state().errors().iter().all(|e| *e > 0.0));
    }

    #[test]
    fn budget_is_respected() {
        let mut params = Parameters::new();
        params.add("x", 40.0, 0.1);
        params.add("y", -10.0, 0.1);
        let min = Simplex::new(&Tilted, &params).with_max_fcn(20).minimize();
        assert!(min.has_reached_call_limit());
        assert!(!min.is_valid());
    }
}
