use faer::Mat;
use tracing::{debug, trace};

use crate::{
    Fcn, FunctionMinimum, Parameters, Strategy, DEFAULT_TOLERANCE, default_max_fcn,
    evaluator::Evaluator,
    gradient::{self, GradientState},
    hesse,
    linalg::{self, diagonal_inverse, dot, mat_vec},
    minimum::{InternalState, Status},
    transform::{EPS, EPS2, Transformation},
};

/// Hesse passes allowed at the end of one minimization.
const MAX_HESSE_PASSES: usize = 3;

/// Variable-metric minimizer with a Davidon-Fletcher-Powell update of the
/// inverse Hessian.
///
/// ```
/// use parfit_engine::{Fcn, Migrad, Parameters};
///
/// struct Parabola;
/// impl Fcn for Parabola {
///     fn value(&self, p: &[f64]) -> f64 {
///         (p[0] - 3.0).powi(2)
///     }
/// }
///
/// let mut params = Parameters::new();
/// params.add("x", 0.0, 0.1);
/// let min = Migrad::new(&Parabola, &params).minimize();
/// assert!(min.is_valid());
/// assert!((min.params()[0] - 3.0).abs() < 1e-4);
/// ```
pub struct Migrad<'f> {
    fcn: &'f dyn Fcn,
    parameters: Parameters,
    strategy: Strategy,
    max_fcn: Option<usize>,
    tolerance: f64,
}

impl<'f> Migrad<'f> {
    /// Minimizer starting from the given parameters, strategy 1.
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

    /// Cap the number of objective evaluations.
    pub fn with_max_fcn(mut self, max_fcn: usize) -> Self {
        self.max_fcn = Some(max_fcn);
        self
    }

    /// Convergence tolerance; the minimizer stops once the estimated
    /// distance to the minimum drops below `0.002 * tolerance * up`.
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

        let (state, status, error_valid) = if trafo.n_free() == 0 {
            (fixed_point(&eval), Status::Converged, true)
        } else {
            let seed = seed(&eval, self.strategy, max_fcn);
            variable_metric(&eval, seed, self.strategy, max_fcn, edm_max)
        };
        debug!(
            fval = state.fval,
            edm = state.edm,
            nfcn = eval.calls(),
            status = status.as_str(),
            "migrad finished"
        );
        let mut minimum =
            FunctionMinimum::new(trafo.clone(), state, eval.up(), eval.calls(), status);
        minimum.set_error_valid(error_valid);
        minimum
    }
}

/// Stopping threshold on the estimated distance to the minimum.
pub(crate) fn edm_target(tolerance: f64, up: f64) -> f64 {
    0.002 * (tolerance * up).max(EPS2)
}

/// State of a minimization with nothing to vary.
pub(crate) fn fixed_point(eval: &Evaluator<'_>) -> InternalState {
    InternalState {
        x: Vec::new(),
        fval: eval.value(&[]),
        grad: GradientState {
            grad: Vec::new(),
            g2: Vec::new(),
            gstep: Vec::new(),
        },
        inv_hessian: None,
        step_errors: Vec::new(),
        edm: 0.0,
        dcovar: 0.0,
    }
}

fn seed(eval: &Evaluator<'_>, strategy: Strategy, max_fcn: usize) -> InternalState {
    let x = eval.trafo().initial_internal();
    let fval = eval.value(&x);
    let initial = GradientState::initial(eval, &x);
    let grad = gradient::compute(eval, &x, fval, &initial, strategy);
    let inv_hessian = eval
        .analytic_hessian(&x)
        .filter(linalg::is_pos_def)
        .and_then(|h| linalg::invert(&h))
        .unwrap_or_else(|| diagonal_inverse(&grad.g2));
    let edm = linalg::edm(&inv_hessian, &grad.grad);
    let step_errors = eval.trafo().initial_steps(&x);
    let mut state = InternalState {
        x,
        fval,
        grad,
        inv_hessian: Some(inv_hessian),
        step_errors,
        edm,
        dcovar: 1.0,
    };
    if strategy.level() >= 2 && !eval.fcn().has_hessian() {
        if let Some(h) = hesse::compute(eval, &state, strategy, max_fcn) {
            state.grad = h.grad;
            state.inv_hessian = Some(h.inv_hessian);
            state.edm = h.edm;
            state.dcovar = 0.0;
        }
    }
    trace!(fval = state.fval, edm = state.edm, "migrad seed");
    state
}

fn variable_metric(
    eval: &Evaluator<'_>,
    mut state: InternalState,
    strategy: Strategy,
    max_fcn: usize,
    edm_max: f64,
) -> (InternalState, Status, bool) {
    let mut error_valid = true;
    let mut hesse_passes = 0;
    let mut was_reset = false;
    loop {
        if state.edm < edm_max {
            let wants_hesse =
                strategy.level() >= 2 || (strategy.level() == 1 && state.dcovar > 0.05);
            if wants_hesse && hesse_passes < MAX_HESSE_PASSES && eval.calls() < max_fcn {
                hesse_passes += 1;
                match hesse::compute(eval, &state, strategy, max_fcn) {
                    Some(h) => {
                        error_valid = !h.made_pos_def;
                        state.grad = h.grad;
                        state.inv_hessian = Some(h.inv_hessian);
                        state.edm = h.edm;
                        state.dcovar = 0.0;
                        if state.edm >= edm_max {
                            debug!(edm = state.edm, "edm above target after hesse, iterating");
                            continue;
                        }
                    }
                    None => error_valid = false,
                }
            }
            return (state, Status::Converged, error_valid);
        }
        if eval.calls() >= max_fcn {
            return (state, Status::CallLimit, error_valid);
        }

        let mut v = state
            .inv_hessian
            .take()
            .unwrap_or_else(|| diagonal_inverse(&state.grad.g2));
        let mut step = descent_direction(&v, &state.grad.grad);
        let mut gdel = dot(&step, &state.grad.grad);
        if gdel >= 0.0 || gdel.is_nan() {
            debug!(gdel, "not a descent direction, resetting inverse hessian");
            v = diagonal_inverse(&state.grad.g2);
            step = descent_direction(&v, &state.grad.grad);
            gdel = dot(&step, &state.grad.grad);
            if gdel >= 0.0 || gdel.is_nan() {
                state.inv_hessian = Some(v);
                break;
            }
        }

        let search = line_search(eval, &state.x, &step, state.fval, gdel, max_fcn);
        if search.alpha == 0.0 || state.fval - search.fval <= state.fval.abs() * EPS {
            if was_reset {
                debug!("no improvement in line search");
                state.inv_hessian = Some(v);
                break;
            }
            was_reset = true;
            let reset = diagonal_inverse(&state.grad.g2);
            state.edm = linalg::edm(&reset, &state.grad.grad);
            state.inv_hessian = Some(reset);
            continue;
        }
        was_reset = false;

        let dx: Vec<f64> = step.iter().map(|s| search.alpha * s).collect();
        let x_new: Vec<f64> = state.x.iter().zip(&dx).map(|(x, d)| x + d).collect();
        let grad_new = gradient::compute(eval, &x_new, search.fval, &state.grad, strategy);
        let dg: Vec<f64> = grad_new
            .grad
            .iter()
            .zip(&state.grad.grad)
            .map(|(a, b)| a - b)
            .collect();
        let (mut v_new, dcovar) = davidon(&v, &dx, &dg, state.dcovar);
        let mut edm = linalg::edm(&v_new, &grad_new.grad);
        if edm < 0.0 || edm.is_nan() {
            v_new = diagonal_inverse(&grad_new.g2);
            edm = linalg::edm(&v_new, &grad_new.grad);
        }
        trace!(fval = search.fval, edm, alpha = search.alpha, "migrad step");
        state = InternalState {
            x: x_new,
            fval: search.fval,
            grad: grad_new,
            inv_hessian: Some(v_new),
            step_errors: state.step_errors,
            edm,
            dcovar,
        };
    }

    let status = if state.edm < 10.0 * edm_max || state.edm < (EPS2 * state.fval).abs() {
        Status::Converged
    } else {
        Status::AboveMaxEdm
    };
    (state, status, error_valid)
}

fn descent_direction(v: &Mat<f64>, grad: &[f64]) -> Vec<f64> {
    mat_vec(v, grad).into_iter().map(|s| -s).collect()
}

/// Davidon-Fletcher-Powell rank-two update of the inverse Hessian.
/// Returns the new matrix and the running relative size of the updates.
fn davidon(v: &Mat<f64>, dx: &[f64], dg: &[f64], dcovar: f64) -> (Mat<f64>, f64) {
    let delgam = dot(dx, dg);
    let vg = mat_vec(v, dg);
    let gvg = dot(dg, &vg);
    if delgam.abs() < f64::MIN_POSITIVE || gvg <= 0.0 || !delgam.is_finite() {
        return (v.clone(), dcovar);
    }
    let n = dx.len();
    let mut update = Mat::from_fn(n, n, |i, j| {
        dx[i] * dx[j] / delgam - vg[i] * vg[j] / gvg
    });
    if delgam > gvg {
        let flnu: Vec<f64> = (0..n).map(|i| dx[i] / delgam - vg[i] / gvg).collect();
        for i in 0..n {
            for j in 0..n {
                update[(i, j)] += gvg * flnu[i] * flnu[j];
            }
        }
    }
    let v_new = Mat::from_fn(n, n, |i, j| v[(i, j)] + update[(i, j)]);
    let total = linalg::sum_abs(&v_new);
    let dcovar = if total > 0.0 {
        0.5 * (dcovar + linalg::sum_abs(&update) / total)
    } else {
        dcovar
    };
    (v_new, dcovar)
}

struct LineSearch {
    alpha: f64,
    fval: f64,
}

/// Backtracking search along `step` with parabolic interpolation, allowing
/// one extrapolation past the full step.
fn line_search(
    eval: &Evaluator<'_>,
    x: &[f64],
    step: &[f64],
    f0: f64,
    slope: f64,
    max_fcn: usize,
) -> LineSearch {
    const MAX_TRIALS: usize = 12;
    const SUFFICIENT_DECREASE: f64 = 1.0e-4;

    let at = |alpha: f64| -> f64 {
        let point: Vec<f64> = x.iter().zip(step).map(|(x, s)| x + alpha * s).collect();
        eval.value(&point)
    };
    let mut best = LineSearch {
        alpha: 0.0,
        fval: f0,
    };
    let mut alpha = 1.0;
    for _ in 0..MAX_TRIALS {
        if eval.calls() >= max_fcn {
            break;
        }
        let fa = at(alpha);
        if fa < best.fval {
            best = LineSearch { alpha, fval: fa };
        }
        let curvature = fa - f0 - slope * alpha;
        if fa <= f0 + SUFFICIENT_DECREASE * alpha * slope {
            if curvature > 0.0 {
                let vertex = -slope * alpha * alpha / (2.0 * curvature);
                if vertex > 1.5 * alpha && eval.calls() < max_fcn {
                    let extended = vertex.min(4.0 * alpha);
                    let fe = at(extended);
                    if fe < best.fval {
                        best = LineSearch {
                            alpha: extended,
                            fval: fe,
                        };
                    }
                }
            }
            break;
        }
        alpha = if fa.is_finite() && curvature > 0.0 {
            (-slope * alpha * alpha / (2.0 * curvature)).clamp(0.1 * alpha, 0.5 * alpha)
        } else {
            0.5 * alpha
        };
    }
    best
}
