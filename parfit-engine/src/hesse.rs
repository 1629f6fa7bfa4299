use faer::Mat;
use tracing::{debug, warn};

use crate::{
    Fcn, FunctionMinimum, Strategy, default_max_fcn,
    evaluator::Evaluator,
    gradient::{self, GradientState},
    linalg,
    minimum::InternalState,
    transform::EPS2,
};

/// Computes the full matrix of second derivatives at a minimum and replaces
/// the minimizer's covariance estimate with its inverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hesse {
    strategy: Strategy,
    max_calls: Option<usize>,
}

impl Hesse {
    /// Hesse with strategy 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cap the number of objective evaluations.
    pub fn with_max_calls(mut self, max_calls: usize) -> Self {
        self.max_calls = Some(max_calls);
        self
    }

    /// Refine `minimum` in place. Evaluations are added to its count. When
    /// the matrix cannot be computed, or had to be forced positive
    /// definite, the minimum is marked invalid.
    pub fn refine(&self, fcn: &dyn Fcn, minimum: &mut FunctionMinimum) {
        let trafo = minimum.transformation().clone();
        if trafo.n_free() == 0 {
            return;
        }
        let eval = Evaluator::new(fcn, &trafo);
        let max_calls = self
            .max_calls
            .unwrap_or_else(|| default_max_fcn(trafo.n_free()));
        match compute(&eval, minimum.internal(), self.strategy, max_calls) {
            Some(h) => {
                if h.made_pos_def {
                    warn!("hesse matrix was not positive definite");
                }
                minimum.apply_hesse(h.grad, h.inv_hessian, h.edm, eval.calls(), !h.made_pos_def);
            }
            None => {
                warn!("hesse failed");
                minimum.invalidate_errors(eval.calls());
            }
        }
    }
}

pub(crate) struct HesseResult {
    pub(crate) grad: GradientState,
    pub(crate) inv_hessian: Mat<f64>,
    pub(crate) edm: f64,
    pub(crate) made_pos_def: bool,
}

/// Second derivative matrix at `state`, inverted. `None` when a diagonal
/// element cannot be resolved or the budget runs out.
pub(crate) fn compute(
    eval: &Evaluator<'_>,
    state: &InternalState,
    strategy: Strategy,
    max_calls: usize,
) -> Option<HesseResult> {
    let start_calls = eval.calls();
    let x = &state.x;
    let n = x.len();

    if let Some(hessian) = eval.analytic_hessian(x) {
        let grad = match eval.analytic_gradient(x) {
            Some(grad) => GradientState {
                grad,
                g2: (0..n).map(|i| hessian[(i, i)]).collect(),
                gstep: state.grad.gstep.clone(),
            },
            None => {
                let fval = eval.value(x);
                gradient::numerical(eval, x, fval, &state.grad, strategy, strategy.grad_ncycles())
            }
        };
        return finish(hessian, grad);
    }

    let amin = eval.value(x);
    let up = eval.up();
    let aimsag = EPS2.sqrt() * (amin.abs() + up);
    let trafo = eval.trafo();

    let mut grad = state.grad.clone();
    let mut hessian = Mat::<f64>::zeros(n, n);
    let mut dirin = grad.gstep.clone();
    let mut yy = vec![0.0; n];
    let mut point = x.clone();

    for i in 0..n {
        let xtf = x[i];
        let dmin = 8.0 * EPS2 * (xtf.abs() + EPS2);
        let mut d = grad.gstep[i].abs().max(dmin);
        let limited = trafo.bound(i).is_limited();
        for _ in 0..strategy.hess_ncycles() {
            let mut sag = 0.0;
            let mut fs1 = 0.0;
            let mut fs2 = 0.0;
            for _ in 0..5 {
                point[i] = xtf + d;
                fs1 = eval.value(&point);
                point[i] = xtf - d;
                fs2 = eval.value(&point);
                point[i] = xtf;
                sag = 0.5 * (fs1 + fs2 - 2.0 * amin);
                if sag > EPS2 {
                    break;
                }
                if limited {
                    if d > 0.5 {
                        break;
                    }
                    d = (10.0 * d).min(0.51);
                } else {
                    d *= 10.0;
                }
            }
            if sag <= EPS2 || sag.is_nan() {
                debug!(parameter = i, sag, "hesse: zero or negative second derivative");
                return None;
            }
            let g2bfor = grad.g2[i];
            grad.g2[i] = 2.0 * sag / (d * d);
            grad.grad[i] = (fs1 - fs2) / (2.0 * d);
            grad.gstep[i] = d;
            dirin[i] = d;
            yy[i] = fs1;
            let dlast = d;
            d = (2.0 * aimsag / grad.g2[i].abs()).sqrt();
            if limited {
                d = d.min(0.5);
            }
            if d < dmin {
                d = dmin;
            }
            if ((d - dlast) / d).abs() < strategy.hess_step_tolerance() {
                break;
            }
            if ((grad.g2[i] - g2bfor) / grad.g2[i]).abs() < strategy.hess_g2_tolerance() {
                break;
            }
            d = d.min(10.0 * dlast).max(0.1 * dlast);
        }
        hessian[(i, i)] = grad.g2[i];
        if eval.calls() - start_calls > max_calls {
            debug!("hesse: call limit exceeded");
            return None;
        }
    }

    // Refine the gradient with the steps just tuned for curvature.
    grad = gradient::numerical(eval, x, amin, &grad, strategy, strategy.hess_grad_ncycles());

    for i in 0..n {
        point[i] = x[i] + dirin[i];
        for j in (i + 1)..n {
            point[j] = x[j] + dirin[j];
            let fs1 = eval.value(&point);
            let elem = (fs1 + amin - yy[i] - yy[j]) / (dirin[i] * dirin[j]);
            hessian[(i, j)] = elem;
            hessian[(j, i)] = elem;
            point[j] = x[j];
        }
        point[i] = x[i];
    }

    finish(hessian, grad)
}

fn finish(hessian: Mat<f64>, grad: GradientState) -> Option<HesseResult> {
    let (hessian, made_pos_def) = linalg::make_pos_def(&hessian);
    let inv_hessian = linalg::invert(&hessian)?;
    let edm = linalg::edm(&inv_hessian, &grad.grad);
    Some(HesseResult {
        grad,
        inv_hessian,
        edm,
        made_pos_def,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Migrad, Parameters};

    struct Tilted;

    impl Fcn for Tilted {
        fn value(&self, p: &[f64]) -> f64 {
            (p[0] - 1.0).powi(2) + 4.0 * (p[1] + 2.0).powi(2) + 0.3 * p[0] * p[1]
        }
    }

    struct Flat;

    impl Fcn for Flat {
        fn value(&self, p: &[f64]) -> f64 {
            p[0] * p[0]
        }
    }

    #[test]
    fn refine_adds_calls_and_keeps_covariance() {
        let mut params = Parameters::new();
        params.add("x", 0.4, 0.1);
        params.add("y", -1.0, 0.1);
        let mut min = Migrad::new(&Tilted, &params).minimize();
        let before = min.nfcn();
        Hesse::new().refine(&Tilted, &mut min);
        assert!(min.nfcn() > before);
        assert!(min.is_valid());
        let errors = min.user_state().errors();
        // sqrt(2 * (H^-1)_00) with H = [[2, .3], [.3, 8]]
        let expected = (2.0 * 8.0 / (16.0 - 0.09_f64)).sqrt();
        assert!((errors[0] - expected).abs() < 1e-4, "{errors:?}");
    }

    #[test]
    fn flat_direction_fails() {
        let mut params = Parameters::new();
        params.add("x", 0.0, 0.1);
        params.add("unused", 0.0, 0.1);
        let mut min = Migrad::new(&Flat, &params).minimize();
        Hesse::new().refine(&Flat, &mut min);
        assert!(!min.is_valid());
    }
}
