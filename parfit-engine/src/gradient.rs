use crate::{
    Strategy,
    evaluator::Evaluator,
    transform::{EPS, EPS2},
};

/// First derivatives, diagonal second derivatives and the step sizes that
/// produced them, all in internal coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradientState {
    pub(crate) grad: Vec<f64>,
    pub(crate) g2: Vec<f64>,
    pub(crate) gstep: Vec<f64>,
}

impl GradientState {
    /// Estimate from the user step sizes alone, before any evaluation.
    pub(crate) fn initial(eval: &Evaluator<'_>, internal: &[f64]) -> Self {
        let trafo = eval.trafo();
        let up = eval.up();
        let dirin = trafo.initial_steps(internal);
        let mut state = Self {
            grad: Vec::with_capacity(dirin.len()),
            g2: Vec::with_capacity(dirin.len()),
            gstep: Vec::with_capacity(dirin.len()),
        };
        for (k, (&d, &x)) in dirin.iter().zip(internal).enumerate() {
            let g2 = 2.0 * up / (d * d);
            let mut gstep = (8.0 * EPS2 * (x.abs() + EPS2)).max(0.1 * d);
            if trafo.bound(k).is_limited() && gstep > 0.5 {
                gstep = 0.5;
            }
            state.grad.push(g2 * d);
            state.g2.push(g2);
            state.gstep.push(gstep);
        }
        state
    }
}

/// Gradient at `x`, analytic when the objective supplies one. Second
/// derivatives and steps carry over from `previous` in the analytic case.
pub(crate) fn compute(
    eval: &Evaluator<'_>,
    x: &[f64],
    fval: f64,
    previous: &GradientState,
    strategy: Strategy,
) -> GradientState {
    match eval.analytic_gradient(x) {
        Some(grad) => GradientState {
            grad,
            g2: eval.analytic_g2(x).unwrap_or_else(|| previous.g2.clone()),
            gstep: previous.gstep.clone(),
        },
        None => numerical(eval, x, fval, previous, strategy, strategy.grad_ncycles()),
    }
}

/// Two-point central differences with steps tuned per coordinate so the
/// rounding and truncation errors balance.
pub(crate) fn numerical(
    eval: &Evaluator<'_>,
    x: &[f64],
    fval: f64,
    previous: &GradientState,
    strategy: Strategy,
    ncycles: usize,
) -> GradientState {
    let trafo = eval.trafo();
    let dfmin = 8.0 * EPS2 * (fval.abs() + eval.up());
    let vrysml = 8.0 * EPS * EPS;

    let mut state = previous.clone();
    let mut point = x.to_vec();
    for i in 0..x.len() {
        let xtf = x[i];
        let epspri = EPS2 + (state.grad[i] * EPS2).abs();
        let mut stepb4 = 0.0;
        for _ in 0..ncycles {
            let optstp = (dfmin / (state.g2[i].abs() + epspri)).sqrt();
            let mut step = optstp.max((0.1 * state.gstep[i]).abs());
            if trafo.bound(i).is_limited() && step > 0.5 {
                step = 0.5;
            }
            let stpmax = 10.0 * state.gstep[i].abs();
            if step > stpmax {
                step = stpmax;
            }
            let stpmin = vrysml.max(8.0 * (EPS2 * xtf).abs());
            if step < stpmin {
                step = stpmin;
            }
            if ((step - stepb4) / step).abs() < strategy.grad_step_tolerance() {
                break;
            }
            state.gstep[i] = step;
            stepb4 = step;

            point[i] = xtf + step;
            let fs1 = eval.value(&point);
            point[i] = xtf - step;
            let fs2 = eval.value(&point);
            point[i] = xtf;

            let grdb4 = state.grad[i];
            state.grad[i] = 0.5 * (fs1 - fs2) / step;
            state.g2[i] = (fs1 + fs2 - 2.0 * fval) / (step * step);

            if (grdb4 - state.grad[i]).abs() / (state.grad[i].abs() + dfmin / step)
                < strategy.grad_tolerance()
            {
                break;
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fcn, Parameters, transform::Transformation};

    struct Cubic;

    impl Fcn for Cubic {
        fn value(&self, p: &[f64]) -> f64 {
            p[0].powi(3) + 2.0 * p[1] * p[1]
        }
    }

    #[test]
    fn central_differences_are_accurate() {
        let mut params = Parameters::new();
        params.add("a", 1.5, 0.1);
        params.add("b", -0.5, 0.1);
        let trafo = Transformation::new(&params);
        let eval = Evaluator::new(&Cubic, &trafo);
        let x = trafo.initial_internal();
        let f = eval.value(&x);
        let seed = GradientState::initial(&eval, &x);
        let g = numerical(&eval, &x, f, &seed, Strategy::new(2), 5);
        assert!((g.grad[0] - 3.0 * 1.5 * 1.5).abs() < 1e-5);
        assert!((g.grad[1] + 2.0).abs() < 1e-5);
        assert!((g.g2[1] - 4.0).abs() < 1e-3);
        assert!(eval.calls() > 1);
    }

    #[test]
    fn initial_curvature_from_steps() {
        let mut params = Parameters::new();
        params.add("a", 0.0, 0.5);
        let trafo = Transformation::new(&params);
        let eval = Evaluator::new(&Cubic, &trafo);
        let seed = GradientState::initial(&eval, &[0.0]);
        assert!((seed.g2[0] - 8.0).abs() < 1e-12);
        assert!((seed.gstep[0] - 0.05).abs() < 1e-12);
        assert_eq!(eval.calls(), 0);
    }
}
