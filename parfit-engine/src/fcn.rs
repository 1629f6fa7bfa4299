/// An objective function the engine can minimize.
///
/// Only [`Fcn::value`] is required. Derivatives are optional capabilities:
/// the engine only calls [`Fcn::gradient`], [`Fcn::hessian`] or [`Fcn::g2`]
/// when the matching `has_*` method returns true, and computes the
/// quantity numerically otherwise.
pub trait Fcn {
    /// Objective value at the given user-space parameters.
    fn value(&self, par: &[f64]) -> f64;

    /// Change in objective value that defines a one-sigma interval.
    /// 1 for chi-square style objectives, 0.5 for negative log-likelihoods.
    fn error_def(&self) -> f64 {
        1.0
    }

    /// Does this objective supply an analytic gradient?
    fn has_gradient(&self) -> bool {
        false
    }

    /// Gradient with one entry per parameter, fixed ones included.
    fn gradient(&self, _par: &[f64]) -> Vec<f64> {
        Vec::new()
    }

    /// Does this objective supply an analytic Hessian?
    fn has_hessian(&self) -> bool {
        false
    }

    /// Hessian as a packed upper triangle, see [`packed_index`].
    fn hessian(&self, _par: &[f64]) -> Vec<f64> {
        Vec::new()
    }

    /// Does this objective supply analytic diagonal second derivatives?
    fn has_g2(&self) -> bool {
        false
    }

    /// Diagonal second derivatives, one per parameter.
    fn g2(&self, _par: &[f64]) -> Vec<f64> {
        Vec::new()
    }
}

impl<F: Fcn + ?Sized> Fcn for &F {
    fn value(&self, par: &[f64]) -> f64 {
        (**self).value(par)
    }

    fn error_def(&self) -> f64 {
        (**self).error_def()
    }

    fn has_gradient(&self) -> bool {
        (**self).has_gradient()
    }

    fn gradient(&self, par: &[f64]) -> Vec<f64> {
        (**self).gradient(par)
    }

    fn has_hessian(&self) -> bool {
        (**self).has_hessian()
    }

    fn hessian(&self, par: &[f64]) -> Vec<f64> {
        (**self).hessian(par)
    }

    fn has_g2(&self) -> bool {
        (**self).has_g2()
    }

    fn g2(&self, par: &[f64]) -> Vec<f64> {
        (**self).g2(par)
    }
}

/// Position of element (i, j) of a symmetric matrix stored as a packed
/// upper triangle. Symmetric in its arguments.
pub fn packed_index(i: usize, j: usize) -> usize {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    lo + hi * (hi + 1) / 2
}
