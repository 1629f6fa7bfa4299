use std::cell::Cell;

use faer::Mat;

use crate::{Fcn, packed_index, transform::Transformation};

/// Evaluates the objective at internal coordinates and counts calls.
pub(crate) struct Evaluator<'a> {
    fcn: &'a dyn Fcn,
    trafo: &'a Transformation,
    calls: Cell<usize>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(fcn: &'a dyn Fcn, trafo: &'a Transformation) -> Self {
        Self {
            fcn,
            trafo,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn value(&self, internal: &[f64]) -> f64 {
        self.calls.set(self.calls.get() + 1);
        self.fcn.value(&self.trafo.to_external(internal))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }

    pub(crate) fn up(&self) -> f64 {
        self.fcn.error_def()
    }

    pub(crate) fn trafo(&self) -> &Transformation {
        self.trafo
    }

    pub(crate) fn fcn(&self) -> &dyn Fcn {
        self.fcn
    }

    /// Analytic gradient in internal coordinates, when the objective has one.
    pub(crate) fn analytic_gradient(&self, internal: &[f64]) -> Option<Vec<f64>> {
        if !self.fcn.has_gradient() {
            return None;
        }
        let ext = self.trafo.to_external(internal);
        let g = self.fcn.gradient(&ext);
        if g.len() != ext.len() {
            return None;
        }
        Some(
            self.trafo
                .free()
                .iter()
                .enumerate()
                .map(|(k, &i)| g[i] * self.trafo.bound(k).dint2ext(internal[k]))
                .collect(),
        )
    }

    /// Analytic diagonal second derivatives in internal coordinates.
    /// Only valid where the transformation is linear.
    pub(crate) fn analytic_g2(&self, internal: &[f64]) -> Option<Vec<f64>> {
        if !self.fcn.has_g2() || self.trafo.any_limited() {
            return None;
        }
        let ext = self.trafo.to_external(internal);
        let g2 = self.fcn.g2(&ext);
        if g2.len() != ext.len() {
            return None;
        }
        Some(self.trafo.free().iter().map(|&i| g2[i]).collect())
    }

    /// Analytic Hessian of the free parameters. Only valid where the
    /// transformation is linear.
    pub(crate) fn analytic_hessian(&self, internal: &[f64]) -> Option<Mat<f64>> {
        if !self.fcn.has_hessian() || self.trafo.any_limited() {
            return None;
        }
        let ext = self.trafo.to_external(internal);
        let packed = self.fcn.hessian(&ext);
        let n_all = ext.len();
        if packed.len() != n_all * (n_all + 1) / 2 {
            return None;
        }
        let free = self.trafo.free();
        let n = free.len();
        Some(Mat::from_fn(n, n, |a, b| packed[packed_index(free[a], free[b])]))
    }
}
