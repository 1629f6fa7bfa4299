use faer::Mat;

use crate::{Parameters, gradient::GradientState, transform::Transformation};

/// Covariance matrix of the free parameters in user coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    nrow: usize,
    data: Vec<f64>,
}

impl Covariance {
    pub(crate) fn from_mat(m: &Mat<f64>) -> Self {
        let nrow = m.nrows();
        let mut data = Vec::with_capacity(nrow * nrow);
        for i in 0..nrow {
            for j in 0..nrow {
                data.push(m[(i, j)]);
            }
        }
        Self { nrow, data }
    }

    /// Number of rows (and columns): the number of free parameters.
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    /// Element (i, j).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.nrow + j]
    }

    /// Row-major copy.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.nrow.max(1)).map(<[f64]>::to_vec).collect()
    }
}

/// Parameter values, errors and covariance at a minimum, in user coordinates.
#[derive(Debug, Clone)]
pub struct UserState {
    parameters: Parameters,
    covariance: Option<Covariance>,
}

impl UserState {
    /// Values of every parameter, fixed ones included.
    pub fn params(&self) -> Vec<f64> {
        self.parameters.values()
    }

    /// Errors of every parameter. Fixed parameters keep their step size.
    pub fn errors(&self) -> Vec<f64> {
        self.parameters.errors()
    }

    /// The parameters with their updated values and errors.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Covariance of the free parameters, when the minimizer produced one.
    pub fn covariance(&self) -> Option<&Covariance> {
        self.covariance.as_ref()
    }
}

/// The minimizer's working state, in internal coordinates.
#[derive(Debug, Clone)]
pub(crate) struct InternalState {
    pub(crate) x: Vec<f64>,
    pub(crate) fval: f64,
    pub(crate) grad: GradientState,
    /// Absent for minimizers that never estimate curvature.
    pub(crate) inv_hessian: Option<Mat<f64>>,
    /// Internal errors used when there is no inverse Hessian.
    pub(crate) step_errors: Vec<f64>,
    pub(crate) edm: f64,
    pub(crate) dcovar: f64,
}

impl InternalState {
    fn internal_errors(&self, up: f64) -> Vec<f64> {
        match &self.inv_hessian {
            Some(v) => (0..self.x.len())
                .map(|k| (2.0 * up * v[(k, k)]).max(0.0).sqrt())
                .collect(),
            None => self.step_errors.clone(),
        }
    }
}

/// Why a minimization stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Converged,
    CallLimit,
    AboveMaxEdm,
}

impl Status {
    /// Human-readable status, useful for debugging.
    #[mutants::skip]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Status::Converged => "converged",
            Status::CallLimit => "call limit reached",
            Status::AboveMaxEdm => "edm above target",
        }
    }
}

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct FunctionMinimum {
    user: UserState,
    internal: InternalState,
    trafo: Transformation,
    up: f64,
    nfcn: usize,
    status: Status,
    error_valid: bool,
}

impl FunctionMinimum {
    pub(crate) fn new(
        trafo: Transformation,
        internal: InternalState,
        up: f64,
        nfcn: usize,
        status: Status,
    ) -> Self {
        let user = user_state(&trafo, &internal, up);
        Self {
            user,
            internal,
            trafo,
            up,
            nfcn,
            status,
            error_valid: true,
        }
    }

    /// Did the minimizer converge within budget with usable errors?
    pub fn is_valid(&self) -> bool {
        self.status == Status::Converged && self.error_valid && self.internal.fval.is_finite()
    }

    /// Objective value at the minimum.
    pub fn fval(&self) -> f64 {
        self.internal.fval
    }

    /// Estimated vertical distance to the true minimum.
    pub fn edm(&self) -> f64 {
        self.internal.edm
    }

    /// Objective evaluations spent, including any refinement.
    pub fn nfcn(&self) -> usize {
        self.nfcn
    }

    /// Error definition of the objective that was minimized.
    pub fn up(&self) -> f64 {
        self.up
    }

    /// Did the minimizer stop because it ran out of calls?
    pub fn has_reached_call_limit(&self) -> bool {
        self.status == Status::CallLimit
    }

    /// Did the minimizer stop short of the requested tolerance?
    pub fn is_above_max_edm(&self) -> bool {
        self.status == Status::AboveMaxEdm
    }

    /// Values, errors and covariance in user coordinates.
    pub fn user_state(&self) -> &UserState {
        &self.user
    }

    /// Shorthand for `user_state().params()`.
    pub fn params(&self) -> Vec<f64> {
        self.user.params()
    }

    pub(crate) fn internal(&self) -> &InternalState {
        &self.internal
    }

    pub(crate) fn transformation(&self) -> &Transformation {
        &self.trafo
    }

    pub(crate) fn add_calls(&mut self, calls: usize) {
        self.nfcn += calls;
    }

    /// Replace the curvature estimate after a Hesse pass.
    pub(crate) fn apply_hesse(
        &mut self,
        grad: GradientState,
        inv_hessian: Mat<f64>,
        edm: f64,
        calls: usize,
        error_valid: bool,
    ) {
        self.internal.grad = grad;
        self.internal.inv_hessian = Some(inv_hessian);
        self.internal.edm = edm;
        self.nfcn += calls;
        self.error_valid = error_valid;
        self.user = user_state(&self.trafo, &self.internal, self.up);
    }

    pub(crate) fn invalidate_errors(&mut self, calls: usize) {
        self.nfcn += calls;
        self.error_valid = false;
    }

    pub(crate) fn set_error_valid(&mut self, error_valid: bool) {
        self.error_valid = error_valid;
    }
}

fn user_state(trafo: &Transformation, internal: &InternalState, up: f64) -> UserState {
    let int_errors = internal.internal_errors(up);
    let errors: Vec<f64> = int_errors
        .iter()
        .enumerate()
        .map(|(k, &e)| trafo.int2ext_error(k, internal.x[k], e))
        .collect();
    UserState {
        parameters: trafo.user_parameters(&internal.x, &errors),
        covariance: internal
            .inv_hessian
            .as_ref()
            .map(|v| trafo.int2ext_covariance(&internal.x, v, up)),
    }
}
