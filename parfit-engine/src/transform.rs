use std::f64::consts::FRAC_PI_2;

use faer::Mat;

use crate::{Covariance, Parameter, Parameters};

/// Relative machine precision assumed by the engine.
pub(crate) const EPS: f64 = 4.0e-16;
/// `2 * sqrt(EPS)`, the precision of quantities derived from differences.
pub(crate) const EPS2: f64 = 4.0e-8;

/// How a free parameter is mapped into the unbounded internal space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Bound {
    Free,
    Lower(f64),
    Upper(f64),
    Both { lower: f64, upper: f64 },
}

impl Bound {
    pub(crate) fn of(parameter: &Parameter) -> Self {
        match (parameter.lower(), parameter.upper()) {
            (Some(lower), Some(upper)) => Self::Both { lower, upper },
            (Some(lower), None) => Self::Lower(lower),
            (None, Some(upper)) => Self::Upper(upper),
            (None, None) => Self::Free,
        }
    }

    pub(crate) fn is_limited(self) -> bool {
        !matches!(self, Self::Free)
    }

    pub(crate) fn int2ext(self, value: f64) -> f64 {
        match self {
            Self::Free => value,
            Self::Both { lower, upper } => lower + 0.5 * (upper - lower) * (libm::sin(value) + 1.0),
            Self::Lower(lower) => lower - 1.0 + libm::sqrt(value * value + 1.0),
            Self::Upper(upper) => upper + 1.0 - libm::sqrt(value * value + 1.0),
        }
    }

    pub(crate) fn ext2int(self, value: f64) -> f64 {
        match self {
            Self::Free => value,
            Self::Both { lower, upper } => {
                let distnn = 8.0 * libm::sqrt(EPS2);
                let yy = 2.0 * (value - lower) / (upper - lower) - 1.0;
                if yy.abs() >= 1.0 - distnn {
                    if yy < 0.0 {
                        -FRAC_PI_2 + distnn
                    } else {
                        FRAC_PI_2 - distnn
                    }
                } else {
                    libm::asin(yy)
                }
            }
            Self::Lower(lower) => sqrt_branch(value - lower + 1.0),
            Self::Upper(upper) => sqrt_branch(upper - value + 1.0),
        }
    }

    /// d(external)/d(internal) at an internal value.
    pub(crate) fn dint2ext(self, value: f64) -> f64 {
        match self {
            Self::Free => 1.0,
            Self::Both { lower, upper } => 0.5 * ((upper - lower) * libm::cos(value)).abs(),
            Self::Lower(_) => value / libm::sqrt(value * value + 1.0),
            Self::Upper(_) => -value / libm::sqrt(value * value + 1.0),
        }
    }
}

fn sqrt_branch(yy: f64) -> f64 {
    let yy2 = yy * yy - 1.0;
    if yy2 < EPS2 { 0.0 } else { libm::sqrt(yy2) }
}

/// Mapping between the full user parameter list and the internal vector of
/// free parameters.
#[derive(Debug, Clone)]
pub(crate) struct Transformation {
    parameters: Parameters,
    free: Vec<usize>,
    bounds: Vec<Bound>,
}

impl Transformation {
    pub(crate) fn new(parameters: &Parameters) -> Self {
        let free: Vec<usize> = parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_fixed())
            .map(|(i, _)| i)
            .collect();
        let bounds = free.iter().map(|&i| Bound::of(&parameters[i])).collect();
        Self {
            parameters: parameters.clone(),
            free,
            bounds,
        }
    }

    pub(crate) fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub(crate) fn n_free(&self) -> usize {
        self.free.len()
    }

    /// User index of each internal coordinate.
    pub(crate) fn free(&self) -> &[usize] {
        &self.free
    }

    pub(crate) fn bound(&self, k: usize) -> Bound {
        self.bounds[k]
    }

    pub(crate) fn any_limited(&self) -> bool {
        self.bounds.iter().any(|b| b.is_limited())
    }

    /// Internal coordinate of a user index, if that parameter is free.
    pub(crate) fn internal_index(&self, index: usize) -> Option<usize> {
        self.free.iter().position(|&i| i == index)
    }

    pub(crate) fn initial_internal(&self) -> Vec<f64> {
        self.free
            .iter()
            .zip(&self.bounds)
            .map(|(&i, b)| b.ext2int(self.parameters[i].value()))
            .collect()
    }

    /// Full user-space vector, fixed parameters at their values.
    pub(crate) fn to_external(&self, internal: &[f64]) -> Vec<f64> {
        let mut ext = self.parameters.values();
        for ((&i, bound), &v) in self.free.iter().zip(&self.bounds).zip(internal) {
            ext[i] = bound.int2ext(v);
        }
        ext
    }

    /// Internal step sizes equivalent to the user errors at the starting
    /// point, truncated at the limits.
    pub(crate) fn initial_steps(&self, internal: &[f64]) -> Vec<f64> {
        self.free
            .iter()
            .zip(&self.bounds)
            .zip(internal)
            .map(|((&i, &bound), &var)| {
                let p = &self.parameters[i];
                let sav = bound.int2ext(var);
                let mut plus = sav + p.error();
                if let Some(upper) = p.upper() {
                    plus = plus.min(upper);
                }
                let mut minus = sav - p.error();
                if let Some(lower) = p.lower() {
                    minus = minus.max(lower);
                }
                let vplu = bound.ext2int(plus) - var;
                let vmin = bound.ext2int(minus) - var;
                let dirin = 0.5 * (vplu.abs() + vmin.abs());
                if dirin > 0.0 && dirin.is_finite() {
                    dirin
                } else {
                    p.error().max(EPS2)
                }
            })
            .collect()
    }

    /// User-space error of internal coordinate `k` with internal error `error`.
    pub(crate) fn int2ext_error(&self, k: usize, value: f64, error: f64) -> f64 {
        let bound = self.bounds[k];
        match bound {
            Bound::Free => error,
            Bound::Both { lower, upper } => {
                let ui = bound.int2ext(value);
                let mut du1 = bound.int2ext(value + error) - ui;
                let du2 = bound.int2ext(value - error) - ui;
                if error > 1.0 {
                    du1 = upper - lower;
                }
                0.5 * (du1.abs() + du2.abs())
            }
            Bound::Lower(_) | Bound::Upper(_) => {
                let ui = bound.int2ext(value);
                let du1 = bound.int2ext(value + error) - ui;
                let du2 = bound.int2ext(value - error) - ui;
                0.5 * (du1.abs() + du2.abs())
            }
        }
    }

    /// User-space covariance of the free parameters from the internal
    /// inverse Hessian.
    pub(crate) fn int2ext_covariance(
        &self,
        internal: &[f64],
        inv_hessian: &Mat<f64>,
        up: f64,
    ) -> Covariance {
        let d: Vec<f64> = self
            .bounds
            .iter()
            .zip(internal)
            .map(|(b, &v)| b.dint2ext(v))
            .collect();
        let n = d.len();
        let cov = Mat::from_fn(n, n, |i, j| 2.0 * up * d[i] * inv_hessian[(i, j)] * d[j]);
        Covariance::from_mat(&cov)
    }

    /// User parameters moved to the given internal point, with new errors.
    pub(crate) fn user_parameters(&self, internal: &[f64], errors: &[f64]) -> Parameters {
        let ext = self.to_external(internal);
        let mut parameters = self.parameters.clone();
        for (k, &i) in self.free.iter().enumerate() {
            parameters.set_state(i, ext[i], errors[k]);
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn double_bound_round_trip() {
        let b = Bound::Both {
            lower: 0.0,
            upper: 2.0,
        };
        for v in [0.1, 0.4, 1.0, 1.7] {
            assert!(close(b.int2ext(b.ext2int(v)), v, 1e-12));
        }
    }

    #[test]
    fn double_bound_clamps_at_limits() {
        let b = Bound::Both {
            lower: -3.0,
            upper: -1.0,
        };
        let at_upper = b.ext2int(-1.0);
        assert!(at_upper < FRAC_PI_2);
        assert!(close(b.int2ext(at_upper), -1.0, 1e-5));
        // Outside the range maps onto the nearest limit.
        assert!(close(b.ext2int(5.0), at_upper, 0.0));
    }

    #[test]
    fn one_sided_bounds() {
        let lower = Bound::Lower(-2.5);
        assert!(close(lower.int2ext(lower.ext2int(-1.0)), -1.0, 1e-12));
        assert_eq!(lower.ext2int(-2.5), 0.0);
        assert!(lower.int2ext(123.0) >= -2.5);

        let upper = Bound::Upper(1.8);
        assert!(close(upper.int2ext(upper.ext2int(0.4)), 0.4, 1e-12));
        assert!(upper.int2ext(-50.0) <= 1.8);
        assert!(upper.dint2ext(1.0) < 0.0);
    }

    #[test]
    fn fixed_parameters_are_skipped() {
        let mut params = Parameters::new();
        params.add("x", 1.0, 0.1);
        params.add("y", 2.0, 0.1);
        params.add("z", 3.0, 0.1);
        params.fix(0).unwrap();
        let trafo = Transformation::new(&params);
        assert_eq!(trafo.free(), &[1, 2]);
        assert_eq!(trafo.internal_index(0), None);
        assert_eq!(trafo.internal_index(2), Some(1));
        assert_eq!(trafo.to_external(&[5.0, 6.0]), vec![1.0, 5.0, 6.0]);
    }

    #[test]
    fn initial_steps_match_errors_when_free() {
        let mut params = Parameters::new();
        params.add("x", 0.4, 0.1);
        let trafo = Transformation::new(&params);
        let x = trafo.initial_internal();
        assert!(close(trafo.initial_steps(&x)[0], 0.1, 1e-15));
    }

    proptest::proptest! {
        #[test]
        fn internal_values_always_land_inside_limits(v in -1e3f64..1e3, lo in -50.0f64..50.0, width in 1e-3f64..100.0) {
            let both = Bound::Both { lower: lo, upper: lo + width };
            let ext = both.int2ext(v);
            proptest::prop_assert!(ext >= lo - 1e-9 && ext <= lo + width + 1e-9);
            proptest::prop_assert!(Bound::Lower(lo).int2ext(v) >= lo - 1e-9);
            proptest::prop_assert!(Bound::Upper(lo).int2ext(v) <= lo + 1e-9);
        }
    }
}
