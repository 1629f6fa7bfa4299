use std::cell::Cell;

use crate::{EngineError, Fcn, FunctionMinimum, Migrad, Parameter, Strategy, crossing};

const CROSSING_TOLERANCE: f64 = 0.01;

/// Points on a function contour.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPoints {
    points: Vec<(f64, f64)>,
    valid: bool,
    nfcn: usize,
}

impl ContourPoints {
    /// The (x, y) points in order of increasing angle.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Was every point located?
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Objective evaluations spent.
    pub fn nfcn(&self) -> usize {
        self.nfcn
    }
}

/// Traces the curve where the profile over two parameters rises by the
/// error definition above the minimum.
pub struct Contours<'f> {
    fcn: &'f dyn Fcn,
    minimum: &'f FunctionMinimum,
    strategy: Strategy,
}

impl<'f> Contours<'f> {
    /// Contours around `minimum`, which must come from minimizing `fcn`.
    pub fn new(fcn: &'f dyn Fcn, minimum: &'f FunctionMinimum) -> Self {
        Self {
            fcn,
            minimum,
            strategy: Strategy::default(),
        }
    }

    /// Strategy for the profile minimizations.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// `npoints` points of the contour of parameters `px` and `py`, found
    /// along rays at equally spaced angles scaled by the parameter errors.
    pub fn points(
        &self,
        px: usize,
        py: usize,
        npoints: usize,
    ) -> Result<ContourPoints, EngineError> {
        if px == py {
            return Err(EngineError::SameParameter { index: px });
        }
        if npoints < 4 {
            return Err(EngineError::TooFewPoints {
                requested: npoints,
                minimum: 4,
            });
        }
        let params = self.minimum.user_state().parameters();
        let p = free(params.checked(px)?)?;
        let q = free(params.checked(py)?)?;
        let (x0, y0) = (p.value(), q.value());
        let (ex, ey) = (p.error(), q.error());
        let fmin = self.minimum.fval();
        let up = self.minimum.up();
        let calls = Cell::new(0);

        let profile = |x: f64, y: f64| -> f64 {
            let mut fixed = params.clone();
            let moved = fixed.set_value(px, x).and_then(|()| fixed.set_value(py, y));
            if moved.is_err() || fixed.fix(px).is_err() || fixed.fix(py).is_err() {
                return f64::INFINITY;
            }
            let min = Migrad::new(self.fcn, &fixed)
                .with_strategy(self.strategy)
                .minimize();
            calls.set(calls.get() + min.nfcn());
            min.fval()
        };

        let mut points = Vec::with_capacity(npoints);
        let mut valid = true;
        for k in 0..npoints {
            let theta = std::f64::consts::TAU * k as f64 / npoints as f64;
            let dx = ex * theta.cos();
            let dy = ey * theta.sin();
            let limit = tighter(ray_limit(p, x0, dx), ray_limit(q, y0, dy));
            let c = crossing::find(
                |r| profile(x0 + r * dx, y0 + r * dy),
                fmin,
                up,
                1.0,
                limit,
                CROSSING_TOLERANCE,
            );
            valid &= c.valid;
            points.push((x0 + c.offset * dx, y0 + c.offset * dy));
        }
        Ok(ContourPoints {
            points,
            valid,
            nfcn: calls.get(),
        })
    }
}

fn free(p: &Parameter) -> Result<&Parameter, EngineError> {
    if p.is_fixed() {
        Err(EngineError::FixedParameter {
            name: p.name().to_owned(),
        })
    } else {
        Ok(p)
    }
}

/// Largest ray length before the parameter leaves its limits.
fn ray_limit(p: &Parameter, center: f64, direction: f64) -> Option<f64> {
    if direction > 0.0 {
        p.upper().map(|u| (u - center) / direction)
    } else if direction < 0.0 {
        p.lower().map(|l| (l - center) / direction)
    } else {
        None
    }
}

fn tighter(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hesse, Parameters};

    struct Round;

    impl Fcn for Round {
        fn value(&self, p: &[f64]) -> f64 {
            (p[0] - 1.0).powi(2) + (p[1] + 2.0).powi(2)
        }
    }

    fn minimum() -> FunctionMinimum {
        let mut params = Parameters::new();
        params.add("x", 0.4, 0.1);
        params.add("y", -1.0, 0.1);
        let mut min = Migrad::new(&Round, &params).minimize();
        Hesse::new().refine(&Round, &mut min);
        min
    }

    #[test]
    fn circle_of_radius_one() {
        let min = minimum();
        let contour = Contours::new(&Round, &min).points(0, 1, 12).unwrap();
        assert!(contour.is_valid());
        assert_eq!(contour.points().len(), 12);
        for &(x, y) in contour.points() {
            let r = ((x - 1.0).powi(2) + (y + 2.0).powi(2)).sqrt();
            assert!((r - 1.0).abs() < 0.02, "r = {r}");
        }
    }

    #[test]
    fn rejects_bad_requests() {
        let min = minimum();
        let c = Contours::new(&Round, &min);
        assert_eq!(
            c.points(1, 1, 12),
            Err(EngineError::SameParameter { index: 1 })
        );
        assert_eq!(
            c.points(0, 1, 3),
            Err(EngineError::TooFewPoints {
                requested: 3,
                minimum: 4
            })
        );
    }
}
