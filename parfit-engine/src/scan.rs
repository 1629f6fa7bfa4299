use crate::{EngineError, Fcn, Parameters};

/// Most points a single scan evaluates.
const MAX_POINTS: usize = 101;

/// Evaluates the objective along one parameter with all others held at
/// their current values.
pub struct Scan<'f> {
    fcn: &'f dyn Fcn,
    parameters: Parameters,
}

impl<'f> Scan<'f> {
    /// Scan around the given parameter values.
    pub fn new(fcn: &'f dyn Fcn, parameters: &Parameters) -> Self {
        Self {
            fcn,
            parameters: parameters.clone(),
        }
    }

    /// `(value, objective)` pairs at `npoints` equally spaced values of the
    /// parameter at `index`, at most 101. A `low` and `high` of zero scan
    /// two errors either side of the current value. The range is clipped
    /// to the parameter's limits; an empty range yields no points.
    #[allow(clippy::float_cmp)]
    pub fn scan(
        &self,
        index: usize,
        npoints: usize,
        low: f64,
        high: f64,
    ) -> Result<Vec<(f64, f64)>, EngineError> {
        let p = self.parameters.checked(index)?;
        if npoints < 2 {
            return Err(EngineError::TooFewPoints {
                requested: npoints,
                minimum: 2,
            });
        }
        let npoints = npoints.min(MAX_POINTS);
        let (mut low, mut high) = if low == 0.0 && high == 0.0 {
            (p.value() - 2.0 * p.error(), p.value() + 2.0 * p.error())
        } else {
            (low, high)
        };
        if let Some(lower) = p.lower() {
            low = low.max(lower);
        }
        if let Some(upper) = p.upper() {
            high = high.min(upper);
        }
        if low > high {
            return Ok(Vec::new());
        }

        let step = (high - low) / (npoints - 1) as f64;
        let mut values = self.parameters.values();
        let points = (0..npoints)
            .map(|i| {
                let x = low + i as f64 * step;
                values[index] = x;
                (x, self.fcn.value(&values))
            })
            .collect();
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line;

    impl Fcn for Line {
        fn value(&self, p: &[f64]) -> f64 {
            p[0] + 10.0 * p[1]
        }
    }

    fn params() -> Parameters {
        let mut params = Parameters::new();
        params.add("x", 1.0, 0.5);
        params.add("y", 2.0, 0.1);
        params
    }

    #[test]
    fn automatic_range_is_two_errors() {
        let points = Scan::new(&Line, &params()).scan(0, 5, 0.0, 0.0).unwrap();
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(points[0].1, 20.0);
    }

    #[test]
    fn range_is_clipped_to_limits() {
        let mut params = params();
        params.set_limits(1, 1.9, 2.05).unwrap();
        let points = Scan::new(&Line, &params).scan(1, 61, 0.0, 0.0).unwrap();
        assert_eq!(points.len(), 61);
        assert!((points[0].0 - 1.9).abs() < 1e-12);
        assert!((points[60].0 - 2.05).abs() < 1e-12);
    }

    #[test]
    fn point_count_is_capped() {
        let points = Scan::new(&Line, &params()).scan(0, 500, -1.0, 1.0).unwrap();
        assert_eq!(points.len(), 101);
    }
}
