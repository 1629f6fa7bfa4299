use parfit_engine::Fcn;

/// Synthetic objectives with known minima. All use an error definition of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `x² + 10y² + 100z² + 2xy + 4xz + 8yz`, with analytic gradient.
    Quadratic3,
    /// `100(y − x²)² + (1 − x)²`.
    Rosenbrock2,
    /// `(x − 1)² + 4(y + 2)² + 0.3xy`.
    Quadratic2,
    /// `(x − 1)² + (y + 2)²` with analytic gradient and Hessian but no
    /// diagonal second derivatives.
    QuadraticNoG2,
}

impl Objective {
    /// Number of parameters.
    pub fn dimension(self) -> usize {
        match self {
            Self::Quadratic3 => 3,
            Self::Rosenbrock2 | Self::Quadratic2 | Self::QuadraticNoG2 => 2,
        }
    }
}

impl Fcn for Objective {
    fn value(&self, p: &[f64]) -> f64 {
        match self {
            Self::Quadratic3 => {
                let (x, y, z) = (p[0], p[1], p[2]);
                x * x + 10.0 * y * y + 100.0 * z * z + 2.0 * x * y + 4.0 * x * z + 8.0 * y * z
            }
            Self::Rosenbrock2 => {
                let t1 = p[1] - p[0] * p[0];
                let t2 = 1.0 - p[0];
                100.0 * t1 * t1 + t2 * t2
            }
            Self::Quadratic2 => {
                let dx = p[0] - 1.0;
                let dy = p[1] + 2.0;
                dx * dx + 4.0 * dy * dy + 0.3 * p[0] * p[1]
            }
            Self::QuadraticNoG2 => {
                let dx = p[0] - 1.0;
                let dy = p[1] + 2.0;
                dx * dx + dy * dy
            }
        }
    }

    fn has_gradient(&self) -> bool {
        matches!(self, Self::Quadratic3 | Self::QuadraticNoG2)
    }

    fn gradient(&self, p: &[f64]) -> Vec<f64> {
        match self {
            Self::Quadratic3 => {
                let (x, y, z) = (p[0], p[1], p[2]);
                vec![
                    2.0 * x + 2.0 * y + 4.0 * z,
                    2.0 * x + 20.0 * y + 8.0 * z,
                    4.0 * x + 8.0 * y + 200.0 * z,
                ]
            }
            Self::QuadraticNoG2 => vec![2.0 * (p[0] - 1.0), 2.0 * (p[1] + 2.0)],
            Self::Rosenbrock2 | Self::Quadratic2 => Vec::new(),
        }
    }

    fn has_hessian(&self) -> bool {
        matches!(self, Self::QuadraticNoG2)
    }

    fn hessian(&self, _p: &[f64]) -> Vec<f64> {
        match self {
            // Packed upper triangle.
            Self::QuadraticNoG2 => vec![2.0, 0.0, 2.0],
            _ => Vec::new(),
        }
    }

    fn has_g2(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_minima() {
        assert_eq!(Objective::Quadratic3.value(&[0.0, 0.0, 0.0]), 0.0);
        assert_eq!(Objective::Rosenbrock2.value(&[1.0, 1.0]), 0.0);
        assert_eq!(Objective::QuadraticNoG2.value(&[1.0, -2.0]), 0.0);
        assert!((Objective::Quadratic2.value(&[0.4, -1.0]) - 4.24).abs() < 1e-12);
    }

    #[test]
    fn gradients_match_finite_differences() {
        for objective in [Objective::Quadratic3, Objective::QuadraticNoG2] {
            let p: Vec<f64> = (0..objective.dimension()).map(|i| 0.3 + i as f64).collect();
            let g = objective.gradient(&p);
            assert_eq!(g.len(), p.len());
            for i in 0..p.len() {
                let h = 1e-6;
                let mut plus = p.clone();
                plus[i] += h;
                let mut minus = p.clone();
                minus[i] -= h;
                let fd = (objective.value(&plus) - objective.value(&minus)) / (2.0 * h);
                assert!((fd - g[i]).abs() < 1e-5, "{objective:?} {i}: {fd} vs {}", g[i]);
            }
        }
    }

    #[test]
    fn capabilities() {
        assert!(Objective::Quadratic3.has_gradient());
        assert!(!Objective::Quadratic3.has_hessian());
        assert!(!Objective::Rosenbrock2.has_gradient());
        assert!(Objective::QuadraticNoG2.has_hessian());
        assert!(!Objective::QuadraticNoG2.has_g2());
        assert_eq!(Objective::QuadraticNoG2.hessian(&[0.0, 0.0]), vec![2.0, 0.0, 2.0]);
    }
}
