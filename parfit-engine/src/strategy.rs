/// How much effort derivative calculations spend on accuracy.
///
/// Level 0 is cheapest, level 2 most careful. Levels above 2 behave as 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    level: u32,
    grad_ncycles: usize,
    grad_step_tolerance: f64,
    grad_tolerance: f64,
    hess_ncycles: usize,
    hess_step_tolerance: f64,
    hess_g2_tolerance: f64,
    hess_grad_ncycles: usize,
}

impl Strategy {
    /// Strategy at the given level.
    pub fn new(level: u32) -> Self {
        match level {
            0 => Self {
                level: 0,
                grad_ncycles: 2,
                grad_step_tolerance: 0.5,
                grad_tolerance: 0.1,
                hess_ncycles: 3,
                hess_step_tolerance: 0.5,
                hess_g2_tolerance: 0.1,
                hess_grad_ncycles: 1,
            },
            1 => Self {
                level: 1,
                grad_ncycles: 3,
                grad_step_tolerance: 0.3,
                grad_tolerance: 0.05,
                hess_ncycles: 5,
                hess_step_tolerance: 0.3,
                hess_g2_tolerance: 0.05,
                hess_grad_ncycles: 2,
            },
            _ => Self {
                level: 2,
                grad_ncycles: 5,
                grad_step_tolerance: 0.1,
                grad_tolerance: 0.02,
                hess_ncycles: 7,
                hess_step_tolerance: 0.1,
                hess_g2_tolerance: 0.02,
                hess_grad_ncycles: 6,
            },
        }
    }

    /// 0, 1 or 2.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn grad_ncycles(&self) -> usize {
        self.grad_ncycles
    }

    pub(crate) fn grad_step_tolerance(&self) -> f64 {
        self.grad_step_tolerance
    }

    pub(crate) fn grad_tolerance(&self) -> f64 {
        self.grad_tolerance
    }

    pub(crate) fn hess_ncycles(&self) -> usize {
        self.hess_ncycles
    }

    pub(crate) fn hess_step_tolerance(&self) -> f64 {
        self.hess_step_tolerance
    }

    pub(crate) fn hess_g2_tolerance(&self) -> f64 {
        self.hess_g2_tolerance
    }

    pub(crate) fn hess_grad_ncycles(&self) -> usize {
        self.hess_grad_ncycles
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new(1)
    }
}
