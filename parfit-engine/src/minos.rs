use std::cell::Cell;

use tracing::debug;

use crate::{EngineError, Fcn, FunctionMinimum, Migrad, Strategy, crossing};

/// Relative accuracy of the located crossing, in units of the error definition.
const CROSSING_TOLERANCE: f64 = 0.01;

/// Asymmetric interval of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinosError {
    parameter: usize,
    lower: f64,
    upper: f64,
    lower_valid: bool,
    upper_valid: bool,
    nfcn: usize,
}

impl MinosError {
    /// User index of the parameter.
    pub fn parameter(&self) -> usize {
        self.parameter
    }

    /// Distance from the minimum to the lower crossing. Negative.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Distance from the minimum to the upper crossing. Positive.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Was the lower crossing found?
    pub fn lower_valid(&self) -> bool {
        self.lower_valid
    }

    /// Was the upper crossing found?
    pub fn upper_valid(&self) -> bool {
        self.upper_valid
    }

    /// Were both crossings found?
    pub fn is_valid(&self) -> bool {
        self.lower_valid && self.upper_valid
    }

    /// Objective evaluations spent on the profile minimizations.
    pub fn nfcn(&self) -> usize {
        self.nfcn
    }
}

/// Finds where the profile of one parameter, with all others re-minimized,
/// rises by the error definition above the minimum.
pub struct Minos<'f> {
    fcn: &'f dyn Fcn,
    minimum: &'f FunctionMinimum,
    strategy: Strategy,
}

impl<'f> Minos<'f> {
    /// Minos around `minimum`, which must come from minimizing `fcn`.
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

    /// Interval of the parameter at `index`.
    pub fn minos(&self, index: usize) -> Result<MinosError, EngineError> {
        let params = self.minimum.user_state().parameters();
        let p = params.checked(index)?;
        if p.is_fixed() {
            return Err(EngineError::FixedParameter {
                name: p.name().to_owned(),
            });
        }
        let center = p.value();
        let fmin = self.minimum.fval();
        let up = self.minimum.up();
        let calls = Cell::new(0);

        let profile = |value: f64| -> f64 {
            let mut fixed = params.clone();
            if fixed.set_value(index, value).is_err() || fixed.fix(index).is_err() {
                return f64::INFINITY;
            }
            let min = Migrad::new(self.fcn, &fixed)
                .with_strategy(self.strategy)
                .minimize();
            calls.set(calls.get() + min.nfcn());
            min.fval()
        };

        let upper = crossing::find(
            |t| profile(center + t),
            fmin,
            up,
            p.error(),
            p.upper().map(|u| u - center),
            CROSSING_TOLERANCE,
        );
        let lower = crossing::find(
            |t| profile(center - t),
            fmin,
            up,
            p.error(),
            p.lower().map(|l| center - l),
            CROSSING_TOLERANCE,
        );
        debug!(
            parameter = index,
            lower = -lower.offset,
            upper = upper.offset,
            "minos finished"
        );
        Ok(MinosError {
            parameter: index,
            lower: -lower.offset,
            upper: upper.offset,
            lower_valid: lower.valid,
            upper_valid: upper.valid,
            nfcn: calls.get(),
        })
    }
}
