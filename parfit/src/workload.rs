use std::{fmt, str::FromStr};

use parfit_engine::{EngineError, Parameters};

use crate::{Error, Objective};

/// Starting configuration of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Starting value.
    pub value: f64,
    /// Initial step size.
    pub step: f64,
    /// Lower limit, if any.
    pub lower: Option<f64>,
    /// Upper limit, if any.
    pub upper: Option<f64>,
    /// Held constant during minimization.
    pub fixed: bool,
}

impl ParameterSpec {
    const fn free(name: &'static str, value: f64, step: f64) -> Self {
        Self {
            name,
            value,
            step,
            lower: None,
            upper: None,
            fixed: false,
        }
    }

    const fn limited(self, lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            ..self
        }
    }

    const fn at_least(self, lower: f64) -> Self {
        Self {
            lower: Some(lower),
            ..self
        }
    }

    const fn at_most(self, upper: f64) -> Self {
        Self {
            upper: Some(upper),
            ..self
        }
    }

    const fn fixed(self) -> Self {
        Self {
            fixed: true,
            ..self
        }
    }
}

/// The minimizer a workload starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minimizer {
    /// Variable metric at the given strategy level.
    Migrad {
        /// Strategy level, 0 to 2.
        strategy: u32,
    },
    /// Nelder-Mead simplex.
    Simplex,
    /// Migrad with simplex fallback.
    Minimize,
}

/// A post-fit step. Runs in order after the minimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// Refine the covariance in place.
    Hesse,
    /// Asymmetric interval of one parameter; reported in the result.
    Minos {
        /// Parameter index.
        parameter: usize,
    },
    /// Scan one parameter over two errors either side; discarded.
    Scan {
        /// Parameter index.
        parameter: usize,
        /// Number of points.
        points: usize,
    },
    /// Contour of two parameters; discarded.
    Contours {
        /// First parameter index.
        x: usize,
        /// Second parameter index.
        y: usize,
        /// Number of points.
        points: usize,
    },
}

/// Everything needed to run one workload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Workload {
    /// Registry key.
    pub id: WorkloadId,
    /// Label reported in the result.
    pub algorithm: &'static str,
    /// What is minimized.
    pub objective: Objective,
    /// Starting parameters.
    pub parameters: &'static [ParameterSpec],
    /// First algorithm.
    pub minimizer: Minimizer,
    /// Follow-up steps, in order.
    pub diagnostics: &'static [Diagnostic],
}

impl Workload {
    /// Engine parameters for this workload's starting point.
    pub fn engine_parameters(&self) -> Result<Parameters, EngineError> {
        let mut params = Parameters::new();
        for spec in self.parameters {
            let index = params.add(spec.name, spec.value, spec.step);
            match (spec.lower, spec.upper) {
                (Some(lower), Some(upper)) => params.set_limits(index, lower, upper)?,
                (Some(lower), None) => params.set_lower_limit(index, lower)?,
                (None, Some(upper)) => params.set_upper_limit(index, upper)?,
                (None, None) => {}
            }
            if spec.fixed {
                params.fix(index)?;
            }
        }
        Ok(params)
    }
}

macro_rules! workload_ids {
    ($($variant:ident => $name:literal,)*) => {
        /// Registered workloads.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum WorkloadId {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl WorkloadId {
            /// Every workload, in registry order.
            pub const ALL: &'static [WorkloadId] = &[$(Self::$variant,)*];

            /// The id as written on the command line.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        impl FromStr for WorkloadId {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)*
                    other => Err(Error::UnknownWorkload(other.to_owned())),
                }
            }
        }
    };
}

workload_ids! {
    Quadratic3FixxMigrad => "quadratic3_fixx_migrad",
    Quadratic3FixxHesse => "quadratic3_fixx_hesse",
    Rosenbrock2Migrad => "rosenbrock2_migrad",
    Quadratic2MinosP0 => "quadratic2_minos_p0",
    Quadratic2MinosP1 => "quadratic2_minos_p1",
    Quadratic2Simplex => "quadratic2_simplex",
    Rosenbrock2Minimize => "rosenbrock2_minimize",
    Quadratic2LimitedMigrad => "quadratic2_limited_migrad",
    Quadratic2LowerLimitedMigrad => "quadratic2_lower_limited_migrad",
    Quadratic2UpperLimitedMigrad => "quadratic2_upper_limited_migrad",
    Rosenbrock2MigradStrategy2 => "rosenbrock2_migrad_strategy2",
    Quadratic2ScanP0 => "quadratic2_scan_p0",
    Quadratic2ScanP1Limited => "quadratic2_scan_p1_limited",
    Quadratic2Contours01 => "quadratic2_contours_01",
    Quadratic2NoG2Migrad => "quadratic2_no_g2_migrad",
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorkloadId {
    /// The registered definition.
    pub fn workload(self) -> &'static Workload {
        &REGISTRY[self as usize]
    }
}

const QUADRATIC3_FIX_X: &[ParameterSpec] = &[
    ParameterSpec::free("x", 1.0, 0.1).fixed(),
    ParameterSpec::free("y", 2.0, 0.1),
    ParameterSpec::free("z", 3.0, 0.1),
];

const ROSENBROCK2: &[ParameterSpec] = &[
    ParameterSpec::free("x", 0.0, 0.1),
    ParameterSpec::free("y", 0.0, 0.1),
];

const QUADRATIC2: &[ParameterSpec] = &[
    ParameterSpec::free("x", 0.4, 0.1),
    ParameterSpec::free("y", -1.0, 0.1),
];

const QUADRATIC2_LIMITED: &[ParameterSpec] = &[
    ParameterSpec::free("x", 0.4, 0.1).limited(0.0, 2.0),
    ParameterSpec::free("y", -1.0, 0.1).limited(-3.0, -1.0),
];

const QUADRATIC2_LOWER: &[ParameterSpec] = &[
    ParameterSpec::free("x", 0.4, 0.1).at_least(0.0),
    ParameterSpec::free("y", -1.0, 0.1).at_least(-2.5),
];

const QUADRATIC2_UPPER: &[ParameterSpec] = &[
    ParameterSpec::free("x", 0.4, 0.1).at_most(1.8),
    ParameterSpec::free("y", -1.0, 0.1).at_most(-1.5),
];

const MIGRAD: Minimizer = Minimizer::Migrad { strategy: 1 };

/// Indexed by `WorkloadId as usize`.
static REGISTRY: [Workload; 15] = [
    Workload {
        id: WorkloadId::Quadratic3FixxMigrad,
        algorithm: "migrad",
        objective: Objective::Quadratic3,
        parameters: QUADRATIC3_FIX_X,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic3FixxHesse,
        algorithm: "migrad+hesse",
        objective: Objective::Quadratic3,
        parameters: QUADRATIC3_FIX_X,
        minimizer: MIGRAD,
        diagnostics: &[Diagnostic::Hesse],
    },
    Workload {
        id: WorkloadId::Rosenbrock2Migrad,
        algorithm: "migrad",
        objective: Objective::Rosenbrock2,
        parameters: ROSENBROCK2,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic2MinosP0,
        algorithm: "migrad+hesse+minos",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2,
        minimizer: MIGRAD,
        diagnostics: &[Diagnostic::Hesse, Diagnostic::Minos { parameter: 0 }],
    },
    Workload {
        id: WorkloadId::Quadratic2MinosP1,
        algorithm: "migrad+hesse+minos",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2,
        minimizer: MIGRAD,
        diagnostics: &[Diagnostic::Hesse, Diagnostic::Minos { parameter: 1 }],
    },
    Workload {
        id: WorkloadId::Quadratic2Simplex,
        algorithm: "simplex",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2,
        minimizer: Minimizer::Simplex,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Rosenbrock2Minimize,
        algorithm: "minimize",
        objective: Objective::Rosenbrock2,
        parameters: ROSENBROCK2,
        minimizer: Minimizer::Minimize,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic2LimitedMigrad,
        algorithm: "migrad",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2_LIMITED,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic2LowerLimitedMigrad,
        algorithm: "migrad",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2_LOWER,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic2UpperLimitedMigrad,
        algorithm: "migrad",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2_UPPER,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Rosenbrock2MigradStrategy2,
        algorithm: "migrad_s2",
        objective: Objective::Rosenbrock2,
        parameters: ROSENBROCK2,
        minimizer: Minimizer::Migrad { strategy: 2 },
        diagnostics: &[],
    },
    Workload {
        id: WorkloadId::Quadratic2ScanP0,
        algorithm: "migrad+scan",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2,
        minimizer: MIGRAD,
        diagnostics: &[Diagnostic::Scan {
            parameter: 0,
            points: 61,
        }],
    },
    Workload {
        id: WorkloadId::Quadratic2ScanP1Limited,
        algorithm: "migrad+scan",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2_LIMITED,
        minimizer: MIGRAD,
        diagnostics: &[Diagnostic::Scan {
            parameter: 1,
            points: 61,
        }],
    },
    Workload {
        id: WorkloadId::Quadratic2Contours01,
        algorithm: "migrad+hesse+contours",
        objective: Objective::Quadratic2,
        parameters: QUADRATIC2,
        minimizer: MIGRAD,
        diagnostics: &[
            Diagnostic::Hesse,
            Diagnostic::Contours {
                x: 0,
                y: 1,
                points: 12,
            },
        ],
    },
    Workload {
        id: WorkloadId::Quadratic2NoG2Migrad,
        algorithm: "migrad_no_g2",
        objective: Objective::QuadraticNoG2,
        parameters: QUADRATIC2,
        minimizer: MIGRAD,
        diagnostics: &[],
    },
];
