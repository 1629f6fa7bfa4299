/// Errors from configuring parameters or requesting error analysis.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum EngineError {
    /// A parameter index past the end of the parameter list.
    #[error("Parameter index {index} is out of range ({len} parameters defined)")]
    ParameterOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of defined parameters.
        len: usize,
    },
    /// The operation needs a free parameter.
    #[error("Parameter {name} is fixed")]
    FixedParameter {
        /// Name of the fixed parameter.
        name: String,
    },
    /// Lower limit is not strictly below the upper limit.
    #[error("Invalid limits for parameter {name}: lower {lower} is not below upper {upper}")]
    InvalidLimits {
        /// Parameter name.
        name: String,
        /// Requested lower limit.
        lower: f64,
        /// Requested upper limit.
        upper: f64,
    },
    /// A value, step or limit was NaN or infinite.
    #[error("Parameter {name} was given a non-finite {what}")]
    NonFinite {
        /// Parameter name.
        name: String,
        /// Which attribute was non-finite.
        what: &'static str,
    },
    /// A contour needs two distinct parameters.
    #[error("Contours need two distinct parameters, got {index} twice")]
    SameParameter {
        /// The repeated index.
        index: usize,
    },
    /// Too few points were requested.
    #[error("At least {minimum} points are needed, got {requested}")]
    TooFewPoints {
        /// Requested count.
        requested: usize,
        /// Smallest supported count.
        minimum: usize,
    },
}
