use std::path::PathBuf;

/// Errors from turning raw text into datasets.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum IngestError {
    /// The file could not be read.
    #[error("Could not read {}: {error}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: std::io::Error,
    },
    /// Parsing finished without a single usable record.
    #[error("{what} contained no usable records")]
    Empty {
        /// Which dataset.
        what: String,
    },
    /// The header row does not name a required column.
    #[error("{what} has no column named '{column}'")]
    MissingColumn {
        /// Which dataset.
        what: String,
        /// The column that was looked up.
        column: String,
    },
    /// No `Data:` line introduced the observations.
    #[error("{what} has no data section")]
    MissingDataSection {
        /// Which dataset.
        what: String,
    },
    /// A reference dataset did not list one start/certified triple per parameter.
    #[error(
        "{what} should list {expected} parameters, but found {start_a} first starts, {start_b} second starts and {certified} certified values"
    )]
    WrongParameterCount {
        /// Which dataset.
        what: String,
        /// Parameters the model needs.
        expected: usize,
        /// First starting values found.
        start_a: usize,
        /// Second starting values found.
        start_b: usize,
        /// Certified values found.
        certified: usize,
    },
}

/// Errors from running workloads and cases.
#[derive(thiserror::Error, Debug)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Error {
    /// No workload is registered under this id.
    #[error("Unknown workload '{0}'")]
    UnknownWorkload(String),
    /// No case is registered under this id.
    #[error("Unknown case '{0}'")]
    UnknownCase(String),
    /// A dataset could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// The engine rejected a parameter configuration or diagnostic request.
    #[error("Engine rejected the request: {0}")]
    Engine(#[from] parfit_engine::EngineError),
    /// A fit did not meet its case's acceptance criterion.
    #[error("Case {case}: fit of {dataset} failed: {reason}")]
    Fit {
        /// Case id.
        case: &'static str,
        /// Dataset label.
        dataset: String,
        /// What went wrong.
        reason: String,
    },
    /// The result could not be encoded.
    #[error("Could not serialize the result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Is this an unknown workload or case id?
    pub fn is_unknown_id(&self) -> bool {
        matches!(self, Self::UnknownWorkload(_) | Self::UnknownCase(_))
    }
}
