//! Error types.

use thiserror::Error;

/// Result alias for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Fatal errors returned by the lookup pipeline.
///
/// Per-source failures (an unreadable input file) and per-item failures (a
/// hostname that does not resolve) are not represented here: the former are
/// logged and counted in the run summary, the latter become failure markers
/// in the output.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Generic I/O failure, typically while flushing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output file could not be created or truncated.
    #[error("cannot open output file {path}: {source}")]
    OutputOpen {
        /// The requested output path.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No input files were supplied.
    #[error("at least one input file is required")]
    NoInputs,

    /// More input files were supplied than producer threads are allowed.
    #[error("too many input files: {count} (maximum {max})")]
    TooManyInputs {
        /// Number of input files supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Invalid configuration values.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A worker thread could not be created.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// `"producer"` or `"consumer"`.
        role: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before finishing its work.
    #[error("{role} thread panicked")]
    WorkerPanicked {
        /// `"producer"` or `"consumer"`.
        role: &'static str,
    },
}

impl LookupError {
    /// Returns `true` if the error stems from how the program was invoked
    /// rather than from a runtime failure.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NoInputs | Self::TooManyInputs { .. } | Self::InvalidConfig(_)
        )
    }
}
