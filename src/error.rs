//! Error type shared by the pipeline stages.

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while loading, building features or training.
///
/// A floor with too little history is not an error: its rows are dropped by
/// the feature builder.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input file lacks a required column. Aborts the pipeline.
    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    /// The selected floor has no rows in the feature table.
    #[error("Floor {0} is not present in the data")]
    InvalidFloorSelection(i64),

    /// A data row could not be parsed.
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// Nothing left to fit a model on.
    #[error("No complete feature rows available for training")]
    InsufficientTrainingData,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
