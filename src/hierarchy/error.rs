use thiserror::Error;

/// Failures raised while grouping records into a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid grouping configuration: {0}")]
    InvalidArgument(String),
    #[error("record {index} has no field '{field}'")]
    MissingField { index: usize, field: String },
}
