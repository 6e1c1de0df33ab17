// crates/gliderproc-core/src/error.rs

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),

    #[error("column length mismatch for {column}: expected {expected}, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("field {0} is not present in the time series")]
    MissingField(String),

    #[error("raw record columns must share one length: {column} has {found}, expected {expected}")]
    RaggedMatrix {
        column: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
