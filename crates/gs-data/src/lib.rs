//! Buffering, curve fitting and synchronization of time-series columns

pub mod buffer;
pub mod column;
pub mod config;
pub mod export;
pub mod sources;
pub mod spline;
pub mod sync;

use arrow::error::ArrowError;
use gs_core::ConfigError;
use thiserror::Error;

// Re-exports
pub use buffer::ColumnBuffer;
pub use column::ColumnState;
pub use config::{NullConfig, SplinesConfig, UninterpolatedValueMethod};
pub use export::rows_to_record_batch;
pub use sources::{CsvSource, VecSource};
pub use spline::{FittedCurve, SplineError, SplineStrategy, SplineType};
pub use sync::{DrainOutcome, GatherDecision, SyncState, SyncStats, Synchronizer};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Arrow error: {0}")]
    Arrow(ArrowError),
    
    #[error("CSV parsing error: {0}")]
    Csv(String),
    
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    
    #[error("Export error: {0}")]
    Export(String),
    
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
