//! Core functionality for grid-aligned time-series resampling
//! 
//! This crate provides the fundamental abstractions shared by every stage of
//! the resampling pipeline: samples, rows, the pull protocol and the aligned
//! output clock.

pub mod clock;
pub mod pull;
pub mod row;
pub mod sample;

use thiserror::Error;

// Re-export commonly used types
pub use clock::{align_start, default_epoch_offset, AlignedClock};
pub use pull::{PullProcessor, ReadResult};
pub use row::Row;
pub use sample::Sample;

/// Error raised while resolving or validating configuration.
///
/// Covers bad intervals, out-of-range buffer sizes, unknown spline types and
/// missing bounds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    /// Create a new configuration error with a descriptive message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
    
    /// The message describing what was wrong
    pub fn message(&self) -> &str {
        &self.0
    }
}
