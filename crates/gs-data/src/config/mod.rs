//! Configuration module

pub mod null_handling;
pub mod splines_config;

pub use null_handling::*;
pub use splines_config::*;
