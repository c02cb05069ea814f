//! # Muletrace Core
//!
//! Core abstractions for the muletrace money-muling detection engine.
//!
//! This crate provides:
//! - Domain definitions for kernel categorization
//! - Kernel metadata and execution traits
//! - Error types shared across the pipeline
//! - Engine configuration (detector thresholds, windows, caps)
//! - Logging configuration and initialization

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod traits;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{CycleConfig, EngineConfig, ShellConfig, SmurfingConfig};
    pub use crate::domain::Domain;
    pub use crate::error::{EngineError, Result};
    pub use crate::kernel::KernelMetadata;
    pub use crate::logging::{LogConfig, LogLevel};
    pub use crate::traits::{AnalyticKernel, BatchKernel};
}
