//! Error types for retrocam.
//!
//! Uses thiserror for structured errors with context. The public filter
//! entry points never surface these to the caller (a failing stage is
//! skipped, see [`crate::execution::chain`]); they exist so that stages,
//! configuration and batch jobs can report *what* went wrong to logs, the
//! CLI and [`crate::execution::engine::RenderStatus`].

use crate::core::types::Extent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for retrocam.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum RetroError {
    /// A stage or the frame compositor rejected its parameters.
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// No built-in or registered style has this id.
    #[error("Unknown filter style '{0}'")]
    UnknownStyle(String),

    /// No frame has this id.
    #[error("Unknown frame '{0}'")]
    UnknownFrame(String),

    /// No watermark has this id.
    #[error("Unknown watermark '{0}'")]
    UnknownWatermark(String),
}

/// Errors raised by a single operator stage.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperatorError {
    #[error("Invalid parameter '{parameter}' for operator '{operator}': {reason}")]
    InvalidParameter {
        operator: String,
        parameter: String,
        reason: String,
    },

    #[error("Operator '{operator}' received an empty image")]
    EmptyImage { operator: String },

    #[error("Extent mismatch: expected {expected}, got {got}")]
    ExtentMismatch { expected: Extent, got: Extent },
}

impl OperatorError {
    /// Shorthand for [`OperatorError::InvalidParameter`].
    pub fn invalid(operator: &str, parameter: &str, reason: impl Into<String>) -> Self {
        OperatorError::InvalidParameter {
            operator: operator.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the operator that produced this error, if known.
    pub fn operator(&self) -> Option<&str> {
        match self {
            OperatorError::InvalidParameter { operator, .. }
            | OperatorError::EmptyImage { operator } => Some(operator),
            OperatorError::ExtentMismatch { .. } => None,
        }
    }
}

/// Errors during batch processing.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No input files found matching pattern: {pattern}")]
    NoInputsFound { pattern: String },

    #[error("Invalid input pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    #[error("Output directory does not exist: {}", .path.display())]
    OutputDirectoryMissing { path: PathBuf },

    #[error("Failed to read {}: {}", .path.display(), .error)]
    Decode { path: PathBuf, error: image::ImageError },

    #[error("Failed to render {}: {}", .path.display(), .error)]
    Render { path: PathBuf, error: String },

    #[error("Failed to write {}: {}", .path.display(), .error)]
    Encode { path: PathBuf, error: image::ImageError },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Errors while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {}", .path.display(), .error)]
    Read { path: PathBuf, error: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Result type alias for retrocam operations.
pub type RetroResult<T> = Result<T, RetroError>;

/// Result type alias for operator stages.
pub type OperatorResult<T> = Result<T, OperatorError>;
