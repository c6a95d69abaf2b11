//! Core types and traits for the retrocam filter engine.
//!
//! This module contains the foundational types that make up the filter
//! pipeline including:
//! - The immutable [`Image`] value type
//! - The [`Operator`] trait and its metadata
//! - Error types

pub mod types;
pub mod error;
pub mod operator;

// Re-export commonly used types
pub use types::{Color, Extent, Image, Pixel};
pub use error::{BatchError, ConfigError, OperatorError, RetroError};
pub use operator::{Category, Operator, OperatorMetadata};
