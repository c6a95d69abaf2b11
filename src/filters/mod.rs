//! Filter module.
//!
//! Contains the style registry, the built-in style recipes and the operator
//! implementations they are made of.

pub mod builtin;
pub mod registry;
pub mod styles;

pub use registry::{RegistryEntry, StyleMetadata, StyleRegistry};
pub use styles::{builtin_stages, FilterStyle, StyleCategory};
