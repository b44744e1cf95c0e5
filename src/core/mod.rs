//! Core domain model
//!
//! Defines the data structures a run is made of: the pipeline definition,
//! the run context with its reference resolver, the manifest, and the
//! engine's error taxonomy.

pub mod context;
pub mod definition;
pub mod error;
pub mod manifest;

pub use context::*;
pub use definition::*;
pub use error::*;
pub use manifest::*;
