//! # inkpad-core
//!
//! Core types, traits, and abstractions for the inkpad note store.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the storage layer (`inkpad-store`) depends on: the error taxonomy,
//! note/notebook/tombstone models, and the seams for the external registry
//! collaborators.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
