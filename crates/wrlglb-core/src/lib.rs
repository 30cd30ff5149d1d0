//! wrlglb Core Library
//!
//! This crate provides the geometry types, conversion outcomes and error
//! handling shared across all wrlglb components.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
