//! Unified error handling for wrlglb
//!
//! This module provides the error type returned by the end-to-end
//! conversion pipeline. The parser and exporter crates keep their own
//! error enums and convert into this one.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all wrlglb operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error, including failures of the output sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    // ==================== Geometry Errors ====================

    /// No coordinate/index blocks, or nothing left after filtering
    #[error("No usable geometry found")]
    NoGeometry,

    /// Numeric content that could not be parsed (strict mode only)
    #[error("Malformed input: {message}")]
    MalformedInput {
        message: String,
    },

    /// Vertex count exceeds what 16-bit indices can address
    #[error("Mesh has {vertex_count} vertices, 16-bit indices address at most {max}")]
    IndexOverflow {
        vertex_count: usize,
        max: usize,
    },

    // ==================== Export Errors ====================

    /// Export failed
    #[error("Export failed: {message}")]
    ExportFailed {
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an export failure
    pub fn export_failed(message: impl Into<String>) -> Self {
        Error::ExportFailed {
            message: message.into(),
        }
    }

    /// Check if this is the expected "nothing to convert" outcome,
    /// looking through any added context
    pub fn is_no_geometry(&self) -> bool {
        match self {
            Error::NoGeometry => true,
            Error::WithContext { source, .. } => source.is_no_geometry(),
            _ => false,
        }
    }

    /// Check if this is an index capacity error
    pub fn is_index_overflow(&self) -> bool {
        match self {
            Error::IndexOverflow { .. } => true,
            Error::WithContext { source, .. } => source.is_index_overflow(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
