// wrlglb-parsers/src/traits.rs
//! Core traits defining the parser interface for scene formats.
//!
//! This module establishes a unified parsing interface that enables:
//! - Consistent error handling across all formats
//! - Parsing from strings, readers and files with the same options
//! - Extension and header based format detection

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::text::decode_text;

/// Errors that can occur during parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No usable geometry found")]
    NoGeometry,

    #[error("Malformed token {token:?} in block {block}")]
    MalformedToken { block: usize, token: String },

    #[error("Nested error in {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this is the expected "nothing to convert" outcome
    pub fn is_no_geometry(&self) -> bool {
        match self {
            ParseError::NoGeometry => true,
            ParseError::Nested { source, .. } => source.is_no_geometry(),
            _ => false,
        }
    }
}

impl From<ParseError> for wrlglb_core::Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Io(e) => wrlglb_core::Error::Io(e),
            ParseError::NoGeometry => wrlglb_core::Error::NoGeometry,
            ParseError::MalformedToken { block, token } => wrlglb_core::Error::MalformedInput {
                message: format!("token {token:?} in block {block}"),
            },
            ParseError::Nested { context, source } => {
                wrlglb_core::Error::from(*source).with_context(context)
            }
        }
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Configuration options for parsing
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Reject unparsable numeric tokens instead of skipping them
    pub strict_validation: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_validation: false,
        }
    }
}

/// Core trait for all scene format parsers
///
/// Implementors work on decoded text; byte sources are decoded with
/// [`decode_text`] before reaching [`Parser::parse_str_with_options`].
pub trait Parser: Send + Sync {
    /// The parsed output type
    type Output: Send + Sync;

    /// Returns the file extensions this parser handles (e.g., ["wrl"])
    fn extensions(&self) -> &[&str];

    /// Returns the header bytes that identify this file type (if applicable)
    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Parse already-decoded text with custom options
    fn parse_str_with_options(&self, text: &str, options: &ParseOptions) -> ParseResult<Self::Output>;

    /// Parse already-decoded text with default options
    fn parse_str(&self, text: &str) -> ParseResult<Self::Output> {
        self.parse_str_with_options(text, &ParseOptions::default())
    }

    /// Parse from a reader with default options
    fn parse<R: Read>(&self, reader: R) -> ParseResult<Self::Output> {
        self.parse_with_options(reader, &ParseOptions::default())
    }

    /// Parse from a reader with custom options
    fn parse_with_options<R: Read>(&self, mut reader: R, options: &ParseOptions) -> ParseResult<Self::Output> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let decoded = decode_text(&bytes);
        self.parse_str_with_options(&decoded.text, options)
    }

    /// Parse from a file path
    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::default())
    }

    /// Parse from a file path with options
    fn parse_file_with_options(&self, path: &Path, options: &ParseOptions) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        self.parse_with_options(reader, options)
            .map_err(|e| e.with_context(path.display().to_string()))
    }

    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool {
        // Check extension
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if self.extensions().iter().any(|e| e.to_lowercase() == ext_str) {
                return true;
            }
        }

        // Try to check magic bytes if available
        if let Some(magic) = self.magic_bytes() {
            if let Ok(file) = std::fs::File::open(path) {
                let mut reader = std::io::BufReader::new(file);
                let mut buffer = vec![0u8; magic.len()];
                if reader.read_exact(&mut buffer).is_ok() {
                    return buffer == magic;
                }
            }
        }

        false
    }
}
