//! wrlglb-parsers
//!
//! Parsers that turn legacy scene descriptions into triangulated geometry.
//!
//! # Supported Formats
//!
//! | Format | Extension        | Description |
//! |--------|------------------|-------------|
//! | VRML   | `.wrl`, `.vrml`  | VRML 2.0 indexed face sets (`Coordinate`/`coordIndex`) |
//!
//! # Example
//!
//! ```rust,ignore
//! use wrlglb_parsers::{Parser, VrmlParser};
//!
//! let parser = VrmlParser::new();
//! let geometry = parser.parse_file("cabinet_main.wrl".as_ref())?;
//!
//! println!("Found {} triangles", geometry.triangle_count());
//! ```

pub mod traits;
pub mod logging;
pub mod text;
pub mod vrml;

// Re-export main types
pub use traits::{Parser, ParseError, ParseResult, ParseOptions};
pub use text::{decode_text, DecodedText};
pub use vrml::{VrmlParser, extract_geometry, find_blocks, SceneBlocks};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
