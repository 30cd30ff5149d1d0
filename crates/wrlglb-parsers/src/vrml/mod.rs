// wrlglb-parsers/src/vrml/mod.rs
//! VRML (Virtual Reality Modeling Language) geometry parser
//!
//! Only indexed face sets are read: vertex positions from
//! `Coordinate { point [...] }` and faces from `coordIndex [...]`.
//! Everything else in the scene graph is ignored.
//!
//! # Scene Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Shape { geometry IndexedFaceSet {                          │
//! │    coord Coordinate { point [ x y z, x y z, ... ] }  ← blk 0│
//! │    coordIndex [ i j k l -1, i j k -1, ... ]          ← blk 0│
//! │  } }                                                        │
//! │  Shape { ... Coordinate ... coordIndex ... }         ← blk 1│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Index block *n* pairs with coordinate block *n*. Indices are local to
//! their block and are shifted by the vertex count of all earlier blocks.

mod blocks;
mod faces;
mod tokens;

pub use blocks::{find_blocks, SceneBlocks};
pub use faces::{fan_triangulate, FaceAssembler, FaceStats, FACE_SENTINEL};
pub use tokens::{parse_float, parse_index, strip_comments, tokens};

use tracing::{debug, trace};
use wrlglb_core::{Geometry, Triangle, Vec3};

use crate::logging::timed_extract;
use crate::traits::{ParseError, ParseOptions, ParseResult, Parser};

/// Header that starts every VRML 2.0 file
const VRML_MAGIC: &[u8] = b"#VRML";

/// VRML indexed-face-set parser
#[derive(Debug, Clone, Default)]
pub struct VrmlParser;

impl VrmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for VrmlParser {
    type Output = Geometry;

    fn extensions(&self) -> &[&str] {
        &["wrl", "vrml"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(VRML_MAGIC)
    }

    fn name(&self) -> &str {
        "VRML Geometry Parser"
    }

    fn parse_str_with_options(&self, text: &str, options: &ParseOptions) -> ParseResult<Geometry> {
        timed_extract(self.name(), || extract_geometry(text, options))
    }
}

/// Extract triangulated geometry from scene text.
///
/// Returns [`ParseError::NoGeometry`] when there is no coordinate block,
/// no index block, or nothing renderable left after filtering.
pub fn extract_geometry(text: &str, options: &ParseOptions) -> ParseResult<Geometry> {
    let blocks = find_blocks(text);
    debug!(
        coordinate_blocks = blocks.coordinates.len(),
        index_blocks = blocks.indices.len(),
        "Located scene blocks"
    );

    if !blocks.has_geometry() {
        return Err(ParseError::NoGeometry);
    }
    if blocks.indices.len() > blocks.coordinates.len() {
        debug!(
            ignored = blocks.indices.len() - blocks.coordinates.len(),
            "Index blocks without a coordinate block"
        );
    }

    let mut vertices: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut vertex_offset = 0usize;

    for (block, coordinates) in blocks.coordinates.iter().enumerate() {
        let points = parse_points(block, coordinates, options)?;

        if let Some(indices) = blocks.indices.get(block) {
            let (block_triangles, stats) = parse_faces(block, indices, vertex_offset, options)?;
            trace!(block, ?stats, triangles = block_triangles.len(), "Assembled faces");
            triangles.extend(block_triangles);
        }

        vertex_offset += points.len();
        vertices.extend(points);
    }

    let mut geometry = Geometry::new(vertices, triangles);
    let dropped = geometry.retain_valid_triangles();
    if dropped > 0 {
        debug!(dropped, vertex_count = geometry.vertex_count(), "Dropped out-of-range triangles");
    }

    if geometry.is_empty() {
        return Err(ParseError::NoGeometry);
    }

    debug!(
        vertices = geometry.vertex_count(),
        triangles = geometry.triangle_count(),
        "Extracted geometry"
    );
    Ok(geometry)
}

/// Parse one coordinate block body into points. A trailing incomplete
/// triple is discarded.
fn parse_points(block: usize, body: &str, options: &ParseOptions) -> ParseResult<Vec<Vec3>> {
    let body = strip_comments(body);
    let mut values = Vec::new();

    for token in tokens(&body) {
        match parse_float(token) {
            Some(value) => values.push(value),
            None => reject_or_skip(block, token, options)?,
        }
    }

    if values.len() % 3 != 0 {
        trace!(block, leftover = values.len() % 3, "Discarding incomplete coordinate triple");
    }

    Ok(values
        .chunks_exact(3)
        .map(|xyz| Vec3::new(xyz[0], xyz[1], xyz[2]))
        .collect())
}

/// Parse one index block body into offset triangles.
fn parse_faces(
    block: usize,
    body: &str,
    vertex_offset: usize,
    options: &ParseOptions,
) -> ParseResult<(Vec<Triangle>, FaceStats)> {
    let body = strip_comments(body);
    let mut assembler = FaceAssembler::new(vertex_offset);

    for token in tokens(&body) {
        match parse_index(token) {
            Some(index) => assembler.push(index),
            None => reject_or_skip(block, token, options)?,
        }
    }

    Ok(assembler.finish())
}

fn reject_or_skip(block: usize, token: &str, options: &ParseOptions) -> ParseResult<()> {
    if options.strict_validation {
        return Err(ParseError::MalformedToken {
            block,
            token: token.to_string(),
        });
    }
    trace!(block, token, "Skipping malformed token");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_SQUARE: &str = r#"#VRML V2.0 utf8
Shape {
  geometry IndexedFaceSet {
    coord Coordinate {
      point [
        0 0 0,   # origin
        1 0 0,
        1 1 0,
        0 1 0
      ]
    }
    coordIndex [ 0, 1, 2, 3, -1 ]
  }
}
"#;

    #[test]
    fn test_unit_square() {
        let geometry = VrmlParser::new().parse_str(UNIT_SQUARE).unwrap();

        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.triangles, vec![[0, 1, 2], [0, 2, 3]]);

        let bbox = geometry.bounding_box().unwrap();
        assert_eq!(bbox.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_second_block_is_offset() {
        let text = "Coordinate { point [ 0 0 0, 1 0 0, 1 1 0, 0 1 0 ] }\n\
                    coordIndex [ 0 1 2 -1 ]\n\
                    Coordinate { point [ 5 0 0, 6 0 0, 6 1 0 ] }\n\
                    coordIndex [ 0 1 2 -1 ]";
        let geometry = extract_geometry(text, &ParseOptions::default()).unwrap();

        assert_eq!(geometry.vertex_count(), 7);
        assert_eq!(geometry.triangles, vec![[0, 1, 2], [4, 5, 6]]);
    }

    #[test]
    fn test_unmatched_coordinate_block_adds_vertices_only() {
        let text = "Coordinate { point [ 0 0 0, 1 0 0, 0 1 0 ] } coordIndex [ 0 1 2 -1 ]\n\
                    Coordinate { point [ 9 9 9 ] }";
        let geometry = extract_geometry(text, &ParseOptions::default()).unwrap();

        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.triangle_count(), 1);
    }

    #[test]
    fn test_no_blocks_is_no_geometry() {
        let err = extract_geometry("#VRML V2.0 utf8\nShape { }", &ParseOptions::default()).unwrap_err();
        assert!(err.is_no_geometry());

        let only_points = "Coordinate { point [ 0 0 0 1 1 1 2 2 2 ] }";
        assert!(extract_geometry(only_points, &ParseOptions::default())
            .unwrap_err()
            .is_no_geometry());
    }

    #[test]
    fn test_out_of_range_triangles_filtered() {
        let text = "Coordinate { point [ 0 0 0, 1 0 0, 0 1 0 ] }\n\
                    coordIndex [ 0 1 2 -1, 0 1 7 -1 ]";
        let geometry = extract_geometry(text, &ParseOptions::default()).unwrap();
        assert_eq!(geometry.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_plus_signed_indices() {
        let text = "Coordinate { point [ 0 0 0, 1 0 0, 0 1 0 ] } coordIndex [ +0 +1 +2 -1 ]";
        for options in [ParseOptions::default(), ParseOptions { strict_validation: true }] {
            let geometry = extract_geometry(text, &options).unwrap();
            assert_eq!(geometry.triangles, vec![[0, 1, 2]]);
        }
    }

    #[test]
    fn test_all_triangles_filtered_is_no_geometry() {
        let text = "Coordinate { point [ 0 0 0, 1 0 0, 0 1 0 ] } coordIndex [ 3 4 5 -1 ]";
        assert!(extract_geometry(text, &ParseOptions::default())
            .unwrap_err()
            .is_no_geometry());
    }

    #[test]
    fn test_malformed_tokens_lenient_and_strict() {
        let text = "Coordinate { point [ 0 0 0, 1 oops 0 0, 0 1 0 ] } coordIndex [ 0 1 x 2 -1 ]";

        let geometry = extract_geometry(text, &ParseOptions::default()).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.triangles, vec![[0, 1, 2]]);

        let strict = ParseOptions { strict_validation: true };
        match extract_geometry(text, &strict) {
            Err(ParseError::MalformedToken { block, token }) => {
                assert_eq!(block, 0);
                assert_eq!(token, "oops");
            }
            other => panic!("expected MalformedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_commented_numbers_ignored() {
        let text = "Coordinate { point [\n 0 0 0 # 7 7 7\n 1 0 0\n 0 1 0 ] }\n\
                    coordIndex [ 0 1 2 -1 # 0 0 0 -1\n ]";
        let geometry = extract_geometry(text, &ParseOptions::default()).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.triangle_count(), 1);
    }

    #[test]
    fn test_can_parse_by_extension() {
        let parser = VrmlParser::new();
        assert!(parser.can_parse(std::path::Path::new("cabinet_main.WRL")));
        assert!(!parser.can_parse(std::path::Path::new("does/not/exist.obj")));
    }
}
