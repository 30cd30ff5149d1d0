//! Locating coordinate and index blocks in scene text.
//!
//! This is the first of two stages: it only finds block bodies. Number
//! parsing happens afterwards in [`super::tokens`].

const COORDINATE_KEYWORD: &str = "Coordinate";
const POINT_FIELD: &str = "point";
const COORD_INDEX_KEYWORD: &str = "coordIndex";

/// Raw block bodies found in a scene, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneBlocks<'a> {
    /// Bodies of `Coordinate { point [ ... ] }` constructs
    pub coordinates: Vec<&'a str>,
    /// Bodies of `coordIndex [ ... ]` constructs
    pub indices: Vec<&'a str>,
}

impl SceneBlocks<'_> {
    /// Both kinds of block are required to produce any faces
    pub fn has_geometry(&self) -> bool {
        !self.coordinates.is_empty() && !self.indices.is_empty()
    }
}

/// Collect every coordinate and index block body in `text`.
///
/// A body runs from just after the opening `[` to the first following `]`.
/// Keywords must start at an identifier boundary, so `TextureCoordinate`
/// is not taken for `Coordinate`.
pub fn find_blocks(text: &str) -> SceneBlocks<'_> {
    SceneBlocks {
        coordinates: collect_bodies(text, COORDINATE_KEYWORD, |rest| {
            let rest = rest.trim_start().strip_prefix('{')?;
            let rest = rest.trim_start().strip_prefix(POINT_FIELD)?;
            rest.trim_start().strip_prefix('[')
        }),
        indices: collect_bodies(text, COORD_INDEX_KEYWORD, |rest| {
            rest.trim_start().strip_prefix('[')
        }),
    }
}

/// Scan `text` for `keyword`, let `open` consume everything up to and
/// including the opening bracket, then cut the body at the next `]`.
fn collect_bodies<'a, F>(text: &'a str, keyword: &str, open: F) -> Vec<&'a str>
where
    F: Fn(&'a str) -> Option<&'a str>,
{
    let mut bodies = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(keyword) {
        let start = cursor + found;
        let after_keyword = start + keyword.len();

        if !at_identifier_boundary(text, start) {
            cursor = after_keyword;
            continue;
        }

        let Some(body_start) = open(&text[after_keyword..]) else {
            cursor = after_keyword;
            continue;
        };
        let Some(body_len) = body_start.find(']') else {
            // Unterminated block: nothing later can close either
            break;
        };

        bodies.push(&body_start[..body_len]);
        let body_offset = text.len() - body_start.len();
        cursor = body_offset + body_len + 1;
    }

    bodies
}

fn at_identifier_boundary(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
}
