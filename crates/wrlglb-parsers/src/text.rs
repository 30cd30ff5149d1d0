//! Character decoding for scene files.
//!
//! Scene files exported from the legacy catalogue are mostly UTF-8, but
//! older ones carry Central European code pages in names and comments.
//! The geometry tokens are plain ASCII, so any single-byte fallback
//! yields the same coordinates.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1250, WINDOWS_1252};

/// Single-byte encodings tried, in order, when the input is not UTF-8
const FALLBACK_ENCODINGS: [&Encoding; 2] = [WINDOWS_1250, WINDOWS_1252];

/// Decoded scene text and the encoding it was read with
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Decode raw bytes into text.
///
/// A byte-order mark wins; otherwise UTF-8 is tried first and the
/// single-byte code pages after it. Never fails: the last resort is lossy
/// UTF-8.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return finish(text.into_owned(), encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return finish(text.to_owned(), UTF_8);
    }

    for encoding in FALLBACK_ENCODINGS {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if !had_errors {
            return finish(text.into_owned(), encoding);
        }
    }

    finish(String::from_utf8_lossy(bytes).into_owned(), UTF_8)
}

fn finish(text: String, encoding: &'static Encoding) -> DecodedText {
    tracing::debug!(encoding = encoding.name(), chars = text.len(), "Decoded scene text");
    DecodedText { text, encoding }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_utf8() {
        let decoded = decode_text("#VRML V2.0 utf8\npoint [ 0 0 0 ]".as_bytes());
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.starts_with("#VRML"));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"coordIndex [ 0 1 2 -1 ]");
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.starts_with("coordIndex"));
    }

    #[test]
    fn test_cp1250_fallback() {
        // "skříň" in windows-1250: s k 0xF8 0xED 0xF2
        let bytes = b"# skr\xF8\xED\xF2\npoint [ 1 2 3 ]";
        let decoded = decode_text(bytes);
        assert_eq!(decoded.encoding, WINDOWS_1250);
        assert!(decoded.text.contains("skříň"));
        assert!(decoded.text.contains("point [ 1 2 3 ]"));
    }
}
