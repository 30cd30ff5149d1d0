//! GLB (binary glTF) container framing
//!
//! ```text
//! offset  field
//! 0       magic "glTF"          u32 LE
//! 4       version 2             u32 LE
//! 8       total length          u32 LE
//! 12      JSON chunk length     u32 LE (padded)
//! 16      JSON chunk type       "JSON"
//! 20      JSON bytes            space padded
//! ...     BIN chunk length      u32 LE (padded)
//! ...     BIN chunk type        "BIN\0"
//! ...     BIN bytes             zero padded
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::gltf::{GltfExportError, GltfResult};

pub const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A; // "JSON"
pub const CHUNK_TYPE_BIN: u32 = 0x004E_4942; // "BIN\0"

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

fn padding_for(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Total container size for the given unpadded payload sizes
pub fn container_length(json_len: usize, bin_len: usize) -> usize {
    HEADER_LEN
        + CHUNK_HEADER_LEN
        + json_len
        + padding_for(json_len)
        + CHUNK_HEADER_LEN
        + bin_len
        + padding_for(bin_len)
}

/// Serialize `document` compactly and frame it with `buffer` as a GLB.
pub fn encode_glb<T: Serialize>(document: &T, buffer: &[u8]) -> GltfResult<Vec<u8>> {
    let json = serde_json::to_vec(document)?;
    let total_len = container_length(json.len(), buffer.len());
    let total_u32 = u32::try_from(total_len).map_err(|_| {
        GltfExportError::InvalidContainer(format!("container of {total_len} bytes exceeds 4 GiB"))
    })?;

    let mut out = Vec::with_capacity(total_len);
    write_container(&mut out, total_u32, &json, buffer)?;
    debug_assert_eq!(out.len(), total_len);
    Ok(out)
}

fn write_container<W: Write>(out: &mut W, total_len: u32, json: &[u8], bin: &[u8]) -> std::io::Result<()> {
    // GLB header
    out.write_u32::<LittleEndian>(GLB_MAGIC)?;
    out.write_u32::<LittleEndian>(GLB_VERSION)?;
    out.write_u32::<LittleEndian>(total_len)?;

    write_chunk(out, CHUNK_TYPE_JSON, json, b' ')?;
    write_chunk(out, CHUNK_TYPE_BIN, bin, 0x00)?;
    Ok(())
}

fn write_chunk<W: Write>(out: &mut W, chunk_type: u32, data: &[u8], pad_byte: u8) -> std::io::Result<()> {
    let padding = padding_for(data.len());
    out.write_u32::<LittleEndian>((data.len() + padding) as u32)?;
    out.write_u32::<LittleEndian>(chunk_type)?;
    out.write_all(data)?;
    for _ in 0..padding {
        out.write_u8(pad_byte)?;
    }
    Ok(())
}

/// Framing of a GLB container, for inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlbInfo {
    pub version: u32,
    pub total_length: u32,
    pub json_chunk_length: u32,
    pub bin_chunk_length: Option<u32>,
    /// JSON chunk content with trailing padding removed
    pub json: String,
}

/// Read back the header and chunk framing of a GLB container.
///
/// Only checks what this crate writes: magic, version, declared lengths
/// and the chunk order JSON then BIN.
pub fn read_glb_info(bytes: &[u8]) -> GltfResult<GlbInfo> {
    let invalid = |msg: &str| GltfExportError::InvalidContainer(msg.to_string());
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.read_u32::<LittleEndian>().map_err(|_| invalid("truncated header"))?;
    if magic != GLB_MAGIC {
        return Err(invalid("bad magic"));
    }
    let version = cursor.read_u32::<LittleEndian>().map_err(|_| invalid("truncated header"))?;
    let total_length = cursor.read_u32::<LittleEndian>().map_err(|_| invalid("truncated header"))?;
    if total_length as usize != bytes.len() {
        return Err(GltfExportError::InvalidContainer(format!(
            "declared length {} but container has {} bytes",
            total_length,
            bytes.len()
        )));
    }

    let (json_chunk_length, json_bytes) = read_chunk(&mut cursor, CHUNK_TYPE_JSON)?;
    let json = String::from_utf8(json_bytes)
        .map_err(|_| invalid("JSON chunk is not UTF-8"))?
        .trim_end_matches(' ')
        .to_string();

    let bin_chunk_length = if (cursor.position() as usize) < bytes.len() {
        Some(read_chunk(&mut cursor, CHUNK_TYPE_BIN)?.0)
    } else {
        None
    };

    Ok(GlbInfo {
        version,
        total_length,
        json_chunk_length,
        bin_chunk_length,
        json,
    })
}

fn read_chunk(cursor: &mut Cursor<&[u8]>, expected_type: u32) -> GltfResult<(u32, Vec<u8>)> {
    let invalid = |msg: String| GltfExportError::InvalidContainer(msg);

    let length = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| invalid("truncated chunk header".into()))?;
    let chunk_type = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| invalid("truncated chunk header".into()))?;
    if chunk_type != expected_type {
        return Err(invalid(format!("expected chunk type 0x{expected_type:08X}, found 0x{chunk_type:08X}")));
    }
    if length % 4 != 0 {
        return Err(invalid(format!("chunk length {length} is not 4-byte aligned")));
    }

    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    if u64::from(length) > remaining {
        return Err(invalid(format!("chunk declares {length} bytes but only {remaining} remain")));
    }

    let mut data = vec![0u8; length as usize];
    cursor
        .read_exact(&mut data)
        .map_err(|_| invalid(format!("chunk declares {length} bytes past end of container")))?;
    Ok((length, data))
}
