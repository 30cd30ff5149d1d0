//! Binary buffer packing

use wrlglb_core::Vec3;

/// A byte range inside the packed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub length: usize,
}

/// Positions, normals and indices packed back to back
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBuffer {
    pub bytes: Vec<u8>,
    pub positions: Region,
    pub normals: Region,
    pub indices: Region,
}

impl PackedBuffer {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Append zero bytes until `data.len()` is a multiple of 4
pub fn pad_to_4(data: &mut Vec<u8>) {
    let padding = (4 - data.len() % 4) % 4;
    data.resize(data.len() + padding, 0);
}

/// Pack little-endian f32 positions, f32 normals and u16 indices, in that
/// order, each region zero-padded to a 4-byte boundary.
pub fn pack_buffer(positions: &[Vec3], normals: &[Vec3], indices: &[u16]) -> PackedBuffer {
    let mut bytes = Vec::with_capacity((positions.len() + normals.len()) * 12 + indices.len() * 2 + 4);

    let positions_region = append_region(&mut bytes, |out| {
        for p in positions {
            for component in p.to_array() {
                out.extend_from_slice(&component.to_le_bytes());
            }
        }
    });

    let normals_region = append_region(&mut bytes, |out| {
        for n in normals {
            for component in n.to_array() {
                out.extend_from_slice(&component.to_le_bytes());
            }
        }
    });

    let indices_region = append_region(&mut bytes, |out| {
        for index in indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
    });

    PackedBuffer {
        bytes,
        positions: positions_region,
        normals: normals_region,
        indices: indices_region,
    }
}

fn append_region<F>(bytes: &mut Vec<u8>, write: F) -> Region
where
    F: FnOnce(&mut Vec<u8>),
{
    let offset = bytes.len();
    write(bytes);
    pad_to_4(bytes);
    Region {
        offset,
        length: bytes.len() - offset,
    }
}
