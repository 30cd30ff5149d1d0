//! Face assembly and fan triangulation for one index block.

use smallvec::SmallVec;
use wrlglb_core::Triangle;

/// Index value that closes a face
pub const FACE_SENTINEL: i64 = -1;

/// Counters describing what an index block contributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceStats {
    /// Faces closed with three or more members
    pub faces: usize,
    /// Faces closed with fewer than three members
    pub short_faces: usize,
    /// Triangles dropped for a negative or unaddressable corner
    pub invalid_triangles: usize,
    /// True if indices were left open at the end of the block
    pub open_face_discarded: bool,
}

/// Fan triangles of a face around its first vertex:
/// `(f[0], f[k], f[k+1])` for `k` in `1..=n-2`.
pub fn fan_triangulate<T: Copy>(face: &[T]) -> impl Iterator<Item = [T; 3]> + '_ {
    let count = face.len().saturating_sub(2);
    (1..=count).map(move |k| [face[0], face[k], face[k + 1]])
}

/// Accumulates indices into faces and emits offset triangles.
///
/// `vertex_offset` is the number of vertices contributed by every earlier
/// coordinate block; it turns block-local indices into mesh-global ones.
#[derive(Debug)]
pub struct FaceAssembler {
    vertex_offset: usize,
    current: SmallVec<[i64; 8]>,
    triangles: Vec<Triangle>,
    stats: FaceStats,
}

impl FaceAssembler {
    pub fn new(vertex_offset: usize) -> Self {
        Self {
            vertex_offset,
            current: SmallVec::new(),
            triangles: Vec::new(),
            stats: FaceStats::default(),
        }
    }

    /// Feed one index; the sentinel closes the current face
    pub fn push(&mut self, index: i64) {
        if index == FACE_SENTINEL {
            self.close_face();
        } else {
            self.current.push(index);
        }
    }

    fn close_face(&mut self) {
        if self.current.len() >= 3 {
            self.stats.faces += 1;
            let offset = self.vertex_offset as i64;
            for [a, b, c] in fan_triangulate(self.current.as_slice()) {
                match (global_index(a, offset), global_index(b, offset), global_index(c, offset)) {
                    (Some(a), Some(b), Some(c)) => self.triangles.push([a, b, c]),
                    _ => self.stats.invalid_triangles += 1,
                }
            }
        } else if !self.current.is_empty() {
            self.stats.short_faces += 1;
        }
        self.current.clear();
    }

    /// Finish the block. Indices without a closing sentinel are dropped.
    pub fn finish(mut self) -> (Vec<Triangle>, FaceStats) {
        if !self.current.is_empty() {
            self.stats.open_face_discarded = true;
            self.current.clear();
        }
        (self.triangles, self.stats)
    }
}

/// Block-local index to mesh-global index. Negative local indices other
/// than the sentinel never address a vertex.
fn global_index(local: i64, offset: i64) -> Option<u32> {
    if local < 0 {
        return None;
    }
    local.checked_add(offset).and_then(|global| u32::try_from(global).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(indices: &[i64], offset: usize) -> (Vec<Triangle>, FaceStats) {
        let mut assembler = FaceAssembler::new(offset);
        for &idx in indices {
            assembler.push(idx);
        }
        assembler.finish()
    }

    #[test]
    fn test_quad_fan() {
        let (triangles, stats) = assemble(&[0, 1, 2, 3, -1], 0);
        assert_eq!(triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(stats.faces, 1);
    }

    #[test]
    fn test_pentagon_fan_order() {
        let (triangles, _) = assemble(&[4, 3, 2, 1, 0, -1], 0);
        assert_eq!(triangles, vec![[4, 3, 2], [4, 2, 1], [4, 1, 0]]);
    }

    #[test]
    fn test_offset_applied() {
        let (triangles, _) = assemble(&[0, 1, 2, -1], 4);
        assert_eq!(triangles, vec![[4, 5, 6]]);
    }

    #[test]
    fn test_short_faces_discarded() {
        let (triangles, stats) = assemble(&[0, 1, -1, 2, -1, -1, 0, 1, 2, -1], 0);
        assert_eq!(triangles, vec![[0, 1, 2]]);
        assert_eq!(stats.short_faces, 2);
    }

    #[test]
    fn test_open_face_at_end_discarded() {
        let (triangles, stats) = assemble(&[0, 1, 2, -1, 3, 4, 5], 0);
        assert_eq!(triangles, vec![[0, 1, 2]]);
        assert!(stats.open_face_discarded);
    }

    #[test]
    fn test_negative_corner_drops_only_its_triangles() {
        // fan of [0, 1, -5, 3]: (0,1,-5) and (0,-5,3) are both invalid
        let (triangles, stats) = assemble(&[0, 1, -5, 3, -1, 0, 1, 2, -1], 10);
        assert_eq!(triangles, vec![[10, 11, 12]]);
        assert_eq!(stats.invalid_triangles, 2);
    }

    #[test]
    fn test_fan_triangulate_degenerate_inputs() {
        assert_eq!(fan_triangulate::<u32>(&[]).count(), 0);
        assert_eq!(fan_triangulate(&[1u32, 2]).count(), 0);
        assert_eq!(fan_triangulate(&[1u32, 2, 3]).collect::<Vec<_>>(), vec![[1, 2, 3]]);
    }
}
