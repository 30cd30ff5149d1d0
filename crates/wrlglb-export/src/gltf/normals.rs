//! Per-vertex normals from triangle geometry

use wrlglb_core::{Triangle, Vec3};

/// Area-weighted vertex normals.
///
/// Every triangle adds its raw cross product `(b - a) x (c - a)` to each of
/// its corners; the sums are normalized at the end. A vertex with a zero
/// sum (unused, or with cancelling faces) keeps a zero normal so the output
/// stays index-aligned with `vertices`. Triangles with a corner outside
/// `vertices` are ignored.
pub fn compute_vertex_normals(vertices: &[Vec3], triangles: &[Triangle]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    for &[a, b, c] in triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let (Some(&va), Some(&vb), Some(&vc)) = (vertices.get(a), vertices.get(b), vertices.get(c))
        else {
            continue;
        };

        let face_normal = (vb - va).cross(&(vc - va));
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    for normal in &mut normals {
        *normal = normal.normalize();
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1e-5,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_flat_quad_points_up_z() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2], [0, 2, 3]]);

        for normal in normals {
            assert_close(normal, Vec3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_isolated_vertex_keeps_zero_normal() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(5.0, 5.0, 5.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2]]);

        assert_eq!(normals.len(), 4);
        assert_eq!(normals[3], Vec3::ZERO);
        assert!((normals[0].length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_opposing_faces_cancel_to_zero() {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2], [0, 2, 1]]);

        assert!(normals.iter().all(|n| *n == Vec3::ZERO));
    }

    #[test]
    fn test_larger_face_dominates_shared_vertex() {
        // Vertex 0 is shared by a big +Z triangle and a small +X triangle
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2], [0, 3, 4]]);

        assert!(normals[0].z > normals[0].x);
        assert!((normals[0].length() - 1.0).abs() < 1e-4);
    }
}
