//! Placeholder cabinet box for assets without usable geometry.
//!
//! Substituting the box is a driver decision; the exporter itself always
//! reports missing geometry.

use std::str::FromStr;

use wrlglb_core::{Geometry, Vec3};

/// Outer cabinet dimensions in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDimensions {
    pub width_mm: f32,
    pub height_mm: f32,
    pub depth_mm: f32,
}

impl FromStr for BoxDimensions {
    type Err = String;

    /// Parses `WIDTHxHEIGHTxDEPTH`, e.g. `600x720x560`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(['x', 'X']).map(str::trim).collect();
        let [w, h, d] = parts.as_slice() else {
            return Err(format!("Expected WIDTHxHEIGHTxDEPTH, got: {}", s));
        };

        let parse = |v: &str| -> Result<f32, String> {
            match v.parse::<f32>() {
                Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
                _ => Err(format!("Invalid dimension {:?} in {}", v, s)),
            }
        };

        Ok(Self {
            width_mm: parse(*w)?,
            height_mm: parse(*h)?,
            depth_mm: parse(*d)?,
        })
    }
}

/// Eight-corner box in metres, centred on X and Z with its base at y = 0.
/// Faces are wound counter-clockwise seen from outside.
pub fn box_geometry(dims: BoxDimensions) -> Geometry {
    let w = dims.width_mm / 2000.0;
    let h = dims.height_mm / 1000.0;
    let d = dims.depth_mm / 2000.0;

    let vertices = vec![
        // back
        Vec3::new(-w, 0.0, -d),
        Vec3::new(w, 0.0, -d),
        Vec3::new(w, h, -d),
        Vec3::new(-w, h, -d),
        // front
        Vec3::new(-w, 0.0, d),
        Vec3::new(w, 0.0, d),
        Vec3::new(w, h, d),
        Vec3::new(-w, h, d),
    ];

    let triangles = vec![
        [0, 2, 1], [0, 3, 2], // back
        [4, 5, 6], [4, 6, 7], // front
        [0, 5, 4], [0, 1, 5], // bottom
        [2, 7, 6], [2, 3, 7], // top
        [0, 7, 3], [0, 4, 7], // left
        [1, 6, 5], [1, 2, 6], // right
    ];

    Geometry::new(vertices, triangles)
}
