//! wrlglb Export Pipeline
//!
//! Turns triangulated geometry into binary glTF:
//! - glTF 2.0 document and packed buffer (positions, normals, indices)
//! - GLB container framing and inspection
//! - Placeholder box geometry for assets without a mesh
//! - JSON batch reports

pub mod fallback;
pub mod glb;
pub mod gltf;
pub mod json;
pub mod pipeline;

pub use fallback::{box_geometry, BoxDimensions};
pub use glb::{encode_glb, read_glb_info, GlbInfo};
pub use gltf::{BuiltMesh, GltfExportError, GltfExportOptions, GltfExporter, OversizePolicy};
pub use json::{JsonExporter, JsonExportOptions};
pub use pipeline::{asset_name, convert_file, convert_str, plan_batch, ConvertSettings};
