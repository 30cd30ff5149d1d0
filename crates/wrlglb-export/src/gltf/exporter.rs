//! glTF exporter implementation

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use wrlglb_core::{BoundingBox, Geometry, Triangle};

use super::*;
use crate::glb;

/// Vertices addressable by 16-bit indices.
///
/// A mesh that uses every one of them emits index 65535. glTF 2.0 reserves
/// that value as the primitive restart marker for `UNSIGNED_SHORT` indices,
/// so strict validators report such a mesh even though viewers load it.
pub const MAX_U16_VERTICES: usize = u16::MAX as usize + 1;

/// What to do with a mesh that 16-bit indices cannot address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OversizePolicy {
    /// Fail with [`GltfExportError::IndexOverflow`]
    #[default]
    Reject,
    /// Keep the first [`MAX_U16_VERTICES`] vertices and every triangle that
    /// only uses them
    Truncate,
}

impl std::str::FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(OversizePolicy::Reject),
            "truncate" => Ok(OversizePolicy::Truncate),
            _ => Err(format!("Unknown oversize policy: {}", s)),
        }
    }
}

/// Flat PBR parameters of the single material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            // light wood
            base_color: [0.9, 0.85, 0.75, 1.0],
            metallic: 0.0,
            roughness: 0.7,
        }
    }
}

/// glTF export options
#[derive(Debug, Clone)]
pub struct GltfExportOptions {
    /// Export as GLB (single binary file) instead of separate JSON + BIN
    pub use_glb: bool,
    /// Pretty-print JSON (separate .gltf output only; GLB is always compact)
    pub pretty_json: bool,
    /// Handling of meshes beyond 16-bit index range
    pub oversize: OversizePolicy,
    /// Material written into every mesh
    pub material: MaterialParams,
    /// `asset.generator` value
    pub generator: String,
}

impl Default for GltfExportOptions {
    fn default() -> Self {
        Self {
            use_glb: true,
            pretty_json: false,
            oversize: OversizePolicy::Reject,
            material: MaterialParams::default(),
            generator: format!("wrlglb {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// glTF export errors
#[derive(Debug, thiserror::Error)]
pub enum GltfExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No usable geometry")]
    NoGeometry,

    #[error("Mesh has {vertex_count} vertices, 16-bit indices address at most {max}")]
    IndexOverflow { vertex_count: usize, max: usize },

    #[error("Invalid mesh data: {0}")]
    InvalidMeshData(String),

    #[error("Invalid container: {0}")]
    InvalidContainer(String),
}

impl From<GltfExportError> for wrlglb_core::Error {
    fn from(err: GltfExportError) -> Self {
        match err {
            GltfExportError::Io(e) => wrlglb_core::Error::Io(e),
            GltfExportError::NoGeometry => wrlglb_core::Error::NoGeometry,
            GltfExportError::IndexOverflow { vertex_count, max } => {
                wrlglb_core::Error::IndexOverflow { vertex_count, max }
            }
            other => wrlglb_core::Error::export_failed(other.to_string()),
        }
    }
}

pub type GltfResult<T> = Result<T, GltfExportError>;

/// A finished glTF document with its packed binary buffer
#[derive(Debug, Clone)]
pub struct BuiltMesh {
    pub document: Gltf,
    pub buffer: Vec<u8>,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounding_box: BoundingBox,
}

impl BuiltMesh {
    /// Encode as a GLB container
    pub fn to_glb(&self) -> GltfResult<Vec<u8>> {
        glb::encode_glb(&self.document, &self.buffer)
    }
}

/// glTF exporter
#[derive(Debug, Clone, Default)]
pub struct GltfExporter {
    options: GltfExportOptions,
}

impl GltfExporter {
    /// Create a new glTF exporter
    pub fn new(options: GltfExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GltfExportOptions {
        &self.options
    }

    /// Build the glTF document and binary buffer for one mesh
    pub fn build(&self, geometry: &Geometry, name: &str) -> GltfResult<BuiltMesh> {
        if geometry.is_empty() {
            return Err(GltfExportError::NoGeometry);
        }

        let geometry = self.fit_index_range(geometry)?;
        let vertices = &geometry.vertices;
        let triangles = &geometry.triangles;

        let indices = flatten_indices(triangles, vertices.len())?;
        let normals = compute_vertex_normals(vertices, triangles);
        let packed = pack_buffer(vertices, &normals, &indices);

        let bounding_box = geometry
            .bounding_box()
            .ok_or(GltfExportError::NoGeometry)?;

        debug!(
            name,
            vertices = vertices.len(),
            triangles = triangles.len(),
            buffer_bytes = packed.len(),
            "Built glTF mesh"
        );

        let document = self.build_document(name, vertices.len(), indices.len(), &bounding_box, &packed);

        Ok(BuiltMesh {
            document,
            buffer: packed.bytes,
            vertex_count: vertices.len(),
            triangle_count: triangles.len(),
            bounding_box,
        })
    }

    /// Build and encode as a GLB container in memory
    pub fn build_glb(&self, geometry: &Geometry, name: &str) -> GltfResult<Vec<u8>> {
        self.build(geometry, name)?.to_glb()
    }

    /// Build and write a GLB container to any sink.
    ///
    /// The container is fully encoded before the first byte is written.
    pub fn write_glb_to<W: Write>(&self, geometry: &Geometry, name: &str, sink: &mut W) -> GltfResult<usize> {
        let bytes = self.build_glb(geometry, name)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(bytes.len())
    }

    /// Export mesh to a file, as GLB or as .gltf + .bin depending on options.
    ///
    /// Returns the path of the written file (the .gltf for separate output)
    /// and the number of bytes written.
    pub fn export_file(&self, geometry: &Geometry, name: &str, output_path: impl AsRef<Path>) -> GltfResult<(PathBuf, usize)> {
        let output_path = output_path.as_ref();
        let mesh = self.build(geometry, name)?;

        if self.options.use_glb {
            let path = output_path.with_extension("glb");
            let bytes = mesh.to_glb()?;
            write_atomic(&path, &bytes)?;
            Ok((path, bytes.len()))
        } else {
            self.write_separate_files(mesh, output_path)
        }
    }

    /// Write separate JSON + BIN files
    fn write_separate_files(&self, mut mesh: BuiltMesh, output_path: &Path) -> GltfResult<(PathBuf, usize)> {
        let json_path = output_path.with_extension("gltf");
        let bin_path = output_path.with_extension("bin");
        let bin_name = bin_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| GltfExportError::InvalidMeshData(format!("invalid output path {}", output_path.display())))?;

        mesh.document.buffers[0].uri = Some(bin_name);

        let json = if self.options.pretty_json {
            serde_json::to_vec_pretty(&mesh.document)?
        } else {
            serde_json::to_vec(&mesh.document)?
        };

        write_atomic(&bin_path, &mesh.buffer)?;
        if let Err(e) = write_atomic(&json_path, &json) {
            // The .bin is useless without its descriptor
            if let Err(cleanup) = std::fs::remove_file(&bin_path) {
                warn!(path = %bin_path.display(), error = %cleanup, "Failed to remove orphaned buffer");
            }
            return Err(e);
        }

        Ok((json_path, json.len() + mesh.buffer.len()))
    }

    /// Apply the oversize policy so every vertex fits a u16 index
    fn fit_index_range<'g>(&self, geometry: &'g Geometry) -> GltfResult<Cow<'g, Geometry>> {
        let vertex_count = geometry.vertex_count();
        if vertex_count <= MAX_U16_VERTICES {
            return Ok(Cow::Borrowed(geometry));
        }

        match self.options.oversize {
            OversizePolicy::Reject => Err(GltfExportError::IndexOverflow {
                vertex_count,
                max: MAX_U16_VERTICES,
            }),
            OversizePolicy::Truncate => {
                let mut truncated = geometry.clone();
                truncated.vertices.truncate(MAX_U16_VERTICES);
                let dropped = truncated.retain_valid_triangles();
                warn!(
                    vertex_count,
                    kept_vertices = MAX_U16_VERTICES,
                    dropped_triangles = dropped,
                    "Truncating mesh to 16-bit index range"
                );
                if truncated.is_empty() {
                    return Err(GltfExportError::NoGeometry);
                }
                Ok(Cow::Owned(truncated))
            }
        }
    }

    /// Assemble the fixed-shape document around the packed buffer
    fn build_document(
        &self,
        name: &str,
        vertex_count: usize,
        index_count: usize,
        bounding_box: &BoundingBox,
        packed: &PackedBuffer,
    ) -> Gltf {
        let material = &self.options.material;

        Gltf {
            asset: Asset {
                version: "2.0".to_string(),
                generator: Some(self.options.generator.clone()),
            },
            scene: 0,
            scenes: vec![Scene { nodes: vec![0] }],
            nodes: vec![Node {
                name: Some(name.to_string()),
                mesh: Some(0),
            }],
            meshes: vec![Mesh {
                name: Some(name.to_string()),
                primitives: vec![Primitive {
                    attributes: Attributes {
                        position: POSITION_ACCESSOR,
                        normal: NORMAL_ACCESSOR,
                    },
                    indices: Some(INDEX_ACCESSOR),
                    material: Some(0),
                    mode: Some(MODE_TRIANGLES),
                }],
            }],
            materials: vec![Material {
                name: Some("default".to_string()),
                pbr_metallic_roughness: Some(PbrMetallicRoughness {
                    base_color_factor: Some(material.base_color),
                    metallic_factor: Some(material.metallic),
                    roughness_factor: Some(material.roughness),
                }),
            }],
            accessors: vec![
                Accessor {
                    buffer_view: Some(POSITION_ACCESSOR),
                    byte_offset: None,
                    component_type: COMPONENT_TYPE_FLOAT,
                    count: vertex_count,
                    accessor_type: "VEC3".to_string(),
                    max: Some(bounding_box.max.to_array().to_vec()),
                    min: Some(bounding_box.min.to_array().to_vec()),
                },
                Accessor {
                    buffer_view: Some(NORMAL_ACCESSOR),
                    byte_offset: None,
                    component_type: COMPONENT_TYPE_FLOAT,
                    count: vertex_count,
                    accessor_type: "VEC3".to_string(),
                    max: None,
                    min: None,
                },
                Accessor {
                    buffer_view: Some(INDEX_ACCESSOR),
                    byte_offset: None,
                    component_type: COMPONENT_TYPE_UNSIGNED_SHORT,
                    count: index_count,
                    accessor_type: "SCALAR".to_string(),
                    max: None,
                    min: None,
                },
            ],
            buffer_views: vec![
                buffer_view(packed.positions, TARGET_ARRAY_BUFFER),
                buffer_view(packed.normals, TARGET_ARRAY_BUFFER),
                buffer_view(packed.indices, TARGET_ELEMENT_ARRAY_BUFFER),
            ],
            buffers: vec![Buffer {
                uri: None,
                byte_length: packed.len(),
            }],
        }
    }
}

fn buffer_view(region: Region, target: u32) -> BufferView {
    BufferView {
        buffer: 0,
        byte_offset: region.offset,
        byte_length: region.length,
        target: Some(target),
    }
}

/// Triangles to a flat u16 index list, checking every corner
fn flatten_indices(triangles: &[Triangle], vertex_count: usize) -> GltfResult<Vec<u16>> {
    let mut indices = Vec::with_capacity(triangles.len() * 3);
    for (tri_idx, triangle) in triangles.iter().enumerate() {
        for &corner in triangle {
            if corner as usize >= vertex_count {
                return Err(GltfExportError::InvalidMeshData(format!(
                    "triangle {} references vertex {} of {}",
                    tri_idx, corner, vertex_count
                )));
            }
            let index = u16::try_from(corner).map_err(|_| GltfExportError::IndexOverflow {
                vertex_count,
                max: MAX_U16_VERTICES,
            })?;
            indices.push(index);
        }
    }
    Ok(indices)
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// so a failure never leaves a partial file behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> GltfResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrlglb_core::Vec3;

    fn unit_square() -> Geometry {
        Geometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_document_shape() {
        let mesh = GltfExporter::default().build(&unit_square(), "square").unwrap();
        let doc = &mesh.document;

        assert_eq!(doc.scenes.len(), 1);
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.meshes.len(), 1);
        assert_eq!(doc.materials.len(), 1);
        assert_eq!(doc.accessors.len(), 3);
        assert_eq!(doc.buffer_views.len(), 3);
        assert_eq!(doc.buffers.len(), 1);
        assert_eq!(doc.nodes[0].name.as_deref(), Some("square"));
        assert_eq!(doc.meshes[0].name.as_deref(), Some("square"));
    }

    #[test]
    fn test_accessor_counts_and_bounds() {
        let mesh = GltfExporter::default().build(&unit_square(), "square").unwrap();
        let accessors = &mesh.document.accessors;

        assert_eq!(accessors[0].count, 4);
        assert_eq!(accessors[0].min, Some(vec![0.0, 0.0, 0.0]));
        assert_eq!(accessors[0].max, Some(vec![1.0, 1.0, 0.0]));
        assert_eq!(accessors[1].count, 4);
        assert!(accessors[1].min.is_none());
        assert_eq!(accessors[2].count, 6);
        assert_eq!(accessors[2].component_type, COMPONENT_TYPE_UNSIGNED_SHORT);
    }

    #[test]
    fn test_buffer_views_are_cumulative() {
        let mesh = GltfExporter::default().build(&unit_square(), "square").unwrap();
        let views = &mesh.document.buffer_views;

        assert_eq!(views[0].byte_offset, 0);
        assert_eq!(views[1].byte_offset, views[0].byte_length);
        assert_eq!(views[2].byte_offset, views[0].byte_length + views[1].byte_length);
        assert_eq!(views[2].target, Some(TARGET_ELEMENT_ARRAY_BUFFER));
        assert_eq!(mesh.document.buffers[0].byte_length, mesh.buffer.len());
        assert_eq!(mesh.buffer.len(), 48 + 48 + 12);
    }

    #[test]
    fn test_empty_geometry_is_no_geometry() {
        let exporter = GltfExporter::default();
        let no_triangles = Geometry::new(vec![Vec3::ZERO; 3], vec![]);

        assert!(matches!(exporter.build(&Geometry::default(), "x"), Err(GltfExportError::NoGeometry)));
        assert!(matches!(exporter.build(&no_triangles, "x"), Err(GltfExportError::NoGeometry)));
    }

    #[test]
    fn test_out_of_range_triangle_rejected() {
        let geometry = Geometry::new(vec![Vec3::ZERO; 3], vec![[0, 1, 3]]);
        assert!(matches!(
            GltfExporter::default().build(&geometry, "x"),
            Err(GltfExportError::InvalidMeshData(_))
        ));
    }

    fn oversized() -> Geometry {
        let vertices = (0..MAX_U16_VERTICES + 3)
            .map(|i| Vec3::new(i as f32, (i % 7) as f32, 0.0))
            .collect();
        let last = (MAX_U16_VERTICES + 2) as u32;
        Geometry::new(vertices, vec![[0, 1, 2], [last - 2, last - 1, last], [1, 2, last]])
    }

    #[test]
    fn test_oversize_rejected_by_default() {
        match GltfExporter::default().build(&oversized(), "big") {
            Err(GltfExportError::IndexOverflow { vertex_count, max }) => {
                assert_eq!(vertex_count, MAX_U16_VERTICES + 3);
                assert_eq!(max, MAX_U16_VERTICES);
            }
            other => panic!("expected IndexOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_oversize_truncate_keeps_addressable_triangles() {
        let exporter = GltfExporter::new(GltfExportOptions {
            oversize: OversizePolicy::Truncate,
            ..Default::default()
        });
        let mesh = exporter.build(&oversized(), "big").unwrap();

        assert_eq!(mesh.vertex_count, MAX_U16_VERTICES);
        assert_eq!(mesh.triangle_count, 1);
        assert_eq!(mesh.document.accessors[2].count, 3);
    }

    #[test]
    fn test_full_u16_range_is_accepted() {
        let vertices = (0..MAX_U16_VERTICES)
            .map(|i| Vec3::new(i as f32, (i % 5) as f32, 0.0))
            .collect();
        let last = (MAX_U16_VERTICES - 1) as u32;
        let geometry = Geometry::new(vertices, vec![[0, 1, last]]);

        let mesh = GltfExporter::default().build(&geometry, "full").unwrap();
        assert_eq!(mesh.vertex_count, MAX_U16_VERTICES);
        assert_eq!(mesh.document.accessors[2].component_type, COMPONENT_TYPE_UNSIGNED_SHORT);
        let start = mesh.document.buffer_views[2].byte_offset;
        let indices = &mesh.buffer[start..start + 6];
        assert_eq!(&indices[4..6], &u16::MAX.to_le_bytes());
    }

    #[test]
    fn test_separate_files_leave_no_orphan_bin() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the descriptor should go makes its write fail
        std::fs::create_dir(dir.path().join("square.gltf")).unwrap();

        let exporter = GltfExporter::new(GltfExportOptions {
            use_glb: false,
            ..Default::default()
        });
        assert!(exporter.export_file(&unit_square(), "square", dir.path().join("square")).is_err());
        assert!(!dir.path().join("square.bin").exists());
    }

    #[test]
    fn test_oversize_policy_from_str() {
        assert_eq!("Truncate".parse::<OversizePolicy>(), Ok(OversizePolicy::Truncate));
        assert!("split".parse::<OversizePolicy>().is_err());
    }

    #[test]
    fn test_unified_error_conversion() {
        let err: wrlglb_core::Error = GltfExportError::IndexOverflow { vertex_count: 70_000, max: MAX_U16_VERTICES }.into();
        assert!(err.is_index_overflow());

        let err: wrlglb_core::Error = GltfExportError::NoGeometry.into();
        assert!(err.is_no_geometry());
    }
}
