//! End-to-end conversion: scene text to GLB.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};
use wrlglb_core::error::ResultExt;
use wrlglb_core::{ConversionOutcome, Error, Geometry, Result};
use wrlglb_parsers::{log_extract_done, log_extract_failed, log_extract_start};
use wrlglb_parsers::{ParseOptions, Parser, VrmlParser};

use crate::fallback::{box_geometry, BoxDimensions};
use crate::gltf::{BuiltMesh, GltfExportOptions, GltfExporter};

/// Everything a single conversion needs to know
#[derive(Debug, Clone, Default)]
pub struct ConvertSettings {
    pub parse: ParseOptions,
    pub export: GltfExportOptions,
    /// Substitute a placeholder box when the source has no geometry
    pub fallback_box: Option<BoxDimensions>,
}

/// Mesh name for an asset file: the file stem without the `_geo`/`_main`
/// markers the catalogue export adds.
pub fn asset_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = stem.replace("_geo", "").replace("_main", "");
    if name.is_empty() {
        "model".to_string()
    } else {
        name
    }
}

/// Pair every batch input with an outcome it reports without converting.
///
/// Inputs map to `<asset_name>.glb`, so two inputs with the same asset
/// name would overwrite each other. The first input in order keeps the
/// name and every later one is reported as [`ConversionOutcome::Failed`].
pub fn plan_batch(inputs: &[PathBuf]) -> Vec<(&Path, Option<ConversionOutcome>)> {
    let mut claimed: HashMap<String, &Path> = HashMap::with_capacity(inputs.len());

    inputs
        .iter()
        .map(|input| {
            let name = asset_name(input);
            match claimed.get(&name) {
                Some(first) => {
                    warn!(input = %input.display(), first = %first.display(), name, "Duplicate asset name");
                    let error = format!("asset name {name} is already produced by {}", first.display());
                    (input.as_path(), Some(ConversionOutcome::Failed { name, error }))
                }
                None => {
                    claimed.insert(name, input);
                    (input.as_path(), None)
                }
            }
        })
        .collect()
}

/// Convert decoded scene text into an in-memory mesh.
pub fn convert_str(text: &str, name: &str, settings: &ConvertSettings) -> Result<BuiltMesh> {
    let geometry = match VrmlParser::new().parse_str_with_options(text, &settings.parse) {
        Ok(geometry) => geometry,
        Err(e) if e.is_no_geometry() => fallback_or(settings, name, Error::NoGeometry)?,
        Err(e) => return Err(e.into()),
    };

    let exporter = GltfExporter::new(settings.export.clone());
    Ok(exporter.build(&geometry, name)?)
}

/// Convert one scene file into `output_dir`, reporting the outcome
/// instead of failing.
pub fn convert_file(input: &Path, output_dir: &Path, settings: &ConvertSettings) -> ConversionOutcome {
    let name = asset_name(input);

    match try_convert_file(input, output_dir, &name, settings) {
        Ok(outcome) => outcome,
        Err(e) if e.is_no_geometry() => {
            info!(input = %input.display(), "No geometry, skipped");
            ConversionOutcome::NoGeometry { name }
        }
        Err(e) => {
            warn!(input = %input.display(), error = %e, "Conversion failed");
            ConversionOutcome::Failed {
                name,
                error: e.to_string(),
            }
        }
    }
}

fn try_convert_file(input: &Path, output_dir: &Path, name: &str, settings: &ConvertSettings) -> Result<ConversionOutcome> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    let parser = VrmlParser::new();
    log_extract_start!(parser.name(), input);
    let start = Instant::now();

    let (geometry, fallback) = match parser.parse_file_with_options(input, &settings.parse) {
        Ok(geometry) => {
            log_extract_done!(
                parser.name(),
                start.elapsed(),
                geometry.vertex_count(),
                geometry.triangle_count()
            );
            (geometry, false)
        }
        Err(e) if e.is_no_geometry() => (fallback_or(settings, name, e.into())?, true),
        Err(e) => {
            log_extract_failed!(parser.name(), e);
            return Err(e.into());
        }
    };

    let exporter = GltfExporter::new(settings.export.clone());
    let (output, bytes) = exporter
        .export_file(&geometry, name, output_dir.join(format!("{name}.glb")))
        .map_err(Error::from)
        .with_context(|| format!("exporting {}", input.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        vertices = geometry.vertex_count(),
        triangles = geometry.triangle_count(),
        bytes,
        fallback,
        "Converted"
    );

    Ok(ConversionOutcome::Converted {
        name: name.to_string(),
        output,
        vertex_count: geometry.vertex_count(),
        triangle_count: geometry.triangle_count(),
        bytes,
        fallback,
    })
}

fn fallback_or(settings: &ConvertSettings, name: &str, err: Error) -> Result<Geometry> {
    match settings.fallback_box {
        Some(dims) => {
            warn!(name, ?dims, "No geometry, substituting placeholder box");
            Ok(box_geometry(dims))
        }
        None => Err(err),
    }
}
