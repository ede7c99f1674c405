//! Generation results.
//!
//! [`summarize`] turns the raw outcome of one generation call into a
//! [`MeshResult`], and [`render`] prints it for humans. `MeshResult` also
//! serializes to JSON for machine consumers.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::{RawMesh, RunMode};
use crate::error::{ErrorKind, StackError};
use crate::stack::StackParameters;

/// Everything one generation call produced, before summarizing.
#[derive(Debug, Default)]
pub struct RawOutput {
    /// How the call was run.
    pub mode: RunMode,
    /// Geometry script, if it was written.
    pub geo_file: Option<PathBuf>,
    /// Engine output, if the engine ran.
    pub mesh: Option<RawMesh>,
    /// First error encountered.
    pub error: Option<StackError>,
}

/// Dimension and tag of a named physical group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    /// Physical tag.
    pub tag: i32,
    /// Entity dimension.
    pub dimension: i32,
}

/// Whether a physical group holds surfaces or volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Surface,
    Volume,
}

impl GroupKind {
    /// Kind for an entity dimension, if it is 2 or 3.
    pub fn from_dimension(dimension: i32) -> Option<Self> {
        match dimension {
            2 => Some(GroupKind::Surface),
            3 => Some(GroupKind::Volume),
            _ => None,
        }
    }
}

/// A named physical group in the produced mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalGroup {
    pub name: String,
    pub tag: i32,
    pub kind: GroupKind,
    pub dimension: i32,
}

/// Serializable description of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Broad category.
    pub kind: ErrorKind,
    /// `CYL-XXXX` code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// What to try next.
    pub suggestion: String,
    /// 0-based layer the error was attributed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
}

impl From<&StackError> for ErrorReport {
    fn from(err: &StackError) -> Self {
        // Include the source chain so I/O causes are not lost.
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        Self {
            kind: err.kind(),
            code: err.code().as_str().to_string(),
            message,
            suggestion: err.recovery_suggestion().to_string(),
            layer: err.layer(),
        }
    }
}

/// Outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshResult {
    /// True if the call achieved what its mode asked for.
    pub success: bool,
    /// Run mode of the call.
    pub mode: RunMode,
    /// Parameters as supplied; `None` when no complete set was available.
    pub parameters: Option<StackParameters>,
    /// Sum of layer thicknesses.
    pub total_height: f64,
    /// Number of layers.
    pub num_layers: usize,
    /// Geometry script, if written.
    pub geo_file: Option<PathBuf>,
    /// Mesh file, if written.
    pub mesh_file: Option<PathBuf>,
    /// Geometry script size in bytes.
    pub geo_size: Option<u64>,
    /// Mesh file size in bytes.
    pub mesh_size: Option<u64>,
    pub num_vertices: usize,
    pub num_elements: usize,
    /// Physical groups keyed by name.
    pub physical_groups: BTreeMap<String, GroupInfo>,
    /// Failure description.
    pub error: Option<ErrorReport>,
}

impl MeshResult {
    /// Result for a call that failed before producing anything.
    pub fn failure(parameters: &StackParameters, mode: RunMode, error: StackError) -> Self {
        summarize(
            RawOutput {
                mode,
                error: Some(error),
                ..RawOutput::default()
            },
            parameters,
        )
    }

    /// Result for a call that failed before a complete parameter set existed,
    /// such as an unreadable config file or a missing required key.
    pub fn without_parameters(mode: RunMode, error: StackError) -> Self {
        build(
            RawOutput {
                mode,
                error: Some(error),
                ..RawOutput::default()
            },
            None,
        )
    }

    /// Surface groups in tag order.
    pub fn surfaces(&self) -> Vec<PhysicalGroup> {
        self.groups_of(GroupKind::Surface)
    }

    /// Volume groups in tag order.
    pub fn volumes(&self) -> Vec<PhysicalGroup> {
        self.groups_of(GroupKind::Volume)
    }

    fn groups_of(&self, kind: GroupKind) -> Vec<PhysicalGroup> {
        let mut groups: Vec<PhysicalGroup> = self
            .physical_groups
            .iter()
            .filter(|(_, info)| GroupKind::from_dimension(info.dimension) == Some(kind))
            .map(|(name, info)| PhysicalGroup {
                name: name.clone(),
                tag: info.tag,
                kind,
                dimension: info.dimension,
            })
            .collect();
        groups.sort_by_key(|g| g.tag);
        groups
    }
}

/// Build a [`MeshResult`] from the raw outcome of a generation call.
///
/// In batch mode success requires no error and at least one element. In
/// geometry-only and interactive modes success means no error.
pub fn summarize(raw: RawOutput, parameters: &StackParameters) -> MeshResult {
    build(raw, Some(parameters))
}

fn build(raw: RawOutput, parameters: Option<&StackParameters>) -> MeshResult {
    let mesh = raw.mesh.unwrap_or_default();
    let geo_file = raw.geo_file.filter(|p| p.exists());
    let mesh_file = mesh.mesh_file.filter(|p| p.exists());

    let physical_groups = mesh
        .groups
        .into_iter()
        .map(|g| {
            (
                g.name,
                GroupInfo {
                    tag: g.tag,
                    dimension: g.dimension,
                },
            )
        })
        .collect();

    let success = raw.error.is_none()
        && match raw.mode {
            RunMode::Batch => mesh.num_elements > 0,
            RunMode::GeometryOnly | RunMode::Interactive => true,
        };

    MeshResult {
        success,
        mode: raw.mode,
        parameters: parameters.cloned(),
        total_height: parameters.map_or(0.0, StackParameters::total_height),
        num_layers: parameters.map_or(0, StackParameters::num_layers),
        geo_size: geo_file.as_deref().and_then(file_size),
        mesh_size: mesh_file.as_deref().and_then(file_size),
        geo_file,
        mesh_file,
        num_vertices: mesh.num_vertices,
        num_elements: mesh.num_elements,
        physical_groups,
        error: raw.error.as_ref().map(ErrorReport::from),
    }
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

/// Render a result as plain text.
pub fn render(result: &MeshResult) -> String {
    result.to_string()
}

impl std::fmt::Display for MeshResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "MESH GENERATION SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Status: {}", if self.success { "SUCCESS" } else { "FAILED" })?;
        writeln!(f, "Mode: {}", mode_name(self.mode))?;

        writeln!(f, "\nFiles:")?;
        writeln!(f, "  Geometry: {}", file_line(&self.geo_file, self.geo_size))?;
        writeln!(f, "  Mesh: {}", file_line(&self.mesh_file, self.mesh_size))?;

        writeln!(f, "\nParameters:")?;
        match &self.parameters {
            Some(params) => write_parameters(f, params, self)?,
            None => writeln!(f, "  (unavailable)")?,
        }

        writeln!(f, "\nMesh statistics:")?;
        writeln!(f, "  Vertices: {}", self.num_vertices)?;
        writeln!(f, "  Elements: {}", self.num_elements)?;

        if !self.physical_groups.is_empty() {
            writeln!(f, "  Physical groups: {}", self.physical_groups.len())?;
            for (label, groups) in [("Surfaces", self.surfaces()), ("Volumes", self.volumes())] {
                if groups.is_empty() {
                    continue;
                }
                writeln!(f, "    {} ({}):", label, groups.len())?;
                for g in groups {
                    writeln!(f, "    - {} (tag {})", g.name, g.tag)?;
                }
            }
        }

        if let Some(err) = &self.error {
            writeln!(f, "\nError [{}] ({}): {}", err.code, err.kind, err.message)?;
            writeln!(f, "  Suggestion: {}", err.suggestion)?;
        }
        Ok(())
    }
}

fn write_parameters(
    f: &mut std::fmt::Formatter<'_>,
    params: &StackParameters,
    result: &MeshResult,
) -> std::fmt::Result {
    writeln!(f, "  Mesh length: {}", params.ml)?;
    writeln!(f, "  Radius: {}", params.radius)?;
    writeln!(f, "  Total height: {}", result.total_height)?;
    writeln!(f, "  Number of layers: {}", result.num_layers)?;
    writeln!(f, "  Layer thicknesses: {:?}", params.layers)?;
    if let Some(names) = &params.layer_names {
        let names: Vec<&str> = names.iter().map(|n| n.as_deref().unwrap_or("-")).collect();
        writeln!(f, "  Layer names: {}", names.join(", "))?;
    }
    if let Some(subdivisions) = &params.subdivisions {
        let subdivisions: Vec<String> = subdivisions
            .iter()
            .map(|s| s.map_or_else(|| "auto".to_string(), |n| n.to_string()))
            .collect();
        writeln!(f, "  Subdivisions: {}", subdivisions.join(", "))?;
    }
    Ok(())
}

fn mode_name(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Batch => "batch",
        RunMode::GeometryOnly => "geometry only",
        RunMode::Interactive => "interactive",
    }
}

fn file_line(path: &Option<PathBuf>, size: Option<u64>) -> String {
    match (path, size) {
        (Some(p), Some(bytes)) => format!("{} ({} bytes)", p.display(), bytes),
        (Some(p), None) => p.display().to_string(),
        (None, _) => "(not written)".to_string(),
    }
}
