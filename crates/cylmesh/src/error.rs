// Allow unused_assignments lint for error struct fields that are used in thiserror Display macros
// but appear as "never read" to the compiler.
#![allow(unused_assignments)]

//! Error types for stack validation and mesh generation.
//!
//! Every error carries:
//! - A broad [`ErrorKind`] (validation, geometry, meshing, I/O)
//! - A machine-readable [`ErrorCode`] in the format `CYL-XXXX`
//! - A [`RecoverySuggestion`] for the command-line front end
//!
//! # Error Codes
//!
//! - `CYL-1xxx`: Validation errors (raised before the engine is touched)
//! - `CYL-2xxx`: Geometry errors reported by the engine
//! - `CYL-3xxx`: Meshing errors reported by the engine
//! - `CYL-4xxx`: File I/O errors

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stack and generation operations.
pub type StackResult<T> = Result<T, StackError>;

/// Broad error category, stable across error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, detected before any engine call.
    Validation,
    /// The engine could not construct the requested solid.
    Geometry,
    /// The engine failed to mesh the geometry (or could not be run at all).
    Meshing,
    /// Reading or writing a file failed.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::Geometry => "geometry error",
            ErrorKind::Meshing => "meshing error",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(s)
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// CYL-1001: Parameter is not a positive finite number
    InvalidValue = 1001,
    /// CYL-1002: Stack has no layers
    EmptyStack = 1002,
    /// CYL-1003: Per-layer list length differs from the layer count
    LengthMismatch = 1003,
    /// CYL-1004: Subdivision count is zero
    InvalidSubdivisions = 1004,
    /// CYL-1005: Layer name cannot be used in a geometry script
    InvalidLayerName = 1005,
    /// CYL-1006: Two physical groups would share a name
    NamingCollision = 1006,
    /// CYL-1007: Required parameter missing after config merge
    MissingParameter = 1007,
    /// CYL-1008: Config file could not be parsed
    ConfigParse = 1008,

    /// CYL-2001: Engine rejected the geometry
    Geometry = 2001,

    /// CYL-3001: Engine executable could not be started
    EngineUnavailable = 3001,
    /// CYL-3002: Engine failed while meshing
    Meshing = 3002,

    /// CYL-4001: Failed to read a file
    IoRead = 4001,
    /// CYL-4002: Failed to write a file
    IoWrite = 4002,
    /// CYL-4003: Mesh file could not be interpreted
    MeshParse = 4003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `CYL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "CYL-1001",
            ErrorCode::EmptyStack => "CYL-1002",
            ErrorCode::LengthMismatch => "CYL-1003",
            ErrorCode::InvalidSubdivisions => "CYL-1004",
            ErrorCode::InvalidLayerName => "CYL-1005",
            ErrorCode::NamingCollision => "CYL-1006",
            ErrorCode::MissingParameter => "CYL-1007",
            ErrorCode::ConfigParse => "CYL-1008",
            ErrorCode::Geometry => "CYL-2001",
            ErrorCode::EngineUnavailable => "CYL-3001",
            ErrorCode::Meshing => "CYL-3002",
            ErrorCode::IoRead => "CYL-4001",
            ErrorCode::IoWrite => "CYL-4002",
            ErrorCode::MeshParse => "CYL-4003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions shown alongside an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Fix the named input parameters.
    FixParameters { parameters: Vec<String> },
    /// Give each layer a distinct name.
    RenameLayers { duplicate: String },
    /// Install or expose the engine executable.
    InstallEngine,
    /// Loosen the mesh settings.
    AdjustMesh { hints: Vec<String> },
    /// Check a file or directory on disk.
    CheckPath { path: PathBuf },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::FixParameters { parameters } => {
                write!(f, "Check the values of: {}", parameters.join(", "))
            }
            RecoverySuggestion::RenameLayers { duplicate } => {
                write!(
                    f,
                    "Rename layers so that '{}' is produced only once",
                    duplicate
                )
            }
            RecoverySuggestion::InstallEngine => write!(
                f,
                "Install Gmsh (conda install gmsh, or https://gmsh.info/) and make sure `gmsh` is on PATH"
            ),
            RecoverySuggestion::AdjustMesh { hints } => {
                write!(f, "Try adjusting: {}", hints.join(", "))
            }
            RecoverySuggestion::CheckPath { path } => {
                write!(
                    f,
                    "Check that {} exists and is accessible",
                    path.display()
                )
            }
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Errors that can occur while validating a stack or generating its mesh.
#[derive(Debug, Error, Diagnostic)]
pub enum StackError {
    /// A numeric parameter is zero, negative, NaN or infinite.
    #[error("{parameter} must be a positive finite number, got {value}")]
    #[diagnostic(
        code(cylmesh::validation::value),
        help("Mesh length, radius and every layer thickness must be > 0")
    )]
    InvalidValue { parameter: String, value: f64 },

    /// No layers were given.
    #[error("stack has no layers")]
    #[diagnostic(
        code(cylmesh::validation::empty),
        help("Specify at least one layer thickness")
    )]
    EmptyStack,

    /// A per-layer list does not match the number of layers.
    #[error("number of {field} ({found}) must match number of layers ({expected})")]
    #[diagnostic(code(cylmesh::validation::length))]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A subdivision count of zero.
    #[error("layer {} has {value} subdivisions; at least 1 is required", .layer + 1)]
    #[diagnostic(code(cylmesh::validation::subdivisions))]
    InvalidSubdivisions { layer: usize, value: u32 },

    /// A layer name that cannot be embedded in a geometry script.
    #[error("layer {} name {name:?} is invalid: {reason}", .layer + 1)]
    #[diagnostic(
        code(cylmesh::validation::name),
        help("Layer names must be non-empty and must not contain quotes or line breaks")
    )]
    InvalidLayerName {
        layer: usize,
        name: String,
        reason: &'static str,
    },

    /// Two physical groups would be tagged with the same name.
    #[error("physical group name {name:?} would be assigned twice (layers {} and {})", .first + 1, .second + 1)]
    #[diagnostic(
        code(cylmesh::validation::collision),
        help("Every layer needs a distinct name; unnamed layers are called 1, 2, 3, ...")
    )]
    NamingCollision {
        name: String,
        first: usize,
        second: usize,
    },

    /// A required parameter was not supplied by arguments or config.
    #[error("missing required parameter '{parameter}'")]
    #[diagnostic(code(cylmesh::validation::missing))]
    MissingParameter { parameter: &'static str },

    /// A config file was read but its contents are malformed.
    #[error("failed to parse config {path}: {details}")]
    #[diagnostic(code(cylmesh::config::parse))]
    ConfigParse { path: PathBuf, details: String },

    /// The engine could not build the solid.
    #[error("geometry construction failed{}: {details}", .layer.map(|l| format!(" in layer {}", l + 1)).unwrap_or_default())]
    #[diagnostic(
        code(cylmesh::engine::geometry),
        help("Inspect the generated .geo file; the layer thickness may be too small relative to the radius")
    )]
    Geometry { layer: Option<usize>, details: String },

    /// The engine executable could not be run.
    #[error("{engine} is not available: {details}")]
    #[diagnostic(code(cylmesh::engine::unavailable))]
    EngineUnavailable { engine: String, details: String },

    /// The engine failed to mesh.
    #[error("meshing failed{}: {details}", .exit_code.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    #[diagnostic(
        code(cylmesh::engine::meshing),
        help("Try a larger mesh length or fewer subdivisions")
    )]
    Meshing {
        details: String,
        exit_code: Option<i32>,
    },

    /// Error reading from a file.
    #[error("failed to read {path}")]
    #[diagnostic(code(cylmesh::io::read))]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write {path}")]
    #[diagnostic(
        code(cylmesh::io::write),
        help("Check that the directory is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mesh file exists but is not a readable ASCII `.msh`.
    #[error("failed to parse mesh file {path}: {details}")]
    #[diagnostic(code(cylmesh::io::mesh_parse))]
    MeshParse { path: PathBuf, details: String },
}

impl StackError {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StackError::InvalidValue { .. }
            | StackError::EmptyStack
            | StackError::LengthMismatch { .. }
            | StackError::InvalidSubdivisions { .. }
            | StackError::InvalidLayerName { .. }
            | StackError::NamingCollision { .. }
            | StackError::MissingParameter { .. }
            | StackError::ConfigParse { .. } => ErrorKind::Validation,
            StackError::Geometry { .. } => ErrorKind::Geometry,
            StackError::EngineUnavailable { .. } | StackError::Meshing { .. } => ErrorKind::Meshing,
            StackError::IoRead { .. } | StackError::IoWrite { .. } | StackError::MeshParse { .. } => {
                ErrorKind::Io
            }
        }
    }

    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StackError::InvalidValue { .. } => ErrorCode::InvalidValue,
            StackError::EmptyStack => ErrorCode::EmptyStack,
            StackError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            StackError::InvalidSubdivisions { .. } => ErrorCode::InvalidSubdivisions,
            StackError::InvalidLayerName { .. } => ErrorCode::InvalidLayerName,
            StackError::NamingCollision { .. } => ErrorCode::NamingCollision,
            StackError::MissingParameter { .. } => ErrorCode::MissingParameter,
            StackError::ConfigParse { .. } => ErrorCode::ConfigParse,
            StackError::Geometry { .. } => ErrorCode::Geometry,
            StackError::EngineUnavailable { .. } => ErrorCode::EngineUnavailable,
            StackError::Meshing { .. } => ErrorCode::Meshing,
            StackError::IoRead { .. } => ErrorCode::IoRead,
            StackError::IoWrite { .. } => ErrorCode::IoWrite,
            StackError::MeshParse { .. } => ErrorCode::MeshParse,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            StackError::InvalidValue { parameter, .. } => RecoverySuggestion::FixParameters {
                parameters: vec![parameter.clone()],
            },
            StackError::EmptyStack => RecoverySuggestion::FixParameters {
                parameters: vec!["layers".into()],
            },
            StackError::LengthMismatch { field, .. } => RecoverySuggestion::FixParameters {
                parameters: vec!["layers".into(), (*field).into()],
            },
            StackError::InvalidSubdivisions { .. } => RecoverySuggestion::FixParameters {
                parameters: vec!["subdivisions".into()],
            },
            StackError::InvalidLayerName { .. } => RecoverySuggestion::FixParameters {
                parameters: vec!["layer_names".into()],
            },
            StackError::NamingCollision { name, .. } => RecoverySuggestion::RenameLayers {
                duplicate: name.clone(),
            },
            StackError::MissingParameter { parameter } => RecoverySuggestion::FixParameters {
                parameters: vec![(*parameter).into()],
            },
            StackError::ConfigParse { path, .. } => RecoverySuggestion::CheckPath { path: path.clone() },
            StackError::Geometry { .. } => RecoverySuggestion::AdjustMesh {
                hints: vec!["layer thicknesses".into(), "radius".into()],
            },
            StackError::EngineUnavailable { .. } => RecoverySuggestion::InstallEngine,
            StackError::Meshing { .. } => RecoverySuggestion::AdjustMesh {
                hints: vec!["mesh length (larger)".into(), "subdivisions".into()],
            },
            StackError::IoRead { path, .. }
            | StackError::IoWrite { path, .. }
            | StackError::MeshParse { path, .. } => RecoverySuggestion::CheckPath { path: path.clone() },
        }
    }

    /// Returns the 0-based index of the offending layer, when known.
    pub fn layer(&self) -> Option<usize> {
        match self {
            StackError::InvalidSubdivisions { layer, .. }
            | StackError::InvalidLayerName { layer, .. } => Some(*layer),
            StackError::NamingCollision { second, .. } => Some(*second),
            StackError::Geometry { layer, .. } => *layer,
            _ => None,
        }
    }

    /// Returns the file path involved in this error, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            StackError::ConfigParse { path, .. }
            | StackError::IoRead { path, .. }
            | StackError::IoWrite { path, .. }
            | StackError::MeshParse { path, .. } => Some(path),
            _ => None,
        }
    }

    // Constructor helpers

    /// Create an InvalidValue error.
    pub fn invalid_value(parameter: impl Into<String>, value: f64) -> Self {
        StackError::InvalidValue {
            parameter: parameter.into(),
            value,
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StackError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StackError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a MeshParse error.
    pub fn mesh_parse(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        StackError::MeshParse {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create a Meshing error.
    pub fn meshing(details: impl Into<String>, exit_code: Option<i32>) -> Self {
        StackError::Meshing {
            details: details.into(),
            exit_code,
        }
    }

    /// Create a Geometry error.
    pub fn geometry(layer: Option<usize>, details: impl Into<String>) -> Self {
        StackError::Geometry {
            layer,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StackError::EmptyStack;
        assert_eq!(err.code(), ErrorCode::EmptyStack);
        assert_eq!(err.code().as_str(), "CYL-1002");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kinds_follow_code_ranges() {
        let errors = [
            StackError::geometry(Some(1), "bad extrude"),
            StackError::meshing("degenerate tetrahedron", Some(1)),
            StackError::io_write("out/mesh.geo", std::io::Error::other("denied")),
        ];
        let kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::Geometry, ErrorKind::Meshing, ErrorKind::Io]);
        assert!(errors[0].code().as_str().starts_with("CYL-2"));
        assert!(errors[1].code().as_str().starts_with("CYL-3"));
        assert!(errors[2].code().as_str().starts_with("CYL-4"));
    }

    #[test]
    fn test_geometry_display_mentions_layer() {
        let err = StackError::geometry(Some(2), "extrusion failed");
        assert_eq!(
            err.to_string(),
            "geometry construction failed in layer 3: extrusion failed"
        );
        assert_eq!(err.layer(), Some(2));

        let err = StackError::geometry(None, "extrusion failed");
        assert_eq!(err.to_string(), "geometry construction failed: extrusion failed");
    }

    #[test]
    fn test_meshing_display_with_exit_code() {
        let err = StackError::meshing("no elements", Some(3));
        assert_eq!(err.to_string(), "meshing failed (exit code 3): no elements");
    }

    #[test]
    fn test_collision_suggestion() {
        let err = StackError::NamingCollision {
            name: "FM1".into(),
            first: 0,
            second: 1,
        };
        assert_eq!(
            err.recovery_suggestion(),
            RecoverySuggestion::RenameLayers {
                duplicate: "FM1".into()
            }
        );
        assert!(err.recovery_suggestion().to_string().contains("'FM1'"));
    }

    #[test]
    fn test_path_accessor() {
        let err = StackError::io_read("cfg.json", std::io::Error::other("missing"));
        assert_eq!(err.path(), Some(std::path::Path::new("cfg.json")));
        assert!(StackError::EmptyStack.path().is_none());
    }
}
