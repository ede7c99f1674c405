//! The external meshing engine.
//!
//! [`MeshEngine`] is the seam between this crate and the program that actually
//! builds and meshes the geometry. [`GmshCli`] drives the `gmsh` executable;
//! tests substitute scripted engines.
//!
//! Engines are used through an [`EngineSession`], which initializes the engine
//! when opened and finalizes it when dropped, on success and failure alike.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, info, warn};

use crate::error::{StackError, StackResult};
use crate::geo::GeoScript;
use crate::msh::{RawGroup, read_msh_stats};

/// How the engine should be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Mesh in batch mode and write the mesh file.
    #[default]
    Batch,
    /// Only write the geometry script; the engine is not started.
    GeometryOnly,
    /// Open the engine's interactive GUI on the geometry script and wait for it
    /// to close. A mesh file is only present if the user saved one.
    Interactive,
}

/// One meshing job handed to an engine.
#[derive(Debug, Clone, Copy)]
pub struct MeshRequest<'a> {
    /// Script that was written to `geo_path`.
    pub script: &'a GeoScript,
    /// Geometry script on disk.
    pub geo_path: &'a Path,
    /// Where the mesh should be written.
    pub mesh_path: &'a Path,
    /// Batch or interactive. Never [`RunMode::GeometryOnly`].
    pub mode: RunMode,
    /// Let the engine print its own progress output.
    pub verbose: bool,
}

/// Raw output of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawMesh {
    /// Mesh file, if the engine produced one.
    pub mesh_file: Option<PathBuf>,
    /// Number of mesh nodes.
    pub num_vertices: usize,
    /// Number of elements of all dimensions.
    pub num_elements: usize,
    /// Physical groups as resolved by the engine.
    pub groups: Vec<RawGroup>,
}

/// An external geometry/meshing engine.
pub trait MeshEngine {
    /// Short engine name for messages.
    fn name(&self) -> &str;

    /// Prepare the engine for use and return its version string.
    fn initialize(&mut self) -> StackResult<String>;

    /// Build and mesh the geometry described by `request`.
    fn mesh(&mut self, request: &MeshRequest<'_>) -> StackResult<RawMesh>;

    /// Release engine resources. Called exactly once per successful
    /// [`initialize`](MeshEngine::initialize).
    fn finalize(&mut self) {}
}

impl<E: MeshEngine + ?Sized> MeshEngine for &mut E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize(&mut self) -> StackResult<String> {
        (**self).initialize()
    }

    fn mesh(&mut self, request: &MeshRequest<'_>) -> StackResult<RawMesh> {
        (**self).mesh(request)
    }

    fn finalize(&mut self) {
        (**self).finalize()
    }
}

/// An initialized engine, finalized on drop.
///
/// A session may serve any number of generation calls through
/// [`create_mesh`](Self::create_mesh).
pub struct EngineSession<E: MeshEngine> {
    engine: E,
    version: String,
}

impl<E: MeshEngine> EngineSession<E> {
    /// Initialize `engine` and wrap it in a session.
    pub fn open(mut engine: E) -> StackResult<Self> {
        let version = engine.initialize()?;
        info!(engine = engine.name(), version = %version, "Engine session opened");
        Ok(Self { engine, version })
    }

    /// Version string reported by the engine.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Engine name.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run one meshing job.
    pub fn mesh(&mut self, request: &MeshRequest<'_>) -> StackResult<RawMesh> {
        self.engine.mesh(request)
    }
}

impl<E: MeshEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.engine.finalize();
        debug!(engine = self.engine.name(), "Engine session closed");
    }
}

impl<E: MeshEngine> std::fmt::Debug for EngineSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("engine", &self.engine.name())
            .field("version", &self.version)
            .finish()
    }
}

/// The `gmsh` command-line executable.
#[derive(Debug, Clone)]
pub struct GmshCli {
    program: PathBuf,
}

impl Default for GmshCli {
    fn default() -> Self {
        Self::new("gmsh")
    }
}

impl GmshCli {
    /// Use the given executable (a bare name is looked up on `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this engine runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn unavailable(&self, details: impl Into<String>) -> StackError {
        StackError::EngineUnavailable {
            engine: self.program.display().to_string(),
            details: details.into(),
        }
    }

    fn batch_args(request: &MeshRequest<'_>) -> Vec<String> {
        vec![
            request.geo_path.display().to_string(),
            "-3".into(),
            "-o".into(),
            request.mesh_path.display().to_string(),
            "-v".into(),
            if request.verbose { "2" } else { "1" }.into(),
        ]
    }
}

impl MeshEngine for GmshCli {
    fn name(&self) -> &str {
        "gmsh"
    }

    fn initialize(&mut self) -> StackResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(self.unavailable(format!(
                "`--version` exited with {}",
                output.status
            )));
        }
        // Gmsh prints its version on stderr in some releases.
        let text = if output.stdout.is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        let version = String::from_utf8_lossy(text)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(format!("Gmsh {}", version))
    }

    fn mesh(&mut self, request: &MeshRequest<'_>) -> StackResult<RawMesh> {
        let mut cmd = Command::new(&self.program);
        match request.mode {
            RunMode::Interactive => {
                cmd.arg(request.geo_path);
            }
            RunMode::Batch => {
                cmd.args(Self::batch_args(request));
            }
            RunMode::GeometryOnly => {
                return Err(StackError::meshing(
                    "engine invoked in geometry-only mode",
                    None,
                ));
            }
        }
        ensure_parent(request.mesh_path)?;
        remove_stale(request.mesh_path)?;
        info!(command = ?cmd, "Running engine");

        let run = if request.verbose || request.mode == RunMode::Interactive {
            // Inherit stdout so the user sees engine progress, keep stderr for diagnosis.
            cmd.stdout(Stdio::inherit())
                .stderr(Stdio::piped())
                .spawn()
                .and_then(|child| child.wait_with_output())
        } else {
            cmd.output()
        };
        let output = run.map_err(|e| self.unavailable(e.to_string()))?;

        check_output(&output, request.script)?;

        if !request.mesh_path.exists() {
            if request.mode == RunMode::Interactive {
                info!("No mesh saved from the interactive session");
                return Ok(RawMesh::default());
            }
            return Err(StackError::meshing(
                format!("mesh file {} was not created", request.mesh_path.display()),
                output.status.code(),
            ));
        }

        let stats = read_msh_stats(request.mesh_path)?;
        Ok(RawMesh {
            mesh_file: Some(request.mesh_path.to_path_buf()),
            num_vertices: stats.num_vertices,
            num_elements: stats.num_elements,
            groups: stats.groups,
        })
    }
}

fn ensure_parent(path: &Path) -> StackResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| StackError::io_write(dir, e))
        }
        _ => Ok(()),
    }
}

/// Remove a mesh left over from an earlier run.
fn remove_stale(path: &Path) -> StackResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed previous mesh file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StackError::io_write(path, e)),
    }
}

/// Turn engine diagnostics into a geometry or meshing error.
fn check_output(output: &Output, script: &GeoScript) -> StackResult<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let errors: Vec<&str> = stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .filter(|l| l.starts_with("Error"))
        .collect();

    for line in stderr.lines().chain(stdout.lines()) {
        if line.trim_start().starts_with("Warning") {
            warn!(target: "cylmesh::engine", "{}", line.trim());
        }
    }

    if output.status.success() && errors.is_empty() {
        return Ok(());
    }

    let details = if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("; ")
    };
    Err(classify_failure(&errors, details, output.status.code(), script))
}

/// Geometry errors reference the script (by line) or a geometry operation;
/// anything else is a meshing failure.
fn classify_failure(
    errors: &[&str],
    details: String,
    exit_code: Option<i32>,
    script: &GeoScript,
) -> StackError {
    let line = errors.iter().find_map(|e| script_line(e));
    if let Some(line) = line {
        return StackError::geometry(script.layer_at_line(line), details);
    }

    const GEOMETRY_HINTS: [&str; 5] = ["syntax error", "extrude", "curve loop", "unknown", "geometry"];
    let is_geometry = errors.iter().any(|e| {
        let lower = e.to_lowercase();
        GEOMETRY_HINTS.iter().any(|hint| lower.contains(hint)) && !lower.contains("mesh")
    });
    if is_geometry {
        StackError::geometry(None, details)
    } else {
        StackError::meshing(details, exit_code)
    }
}

/// Extract `N` from the `line N` part of a Gmsh parser message.
fn script_line(message: &str) -> Option<usize> {
    let (_, after) = message.split_once("line ")?;
    let digits: String = after.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
