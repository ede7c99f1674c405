//! Mesh generation entry points.
//!
//! Every entry point runs the same sequence: validate the parameters, write
//! the geometry script, then (unless only geometry was requested) hand the
//! script to an engine session and summarize what it produced. Validation
//! happens before any engine call; failures at any later stage are reported
//! in the returned [`MeshResult`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::StackConfig;
use crate::engine::{EngineSession, GmshCli, MeshEngine, MeshRequest, RunMode};
use crate::error::{StackError, StackResult};
use crate::geo::GeoScript;
use crate::progress::{ProgressCallback, Stage, StageReporter};
use crate::stack::{StackParameters, StackSpec};
use crate::summary::{MeshResult, RawOutput, summarize};
use crate::tracing_ext::{OperationTimer, log_io_operation, log_stack};

/// Where to write artifacts and how to run the engine.
#[derive(Clone)]
pub struct MeshOptions {
    /// Geometry script path.
    pub geo_file: PathBuf,
    /// Mesh file path.
    pub mesh_file: PathBuf,
    /// Batch, geometry-only or interactive.
    pub mode: RunMode,
    /// Let the engine print its own output.
    pub verbose: bool,
    /// Invoked as each generation stage begins.
    pub progress: Option<ProgressCallback>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self::new("mesh")
    }
}

impl std::fmt::Debug for MeshOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshOptions")
            .field("geo_file", &self.geo_file)
            .field("mesh_file", &self.mesh_file)
            .field("mode", &self.mode)
            .field("verbose", &self.verbose)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl MeshOptions {
    /// Write `<output>.geo` and `<output>.msh`, batch mode.
    pub fn new(output: impl AsRef<Path>) -> Self {
        let output = output.as_ref();
        Self::with_files(with_suffix(output, ".geo"), with_suffix(output, ".msh"))
    }

    /// Use explicit artifact paths, batch mode.
    pub fn with_files(geo_file: impl Into<PathBuf>, mesh_file: impl Into<PathBuf>) -> Self {
        Self {
            geo_file: geo_file.into(),
            mesh_file: mesh_file.into(),
            mode: RunMode::Batch,
            verbose: false,
            progress: None,
        }
    }

    /// Set the run mode.
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Only write the geometry script.
    pub fn geometry_only(self) -> Self {
        self.mode(RunMode::GeometryOnly)
    }

    /// Open the engine GUI instead of meshing in batch.
    pub fn interactive(self) -> Self {
        self.mode(RunMode::Interactive)
    }

    /// Enable engine output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

/// Append `suffix` to the file name without replacing an existing extension.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Generate a mesh with the `gmsh` executable found on `PATH`.
pub fn create_mesh(params: &StackParameters, options: &MeshOptions) -> MeshResult {
    create_mesh_with(GmshCli::default(), params, options)
}

/// Generate a mesh with the given engine.
///
/// The engine is only initialized after the parameters validated and the
/// geometry script was written, and it is finalized before returning.
pub fn create_mesh_with<E: MeshEngine>(
    engine: E,
    params: &StackParameters,
    options: &MeshOptions,
) -> MeshResult {
    let timer = OperationTimer::with_layers("create_mesh", params.num_layers());
    let _entered = timer.span().enter();
    let reporter = StageReporter::new(options.progress.as_ref());

    let prepared = match prepare(params, options, &reporter) {
        Ok(prepared) => prepared,
        Err(err) => return finish(MeshResult::failure(params, options.mode, err)),
    };
    if options.mode == RunMode::GeometryOnly {
        return finish(geometry_only(params, options, &reporter));
    }

    reporter.enter(Stage::StartEngine);
    match EngineSession::open(engine) {
        Ok(mut session) => finish(run_engine(&mut session, &prepared, params, options, &reporter)),
        Err(err) => finish(summarize(
            RawOutput {
                mode: options.mode,
                geo_file: Some(options.geo_file.clone()),
                mesh: None,
                error: Some(err),
            },
            params,
        )),
    }
}

impl<E: MeshEngine> EngineSession<E> {
    /// Generate a mesh with this session's engine.
    ///
    /// Unlike [`create_mesh_with`], the engine stays initialized afterwards
    /// and can serve further calls.
    pub fn create_mesh(&mut self, params: &StackParameters, options: &MeshOptions) -> MeshResult {
        let timer = OperationTimer::with_layers("create_mesh", params.num_layers());
        let _entered = timer.span().enter();
        let reporter = StageReporter::new(options.progress.as_ref());

        let prepared = match prepare(params, options, &reporter) {
            Ok(prepared) => prepared,
            Err(err) => return finish(MeshResult::failure(params, options.mode, err)),
        };
        if options.mode == RunMode::GeometryOnly {
            return finish(geometry_only(params, options, &reporter));
        }
        finish(run_engine(self, &prepared, params, options, &reporter))
    }
}

/// Generate a mesh from a config file with the `gmsh` executable.
///
/// Keys set in `overrides` take precedence over the file. An unreadable or
/// malformed file and a missing required key are reported like any other
/// failure, in a [`MeshResult`] whose `parameters` is `None`.
pub fn create_mesh_from_config(
    path: impl AsRef<Path>,
    overrides: &StackConfig,
    options: &MeshOptions,
) -> MeshResult {
    create_mesh_from_config_with(GmshCli::default(), path, overrides, options)
}

/// [`create_mesh_from_config`] with the given engine.
pub fn create_mesh_from_config_with<E: MeshEngine>(
    engine: E,
    path: impl AsRef<Path>,
    overrides: &StackConfig,
    options: &MeshOptions,
) -> MeshResult {
    let timer = OperationTimer::new("create_mesh_from_config");
    let _entered = timer.span().enter();
    let loaded = StackConfig::load(path)
        .and_then(|config| config.merge(overrides.clone()).into_parameters());
    match loaded {
        Ok(params) => create_mesh_with(engine, &params, options),
        Err(err) => finish(MeshResult::without_parameters(options.mode, err)),
    }
}

/// A validated stack whose script is on disk.
struct Prepared {
    script: GeoScript,
}

fn prepare(
    params: &StackParameters,
    options: &MeshOptions,
    reporter: &StageReporter<'_>,
) -> StackResult<Prepared> {
    reporter.enter(Stage::Validate);
    let spec = StackSpec::from_parameters(params)?;
    log_stack(&spec);

    reporter.enter(Stage::WriteGeometry);
    let script = GeoScript::new(&spec);
    write_script(&options.geo_file, &script)?;
    Ok(Prepared { script })
}

fn write_script(path: &Path, script: &GeoScript) -> StackResult<()> {
    let result = create_parent(path).and_then(|()| {
        std::fs::write(path, script.as_str()).map_err(|e| StackError::io_write(path, e))
    });
    log_io_operation("write geometry", path, Some(script.len() as u64), result.is_ok());
    result
}

fn create_parent(path: &Path) -> StackResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| StackError::io_write(dir, e))
        }
        _ => Ok(()),
    }
}

fn geometry_only(
    params: &StackParameters,
    options: &MeshOptions,
    reporter: &StageReporter<'_>,
) -> MeshResult {
    info!(geo = %options.geo_file.display(), "Geometry written; engine not run");
    reporter.enter(Stage::Summarize);
    summarize(
        RawOutput {
            mode: RunMode::GeometryOnly,
            geo_file: Some(options.geo_file.clone()),
            ..RawOutput::default()
        },
        params,
    )
}

fn run_engine<E: MeshEngine>(
    session: &mut EngineSession<E>,
    prepared: &Prepared,
    params: &StackParameters,
    options: &MeshOptions,
    reporter: &StageReporter<'_>,
) -> MeshResult {
    reporter.enter(Stage::Mesh);
    let request = MeshRequest {
        script: &prepared.script,
        geo_path: &options.geo_file,
        mesh_path: &options.mesh_file,
        mode: options.mode,
        verbose: options.verbose,
    };
    let (mesh, error) = match session.mesh(&request) {
        Ok(mesh) => (Some(mesh), None),
        Err(err) => (None, Some(err)),
    };

    reporter.enter(Stage::Summarize);
    summarize(
        RawOutput {
            mode: options.mode,
            geo_file: Some(options.geo_file.clone()),
            mesh,
            error,
        },
        params,
    )
}

fn finish(result: MeshResult) -> MeshResult {
    match &result.error {
        None if result.success => info!(
            mode = ?result.mode,
            vertices = result.num_vertices,
            elements = result.num_elements,
            groups = result.physical_groups.len(),
            "Mesh generation finished"
        ),
        None => warn!(mode = ?result.mode, "Engine produced no elements"),
        Some(err) => warn!(code = %err.code, kind = %err.kind, "{}", err.message),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_output_name() {
        let options = MeshOptions::new("out/stack.v2");
        assert_eq!(options.geo_file, PathBuf::from("out/stack.v2.geo"));
        assert_eq!(options.mesh_file, PathBuf::from("out/stack.v2.msh"));
        assert_eq!(options.mode, RunMode::Batch);

        let options = MeshOptions::default().geometry_only().verbose(true);
        assert_eq!(options.geo_file, PathBuf::from("mesh.geo"));
        assert_eq!(options.mode, RunMode::GeometryOnly);
        assert!(options.verbose);
    }

    #[test]
    fn test_options_debug_hides_callback() {
        let options = MeshOptions::default().with_progress(std::sync::Arc::new(|_: &crate::progress::Progress| {}));
        let text = format!("{options:?}");
        assert!(text.contains("progress: true"));
    }
}
