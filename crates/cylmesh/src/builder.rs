//! Fluent builder for mesh generation.
//!
//! # Example
//!
//! ```no_run
//! use cylmesh::MeshBuilder;
//!
//! let result = MeshBuilder::new()
//!     .radius(10.0)
//!     .mesh_length(2.0)
//!     .add_named_layer("FM1", 3.0)
//!     .add_named_layer("MgO", 2.0)
//!     .add_named_layer("FM2", 1.5)
//!     .output("mtj")
//!     .build();
//!
//! assert!(result.success);
//! ```

use std::path::{Path, PathBuf};

use crate::config::StackConfig;
use crate::engine::{GmshCli, MeshEngine, RunMode};
use crate::error::{StackError, StackResult};
use crate::generate::{MeshOptions, create_mesh_with};
use crate::progress::ProgressCallback;
use crate::stack::{LayerSpec, StackParameters};
use crate::summary::MeshResult;

/// Fluent builder for a layered cylinder mesh.
///
/// Layers are stacked bottom to top in the order they are added.
pub struct MeshBuilder {
    radius: Option<f64>,
    mesh_length: Option<f64>,
    layers: Vec<LayerSpec>,
    output: PathBuf,
    mode: RunMode,
    verbose: bool,
    progress: Option<ProgressCallback>,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    /// Start an empty stack writing `mesh.geo` / `mesh.msh`.
    pub fn new() -> Self {
        Self {
            radius: None,
            mesh_length: None,
            layers: Vec::new(),
            output: PathBuf::from("mesh"),
            mode: RunMode::Batch,
            verbose: false,
            progress: None,
        }
    }

    /// Cylinder radius.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Characteristic mesh length.
    pub fn mesh_length(mut self, mesh_length: f64) -> Self {
        self.mesh_length = Some(mesh_length);
        self
    }

    /// Append a fully specified layer.
    pub fn layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    /// Append an unnamed layer.
    pub fn add_layer(self, thickness: f64) -> Self {
        self.layer(LayerSpec::new(thickness))
    }

    /// Append a named layer.
    pub fn add_named_layer(self, name: impl Into<String>, thickness: f64) -> Self {
        self.layer(LayerSpec::new(thickness).named(name))
    }

    /// Base name for the `.geo` and `.msh` files.
    pub fn output(mut self, base: impl AsRef<Path>) -> Self {
        self.output = base.as_ref().to_path_buf();
        self
    }

    /// Only write the geometry script.
    pub fn geometry_only(mut self) -> Self {
        self.mode = RunMode::GeometryOnly;
        self
    }

    /// Open the engine GUI.
    pub fn interactive(mut self) -> Self {
        self.mode = RunMode::Interactive;
        self
    }

    /// Enable engine output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Attach a progress callback.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The stack as parameters. Fails if radius or mesh length is unset.
    pub fn parameters(&self) -> StackResult<StackParameters> {
        let ml = self
            .mesh_length
            .ok_or(StackError::MissingParameter { parameter: "ml" })?;
        let radius = self
            .radius
            .ok_or(StackError::MissingParameter { parameter: "radius" })?;

        let names: Vec<Option<String>> = self
            .layers
            .iter()
            .map(|l| l.name.specified().cloned())
            .collect();
        let subdivisions: Vec<Option<u32>> = self
            .layers
            .iter()
            .map(|l| l.subdivisions.specified().copied())
            .collect();

        Ok(StackParameters {
            ml,
            radius,
            layers: self.layers.iter().map(|l| l.thickness).collect(),
            layer_names: names.iter().any(Option::is_some).then_some(names),
            subdivisions: subdivisions.iter().any(Option::is_some).then_some(subdivisions),
        })
    }

    /// Generation options implied by the builder.
    pub fn options(&self) -> MeshOptions {
        let mut options = MeshOptions::new(&self.output)
            .mode(self.mode)
            .verbose(self.verbose);
        options.progress = self.progress.clone();
        options
    }

    /// Write the stack as a config file.
    pub fn save_config(&self, path: impl AsRef<Path>) -> StackResult<()> {
        StackConfig::from(self.parameters()?).save(path)
    }

    /// Generate with the `gmsh` executable.
    pub fn build(self) -> MeshResult {
        self.build_with(GmshCli::default())
    }

    /// Generate with the given engine.
    pub fn build_with<E: MeshEngine>(self, engine: E) -> MeshResult {
        let options = self.options();
        match self.parameters() {
            Ok(params) => create_mesh_with(engine, &params, &options),
            Err(err) => MeshResult::without_parameters(options.mode, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_from_layers() {
        let params = MeshBuilder::new()
            .radius(10.0)
            .mesh_length(2.0)
            .add_named_layer("FM1", 3.0)
            .add_layer(2.0)
            .layer(LayerSpec::new(1.5).named("FM2").subdivided(3))
            .parameters()
            .unwrap();

        assert_eq!(params.layers, vec![3.0, 2.0, 1.5]);
        assert_eq!(
            params.layer_names,
            Some(vec![Some("FM1".into()), None, Some("FM2".into())])
        );
        assert_eq!(params.subdivisions, Some(vec![None, None, Some(3)]));
    }

    #[test]
    fn test_defaults_omit_lists() {
        let params = MeshBuilder::new()
            .radius(1.0)
            .mesh_length(0.5)
            .add_layer(1.0)
            .parameters()
            .unwrap();
        assert!(params.layer_names.is_none());
        assert!(params.subdivisions.is_none());
    }

    #[test]
    fn test_missing_radius() {
        let err = MeshBuilder::new().mesh_length(1.0).add_layer(1.0).parameters().unwrap_err();
        assert!(matches!(err, StackError::MissingParameter { parameter: "radius" }));
    }

    #[test]
    fn test_options() {
        let options = MeshBuilder::new().output("out/stack").geometry_only().options();
        assert_eq!(options.geo_file, PathBuf::from("out/stack.geo"));
        assert_eq!(options.mesh_file, PathBuf::from("out/stack.msh"));
        assert_eq!(options.mode, RunMode::GeometryOnly);
    }
}
