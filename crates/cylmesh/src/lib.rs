//! Meshes for cylindrical multilayer stacks.
//!
//! A stack is a cylinder of fixed radius made of layers stacked along `z`.
//! This crate validates the stack, assigns every layer a named volume and
//! every interface a named surface, writes a Gmsh geometry script, and drives
//! Gmsh to produce the mesh.
//!
//! # Features
//!
//! - **Deterministic naming**: `n` layers give `n` volumes and `n + 1`
//!   surfaces (`{name}_bottom`, `{name}_top`) with fixed tags
//! - **Fail-fast validation**: malformed stacks and name collisions are
//!   rejected before the engine is started
//! - **Pluggable engine**: [`MeshEngine`] trait with the `gmsh` executable as
//!   the default implementation
//! - **Config files**: JSON, TOML or YAML, with per-key overrides
//! - **Builder API**: [`MeshBuilder`] for chained configuration
//!
//! # Quick Start
//!
//! ```no_run
//! use cylmesh::{MeshOptions, StackParameters, create_mesh, render};
//!
//! let params = StackParameters::new(2.0, 10.0, vec![3.0, 2.0, 1.5])
//!     .with_names(["FM1", "MgO", "FM2"]);
//!
//! let result = create_mesh(&params, &MeshOptions::new("mtj"));
//! print!("{}", render(&result));
//! ```
//!
//! # Reusing an engine
//!
//! ```no_run
//! use cylmesh::{EngineSession, GmshCli, MeshOptions, StackParameters};
//!
//! let mut session = EngineSession::open(GmshCli::default())?;
//! for (i, radius) in [5.0, 10.0].into_iter().enumerate() {
//!     let params = StackParameters::new(1.0, radius, vec![1.0, 1.0]);
//!     let result = session.create_mesh(&params, &MeshOptions::new(format!("r{i}")));
//!     println!("{}: {} elements", radius, result.num_elements);
//! }
//! # Ok::<(), cylmesh::StackError>(())
//! ```

mod builder;
pub mod config;
pub mod engine;
mod error;
mod generate;
pub mod geo;
pub mod msh;
mod naming;
pub mod progress;
mod stack;
pub mod summary;
pub mod tracing_ext;

pub use error::{ErrorCode, ErrorKind, RecoverySuggestion, StackError, StackResult};

// Layer model and naming
pub use naming::{PhysicalNames, assign_names, volume_name};
pub use stack::{LayerSpec, Slot, StackParameters, StackSpec};

// Generation
pub use builder::MeshBuilder;
pub use config::{ConfigFormat, StackConfig};
pub use engine::{EngineSession, GmshCli, MeshEngine, MeshRequest, RawMesh, RunMode};
pub use generate::{
    MeshOptions, create_mesh, create_mesh_from_config, create_mesh_from_config_with,
    create_mesh_with,
};
pub use geo::GeoScript;

// Results
pub use summary::{ErrorReport, GroupInfo, GroupKind, MeshResult, PhysicalGroup, render, summarize};
