//! cylmesh: generate meshes for cylindrical multilayer stacks from the command line.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=cylmesh=info` - Basic operation logging
//! - `RUST_LOG=cylmesh=debug` - Stack layout and engine details
//! - `RUST_LOG=cylmesh::timing=debug` - Performance timing
//!
//! # Example
//!
//! ```bash
//! # Three named layers, 10 units radius
//! cylmesh --ml 2 --radius 10 --layers 3 2 1.5 --layer-names FM1 MgO FM2
//!
//! # Parameters from a file, radius overridden, geometry only
//! cylmesh --config stack.json --radius 5 --no-run
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use cylmesh::progress::Progress;
use cylmesh::{MeshOptions, RunMode, StackConfig, StackError, StackSpec, create_mesh, render};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod output;

/// Generate Gmsh meshes for cylindrical multilayer stacks.
#[derive(Parser)]
#[command(name = "cylmesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Characteristic mesh length
    #[arg(long, allow_negative_numbers = true)]
    ml: Option<f64>,

    /// Cylinder radius
    #[arg(long, allow_negative_numbers = true)]
    radius: Option<f64>,

    /// Layer thicknesses, bottom to top
    #[arg(long, num_args = 1.., allow_negative_numbers = true)]
    layers: Option<Vec<f64>>,

    /// Layer names, one per layer
    #[arg(long, num_args = 1..)]
    layer_names: Option<Vec<String>>,

    /// Vertical subdivisions, one per layer
    #[arg(long, num_args = 1..)]
    subdivisions: Option<Vec<u32>>,

    /// JSON, TOML or YAML file with stack parameters; command-line values win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output mesh file
    #[arg(long, default_value = "mesh.msh")]
    mesh: PathBuf,

    /// Output geometry script
    #[arg(long, default_value = "mesh.geo")]
    geo: PathBuf,

    /// Only write the geometry script
    #[arg(long, conflicts_with = "gui")]
    no_run: bool,

    /// Open the Gmsh GUI on the geometry
    #[arg(long)]
    gui: bool,

    /// Write the merged parameters to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,

    /// Increase verbosity (-v engine output and info logs, -vv debug logs)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON for scripting
    Json,
}

impl Cli {
    /// Parameters given on the command line.
    fn overrides(&self) -> StackConfig {
        StackConfig {
            ml: self.ml,
            radius: self.radius,
            layers: self.layers.clone(),
            layer_names: self
                .layer_names
                .as_ref()
                .map(|names| names.iter().cloned().map(Some).collect()),
            subdivisions: self
                .subdivisions
                .as_ref()
                .map(|subs| subs.iter().copied().map(Some).collect()),
        }
    }

    fn mode(&self) -> RunMode {
        if self.no_run {
            RunMode::GeometryOnly
        } else if self.gui {
            RunMode::Interactive
        } else {
            RunMode::Batch
        }
    }
}

#[derive(Serialize)]
struct SavedConfig<'a> {
    config: &'a std::path::Path,
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "cylmesh=info",
            2 => "cylmesh=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

/// Returns whether generation succeeded.
fn run(cli: &Cli) -> Result<bool> {
    let overrides = cli.overrides();
    let config = match &cli.config {
        Some(path) => {
            output::info(&format!("Loading {}", path.display()), cli.format, cli.quiet);
            StackConfig::load(path)?.merge(overrides)
        }
        None => overrides,
    };

    if let Some(path) = &cli.save_config {
        // Only complete, valid stacks are saved.
        let params = config.clone().into_parameters()?;
        StackSpec::from_parameters(&params)?;
        config.save(path)?;
        output::print(&SavedConfig { config: path }, cli.format, cli.quiet);
        output::success(
            &format!("Configuration saved to {}", path.display()),
            cli.format,
            cli.quiet,
        );
        return Ok(true);
    }

    let params = config.into_parameters()?;
    tracing::debug!(?params, "Merged parameters");
    let mut options = MeshOptions::with_files(&cli.geo, &cli.mesh)
        .mode(cli.mode())
        .verbose(cli.verbose > 0);
    if cli.verbose > 0 && !cli.quiet && matches!(cli.format, OutputFormat::Text) {
        options = options.with_progress(Arc::new(|p: &Progress| {
            eprintln!("{} [{}/{}] {}", "→".blue(), p.current + 1, p.total, p.message);
        }));
    }
    if cli.mode() == RunMode::Interactive {
        output::info(
            "Opening Gmsh; close the window to continue",
            cli.format,
            cli.quiet,
        );
    }

    let result = create_mesh(&params, &options);

    match cli.format {
        OutputFormat::Json => output::print(&result, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print!("{}", render(&result));
            } else if let Some(err) = &result.error {
                eprintln!("{}: [{}] {}", "Error".red().bold(), err.code, err.message);
            }
            if result.success && result.mode == RunMode::Interactive && result.mesh_file.is_none() {
                output::warn("No mesh was saved from the GUI", cli.format, cli.quiet);
            }
        }
    }

    Ok(result.success)
}

fn main() -> Result<()> {
    // Install miette's panic hook for better error display
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if let Some(stack_err) = e.downcast_ref::<StackError>() {
                eprintln!("{}: {}", "Error".red().bold(), stack_err);
                eprintln!("  {}: {}", "Code".cyan(), stack_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    stack_err.recovery_suggestion()
                );
                if let Some(path) = stack_err.path() {
                    eprintln!("  {}: {}", "File".yellow(), path.display());
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
            }
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {}", "Caused by".yellow(), cause);
            }
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cylmesh").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--ml", "2", "--radius", "10", "--layers", "3", "2"]);
        assert_eq!(cli.mesh, PathBuf::from("mesh.msh"));
        assert_eq!(cli.geo, PathBuf::from("mesh.geo"));
        assert_eq!(cli.mode(), RunMode::Batch);
        assert_eq!(cli.verbose, 0);

        let params = cli.overrides().into_parameters().unwrap();
        assert_eq!(params.layers, vec![3.0, 2.0]);
        assert!(params.layer_names.is_none());
    }

    #[test]
    fn test_list_arguments() {
        let cli = parse(&[
            "--layers",
            "3",
            "2",
            "1.5",
            "--layer-names",
            "FM1",
            "MgO",
            "FM2",
            "--subdivisions",
            "2",
            "1",
            "2",
        ]);
        let overrides = cli.overrides();
        assert_eq!(
            overrides.layer_names,
            Some(vec![Some("FM1".into()), Some("MgO".into()), Some("FM2".into())])
        );
        assert_eq!(overrides.subdivisions, Some(vec![Some(2), Some(1), Some(2)]));
        assert!(overrides.ml.is_none());
    }

    #[test]
    fn test_modes() {
        assert_eq!(parse(&["--no-run"]).mode(), RunMode::GeometryOnly);
        assert_eq!(parse(&["--gui"]).mode(), RunMode::Interactive);
        assert!(Cli::try_parse_from(["cylmesh", "--gui", "--no-run"]).is_err());
    }

    #[test]
    fn test_verbose_count() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose", "--verbose"]).verbose, 3);
    }

    #[test]
    fn test_save_config_merges_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("stack.json");
        std::fs::write(&source, r#"{"ml": 2.0, "radius": 10.0, "layers": [1.0, 2.0]}"#).unwrap();
        let target = dir.path().join("out.toml");

        let cli = parse(&[
            "--config",
            source.to_str().unwrap(),
            "--radius",
            "4",
            "--save-config",
            target.to_str().unwrap(),
            "--quiet",
        ]);
        assert!(run(&cli).unwrap());

        let saved = StackConfig::load(&target).unwrap().into_parameters().unwrap();
        assert_eq!(saved.ml, 2.0);
        assert_eq!(saved.radius, 4.0);
        assert_eq!(saved.layers, vec![1.0, 2.0]);
    }

    #[test]
    fn test_save_config_rejects_invalid_stack() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.json");
        let target_arg = target.to_str().unwrap();

        // Missing ml.
        let cli = parse(&["--radius", "3", "--layers", "1", "--save-config", target_arg, "-q"]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.downcast_ref::<StackError>().unwrap().code().as_str(), "CYL-1007");

        let cli = parse(&[
            "--ml",
            "1",
            "--radius",
            "0",
            "--layers",
            "1",
            "--save-config",
            target_arg,
            "-q",
        ]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.downcast_ref::<StackError>().unwrap().code().as_str(), "CYL-1001");

        let cli = parse(&[
            "--ml",
            "1",
            "--radius",
            "2",
            "--layers",
            "1",
            "--layer-names",
            "A",
            "A",
            "B",
            "--save-config",
            target_arg,
            "-q",
        ]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.downcast_ref::<StackError>().unwrap().code().as_str(), "CYL-1003");

        assert!(!target.exists());
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let dir = tempfile::tempdir().unwrap();
        let geo = dir.path().join("mesh.geo");
        let cli = parse(&[
            "--ml",
            "1",
            "--radius",
            "-3",
            "--layers",
            "1",
            "-0.5",
            "--geo",
            geo.to_str().unwrap(),
            "--no-run",
            "-q",
        ]);
        assert_eq!(cli.radius, Some(-3.0));
        assert_eq!(cli.layers, Some(vec![1.0, -0.5]));

        let result = create_mesh(
            &cli.overrides().into_parameters().unwrap(),
            &MeshOptions::with_files(&cli.geo, &cli.mesh).mode(cli.mode()),
        );
        assert_eq!(result.error.unwrap().code, "CYL-1001");
        assert!(!run(&cli).unwrap());
        assert!(!geo.exists());
    }

    #[test]
    fn test_missing_parameter_is_error() {
        let cli = parse(&["--ml", "1", "--layers", "1", "--quiet"]);
        let err = run(&cli).unwrap_err();
        let stack_err = err.downcast_ref::<StackError>().unwrap();
        assert_eq!(stack_err.code().as_str(), "CYL-1007");
    }

    #[test]
    fn test_validation_failure_exits_unsuccessfully() {
        let dir = tempfile::tempdir().unwrap();
        let geo = dir.path().join("mesh.geo");
        let cli = parse(&[
            "--ml",
            "1",
            "--radius",
            "5",
            "--layers",
            "1",
            "1",
            "--layer-names",
            "FM1",
            "FM1",
            "--geo",
            geo.to_str().unwrap(),
            "--no-run",
            "--quiet",
        ]);
        assert!(!run(&cli).unwrap());
        assert!(!geo.exists());
    }
}
