//! Tests for the `gmsh` command-line driver against stand-in executables.
//!
//! Each test writes a small shell script that mimics the parts of the Gmsh
//! command line the driver relies on.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cylmesh::{
    EngineSession, ErrorKind, GmshCli, MeshEngine, MeshOptions, StackParameters, create_mesh_with,
};
use tempfile::{TempDir, tempdir};

const MSH: &str = r#"$MeshFormat
4.1 0 8
$EndMeshFormat
$PhysicalNames
3
2 1 "FM1_bottom"
2 2 "FM1_top"
3 3 "FM1"
$EndPhysicalNames
$Nodes
1 40 1 40
$EndNodes
$Elements
2 96 1 96
$EndElements
"#;

/// Write an executable script named `gmsh` into `dir`.
fn fake_gmsh(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("gmsh");
    std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stand-in that answers `--version` and writes `MSH` to the `-o` argument.
fn meshing_gmsh(dir: &TempDir) -> PathBuf {
    let body = format!(
        "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; exit 0; fi\n\
         cat > \"$4\" <<'EOF'\n{}EOF\n",
        MSH
    );
    fake_gmsh(dir, &body)
}

fn one_layer() -> StackParameters {
    StackParameters::new(1.0, 5.0, vec![2.0]).with_names(["FM1"])
}

fn line_of(path: &Path, needle: &str) -> usize {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .position(|l| l.contains(needle))
        .unwrap()
        + 1
}

#[test]
fn test_version_reported() {
    let dir = tempdir().unwrap();
    let mut engine = GmshCli::new(meshing_gmsh(&dir));
    assert_eq!(engine.initialize().unwrap(), "Gmsh 4.11.1");
}

#[test]
fn test_batch_mesh() {
    let dir = tempdir().unwrap();
    let engine = GmshCli::new(meshing_gmsh(&dir));
    let options = MeshOptions::new(dir.path().join("out/stack"));

    let result = create_mesh_with(engine, &one_layer(), &options);

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.num_vertices, 40);
    assert_eq!(result.num_elements, 96);
    assert_eq!(result.physical_groups.len(), 3);
    assert_eq!(result.mesh_file.as_deref(), Some(options.mesh_file.as_path()));
}

#[test]
fn test_stale_mesh_is_not_reused() {
    let dir = tempdir().unwrap();
    let options = MeshOptions::new(dir.path().join("stack"));
    std::fs::write(&options.mesh_file, MSH).unwrap();
    // Succeeds without writing anything.
    let gmsh = fake_gmsh(&dir, "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; fi\nexit 0\n");

    let result = create_mesh_with(GmshCli::new(gmsh), &one_layer(), &options);

    assert!(!result.success);
    assert_eq!(result.error.unwrap().kind, ErrorKind::Meshing);
    assert!(!options.mesh_file.exists());
}

#[test]
fn test_interactive_ignores_previous_mesh() {
    let dir = tempdir().unwrap();
    let options = MeshOptions::new(dir.path().join("stack")).interactive();
    std::fs::write(&options.mesh_file, MSH).unwrap();
    // The user closes the GUI without saving.
    let gmsh = fake_gmsh(&dir, "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; fi\nexit 0\n");

    let result = create_mesh_with(GmshCli::new(gmsh), &one_layer(), &options);

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.num_elements, 0);
    assert!(result.mesh_file.is_none());
    assert!(result.physical_groups.is_empty());
    assert!(!options.mesh_file.exists());
}

#[test]
fn test_interactive_reads_mesh_saved_from_gui() {
    let dir = tempdir().unwrap();
    let options = MeshOptions::new(dir.path().join("stack")).interactive();
    let body = format!(
        "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; exit 0; fi\n\
         cat > \"{}\" <<'EOF'\n{}EOF\n",
        options.mesh_file.display(),
        MSH
    );
    let gmsh = fake_gmsh(&dir, &body);

    let result = create_mesh_with(GmshCli::new(gmsh), &one_layer(), &options);

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.num_elements, 96);
    assert_eq!(result.mesh_file.as_deref(), Some(options.mesh_file.as_path()));
}

#[test]
fn test_script_error_is_attributed_to_layer() {
    let dir = tempdir().unwrap();
    let params = StackParameters::new(1.0, 5.0, vec![1.0, 1.0]).with_names(["A", "B"]);
    let options = MeshOptions::new(dir.path().join("stack"));

    // Write the script first to find the line Gmsh would complain about.
    let mut session = EngineSession::open(GmshCli::new(meshing_gmsh(&dir))).unwrap();
    assert!(session.create_mesh(&params, &options.clone().geometry_only()).success);
    let line = line_of(&options.geo_file, "ex2[] = Extrude");
    drop(session);

    let gmsh = fake_gmsh(
        &dir,
        &format!(
            "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; exit 0; fi\n\
             echo \"Error   : '$1', line {} : Unknown surface\" >&2\nexit 1\n",
            line
        ),
    );

    let result = create_mesh_with(GmshCli::new(gmsh), &params, &options);

    let err = result.error.unwrap();
    assert_eq!(err.kind, ErrorKind::Geometry);
    assert_eq!(err.layer, Some(1));
    assert!(err.message.contains("in layer 2"));
}

#[test]
fn test_meshing_error_with_exit_code() {
    let dir = tempdir().unwrap();
    let gmsh = fake_gmsh(
        &dir,
        "if [ \"$1\" = \"--version\" ]; then echo 4.11.1; exit 0; fi\n\
         echo 'Error   : No elements in volume 1' >&2\nexit 3\n",
    );

    let result = create_mesh_with(
        GmshCli::new(gmsh),
        &one_layer(),
        &MeshOptions::new(dir.path().join("stack")),
    );

    let err = result.error.unwrap();
    assert_eq!(err.kind, ErrorKind::Meshing);
    assert!(err.message.contains("exit code 3"));
}

#[test]
fn test_missing_executable() {
    let dir = tempdir().unwrap();
    let engine = GmshCli::new(dir.path().join("no-such-gmsh"));

    let result = create_mesh_with(engine, &one_layer(), &MeshOptions::new(dir.path().join("stack")));

    let err = result.error.unwrap();
    assert_eq!(err.code, "CYL-3001");
    assert!(dir.path().join("stack.geo").exists());
}
