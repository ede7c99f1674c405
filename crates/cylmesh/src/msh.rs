//! Summary statistics from Gmsh `.msh` files.
//!
//! Only the section headers are read: `$MeshFormat` for the version,
//! `$PhysicalNames` for the group listing, and the first line after `$Nodes`
//! and `$Elements` for the counts. Node and element blocks are skipped.
//!
//! Supported layouts (ASCII only):
//!
//! | version | `$Nodes` / `$Elements` header |
//! |---------|-------------------------------|
//! | 2.x     | `count`                       |
//! | 4.x     | `numBlocks count minTag maxTag` |

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::debug;

use crate::error::{StackError, StackResult};

/// A physical group as listed in `$PhysicalNames`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    /// Entity dimension (2 surface, 3 volume).
    pub dimension: i32,
    /// Physical tag.
    pub tag: i32,
    /// Group name without quotes.
    pub name: String,
}

/// Header statistics of a mesh file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MshStats {
    /// `$MeshFormat` version string, e.g. `4.1`.
    pub version: String,
    /// Number of nodes.
    pub num_vertices: usize,
    /// Number of elements of all dimensions.
    pub num_elements: usize,
    /// Physical groups in file order.
    pub groups: Vec<RawGroup>,
}

/// Read header statistics from a `.msh` file.
pub fn read_msh_stats(path: &Path) -> StackResult<MshStats> {
    let file = File::open(path).map_err(|e| StackError::io_read(path, e))?;
    let stats = parse_msh(BufReader::new(file), path)?;
    debug!(
        path = %path.display(),
        version = %stats.version,
        vertices = stats.num_vertices,
        elements = stats.num_elements,
        groups = stats.groups.len(),
        "Read mesh statistics"
    );
    Ok(stats)
}

/// Parse header statistics from any reader. `path` is used for error messages.
pub fn parse_msh<R: BufRead>(reader: R, path: &Path) -> StackResult<MshStats> {
    let mut input = SectionReader {
        lines: reader.lines(),
        path,
    };

    let mut stats = MshStats::default();
    let mut major: Option<u32> = None;
    let mut saw_nodes = false;
    let mut saw_elements = false;

    while let Some(line) = input.next()? {
        match line.trim() {
            "$MeshFormat" => {
                let header = input.expect("$MeshFormat")?;
                let mut fields = header.split_whitespace();
                let version = fields.next().unwrap_or_default().to_string();
                let file_type = fields.next().unwrap_or("0");
                if file_type != "0" {
                    return Err(StackError::mesh_parse(
                        path,
                        "binary mesh files are not supported; write ASCII .msh",
                    ));
                }
                major = version.split('.').next().and_then(|m| m.parse().ok());
                if major.is_none() {
                    return Err(StackError::mesh_parse(
                        path,
                        format!("invalid format version {:?}", version),
                    ));
                }
                stats.version = version;
            }
            "$PhysicalNames" => {
                let count = parse_count(&input.expect("$PhysicalNames")?, 0, path, "$PhysicalNames")?;
                for _ in 0..count {
                    let entry = input.expect("$PhysicalNames")?;
                    stats.groups.push(parse_group(&entry, path)?);
                }
            }
            "$Nodes" => {
                let header = input.expect("$Nodes")?;
                stats.num_vertices = parse_count(&header, count_field(major), path, "$Nodes")?;
                saw_nodes = true;
            }
            "$Elements" => {
                let header = input.expect("$Elements")?;
                stats.num_elements = parse_count(&header, count_field(major), path, "$Elements")?;
                saw_elements = true;
            }
            _ => {}
        }
    }

    if stats.version.is_empty() {
        return Err(StackError::mesh_parse(path, "missing $MeshFormat section"));
    }
    if !saw_nodes || !saw_elements {
        return Err(StackError::mesh_parse(
            path,
            "missing $Nodes or $Elements section",
        ));
    }

    Ok(stats)
}

struct SectionReader<'p, R> {
    lines: Lines<R>,
    path: &'p Path,
}

impl<R: BufRead> SectionReader<'_, R> {
    fn next(&mut self) -> StackResult<Option<String>> {
        self.lines
            .next()
            .transpose()
            .map_err(|e| StackError::io_read(self.path, e))
    }

    /// Next line inside `section`; running out of input is a parse error.
    fn expect(&mut self, section: &str) -> StackResult<String> {
        self.next()?.ok_or_else(|| {
            StackError::mesh_parse(self.path, format!("unexpected end of file in {}", section))
        })
    }
}

/// Position of the total count in the `$Nodes`/`$Elements` header line.
fn count_field(major: Option<u32>) -> usize {
    match major {
        Some(v) if v >= 4 => 1,
        _ => 0,
    }
}

fn parse_count(line: &str, field: usize, path: &Path, section: &str) -> StackResult<usize> {
    line.split_whitespace()
        .nth(field)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| {
            StackError::mesh_parse(path, format!("malformed {} header: {:?}", section, line))
        })
}

fn parse_group(line: &str, path: &Path) -> StackResult<RawGroup> {
    let malformed = || StackError::mesh_parse(path, format!("malformed physical name: {:?}", line));

    let line = line.trim();
    let (dimension, rest) = line.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let (tag, name) = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or_else(malformed)?;

    Ok(RawGroup {
        dimension: dimension.parse().map_err(|_| malformed())?,
        tag: tag.parse().map_err(|_| malformed())?,
        name: name.trim().trim_matches('"').to_string(),
    })
}
