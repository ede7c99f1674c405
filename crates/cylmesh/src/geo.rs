//! Gmsh `.geo` script generation for layered cylinders.
//!
//! The stack is built with the built-in kernel: a disk of radius `r` at
//! `z = 0` is extruded once per layer along `+z`, each extrusion starting
//! from the top surface of the previous one. `Extrude` returns the new top
//! surface in slot 0 and the new volume in slot 1; those are the entities
//! that receive physical names.

use std::fmt::Write as _;
use std::ops::Range;

use crate::stack::{Slot, StackSpec};

/// A rendered geometry script and the line ranges owned by each layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoScript {
    text: String,
    layer_lines: Vec<Range<usize>>,
}

impl GeoScript {
    /// Render the script for a validated stack.
    pub fn new(spec: &StackSpec) -> Self {
        let mut out = ScriptWriter::default();
        let names = spec.names();
        let layers = spec.layers();

        out.line("// Cylindrical multilayer stack generated by cylmesh");
        out.line(&format!(
            "// {} layer(s), total height {}",
            layers.len(),
            fmt_num(spec.total_height())
        ));
        for (i, layer) in layers.iter().enumerate() {
            let subdivisions = match layer.subdivisions {
                Slot::Specified(n) => n.to_string(),
                Slot::Default => "auto".to_string(),
            };
            out.line(&format!(
                "//   {}: {} = {} (subdivisions: {})",
                i + 1,
                names.volumes[i],
                fmt_num(layer.thickness),
                subdivisions
            ));
        }
        out.blank();

        out.line(&format!("lc = {};", fmt_num(spec.mesh_length())));
        out.line(&format!("r = {};", fmt_num(spec.radius())));
        out.line("Mesh.CharacteristicLengthMax = lc;");
        out.blank();

        out.line("// Base disk");
        out.line("Point(1) = {0, 0, 0, lc};");
        out.line("Point(2) = {r, 0, 0, lc};");
        out.line("Point(3) = {0, r, 0, lc};");
        out.line("Point(4) = {-r, 0, 0, lc};");
        out.line("Point(5) = {0, -r, 0, lc};");
        out.line("Circle(1) = {2, 1, 3};");
        out.line("Circle(2) = {3, 1, 4};");
        out.line("Circle(3) = {4, 1, 5};");
        out.line("Circle(4) = {5, 1, 2};");
        out.line("Curve Loop(1) = {1, 2, 3, 4};");
        out.line("Plane Surface(1) = {1};");
        out.line("top0 = 1;");

        let mut layer_lines = Vec::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            out.blank();
            let start = out.next_line();
            out.line(&format!("// Layer {}: {}", i + 1, names.volumes[i]));
            let structured = match layer.subdivisions {
                Slot::Specified(n) => format!(" Layers{{{}}};", n),
                Slot::Default => String::new(),
            };
            out.line(&format!(
                "ex{n}[] = Extrude {{0, 0, {t}}} {{ Surface{{top{prev}}};{structured} }};",
                n = i + 1,
                t = fmt_num(layer.thickness),
                prev = i,
            ));
            out.line(&format!("top{} = ex{}[0];", i + 1, i + 1));
            out.line(&format!("vol{} = ex{}[1];", i + 1, i + 1));
            layer_lines.push(start..out.next_line());
        }

        out.blank();
        out.line("// Physical groups");
        for (i, name) in names.surfaces.iter().enumerate() {
            out.line(&format!(
                "Physical Surface(\"{}\", {}) = {{top{}}};",
                name,
                names.surface_tag(i),
                i
            ));
        }
        for (i, name) in names.volumes.iter().enumerate() {
            out.line(&format!(
                "Physical Volume(\"{}\", {}) = {{vol{}}};",
                name,
                names.volume_tag(i),
                i + 1
            ));
        }

        Self {
            text: out.text,
            layer_lines,
        }
    }

    /// Script text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Script size in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if the script is empty (never the case for a rendered stack).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Layer (0-based) whose statements include the 1-based script `line`.
    pub fn layer_at_line(&self, line: usize) -> Option<usize> {
        self.layer_lines.iter().position(|r| r.contains(&line))
    }
}

impl std::fmt::Display for GeoScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Default)]
struct ScriptWriter {
    text: String,
    lines: usize,
}

impl ScriptWriter {
    fn line(&mut self, s: &str) {
        // Writing to a String cannot fail.
        let _ = writeln!(self.text, "{}", s);
        self.lines += 1;
    }

    fn blank(&mut self) {
        self.line("");
    }

    /// 1-based number of the next line to be written.
    fn next_line(&self) -> usize {
        self.lines + 1
    }
}

/// Format a length so that integral values keep a decimal point.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackParameters;

    fn spec(params: StackParameters) -> StackSpec {
        StackSpec::from_parameters(&params).unwrap()
    }

    #[test]
    fn test_one_extrusion_per_layer() {
        let script = GeoScript::new(&spec(
            StackParameters::new(2.0, 10.0, vec![3.0, 2.0, 1.5]).with_names(["FM1", "MgO", "FM2"]),
        ));
        let text = script.as_str();

        assert_eq!(text.matches("Extrude").count(), 3);
        assert!(text.contains("ex1[] = Extrude {0, 0, 3.0} { Surface{top0}; };"));
        assert!(text.contains("ex3[] = Extrude {0, 0, 1.5} { Surface{top2}; };"));
        assert!(text.contains("lc = 2.0;"));
        assert!(text.contains("r = 10.0;"));
    }

    #[test]
    fn test_physical_groups_have_names_and_tags() {
        let script = GeoScript::new(&spec(
            StackParameters::new(1.0, 5.0, vec![1.0, 1.0]).with_names(["FM1", "FM2"]),
        ));
        let text = script.as_str();

        assert!(text.contains("Physical Surface(\"FM1_bottom\", 1) = {top0};"));
        assert!(text.contains("Physical Surface(\"FM1_top\", 2) = {top1};"));
        assert!(text.contains("Physical Surface(\"FM2_top\", 3) = {top2};"));
        assert!(text.contains("Physical Volume(\"FM1\", 4) = {vol1};"));
        assert!(text.contains("Physical Volume(\"FM2\", 5) = {vol2};"));
        assert_eq!(text.matches("Physical Surface(").count(), 3);
        assert_eq!(text.matches("Physical Volume(").count(), 2);
    }

    #[test]
    fn test_layers_only_for_specified_subdivisions() {
        let params = StackParameters {
            subdivisions: Some(vec![Some(4), None]),
            ..StackParameters::new(1.0, 5.0, vec![2.0, 1.0])
        };
        let text = GeoScript::new(&spec(params)).to_string();

        assert!(text.contains("Surface{top0}; Layers{4}; }"));
        assert!(text.contains("Surface{top1}; }"));
        assert_eq!(text.matches("Layers{").count(), 1);
        assert!(text.contains("(subdivisions: auto)"));
    }

    #[test]
    fn test_layer_at_line() {
        let script = GeoScript::new(&spec(StackParameters::new(1.0, 5.0, vec![1.0, 2.0])));
        let lines: Vec<&str> = script.as_str().lines().collect();

        let line_of = |needle: &str| lines.iter().position(|l| l.contains(needle)).unwrap() + 1;

        assert_eq!(script.layer_at_line(line_of("ex1[] = Extrude")), Some(0));
        assert_eq!(script.layer_at_line(line_of("vol2 = ex2[1];")), Some(1));
        assert_eq!(script.layer_at_line(line_of("Plane Surface(1)")), None);
        assert_eq!(script.layer_at_line(line_of("Physical Volume")), None);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3.0");
        assert_eq!(fmt_num(0.25), "0.25");
        assert_eq!(fmt_num(1e-3), "0.001");
    }
}
