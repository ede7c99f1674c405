//! Layer model: the validated description of a cylindrical stack.
//!
//! [`StackParameters`] is what a caller or config file hands in. It is checked
//! once by [`StackSpec::from_parameters`], which yields an immutable
//! [`StackSpec`] whose per-layer optional values are explicit [`Slot`]s.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StackError, StackResult};
use crate::naming::{PhysicalNames, assign_names};

/// A per-layer value that is either given by the caller or left to its default.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slot<T> {
    /// Value supplied by the caller.
    Specified(T),
    /// Fall back to the default rule for this field.
    #[default]
    Default,
}

impl<T> Slot<T> {
    /// Returns the specified value, if any.
    pub fn specified(&self) -> Option<&T> {
        match self {
            Slot::Specified(v) => Some(v),
            Slot::Default => None,
        }
    }

    /// Returns true if the caller supplied a value.
    pub fn is_specified(&self) -> bool {
        matches!(self, Slot::Specified(_))
    }

    /// Convert back into an `Option`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Slot::Specified(v) => Some(v),
            Slot::Default => None,
        }
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Slot::Specified(v),
            None => Slot::Default,
        }
    }
}

/// One material layer of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Layer thickness along the cylinder axis.
    pub thickness: f64,
    /// Layer name; defaults to the 1-based position.
    pub name: Slot<String>,
    /// Vertical subdivisions; defaults to whatever the engine chooses.
    pub subdivisions: Slot<u32>,
}

impl LayerSpec {
    /// Create an unnamed layer with engine-chosen subdivisions.
    pub fn new(thickness: f64) -> Self {
        Self {
            thickness,
            name: Slot::Default,
            subdivisions: Slot::Default,
        }
    }

    /// Set the layer name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Slot::Specified(name.into());
        self
    }

    /// Set the number of vertical subdivisions.
    pub fn subdivided(mut self, subdivisions: u32) -> Self {
        self.subdivisions = Slot::Specified(subdivisions);
        self
    }
}

/// Stack parameters exactly as supplied, before validation.
///
/// Field names match the keys of the JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackParameters {
    /// Characteristic mesh length.
    pub ml: f64,
    /// Cylinder radius.
    pub radius: f64,
    /// Layer thicknesses, bottom to top.
    pub layers: Vec<f64>,
    /// Optional per-layer names; `null` entries fall back to the position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_names: Option<Vec<Option<String>>>,
    /// Optional per-layer subdivisions; `null` entries are left to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivisions: Option<Vec<Option<u32>>>,
}

impl StackParameters {
    /// Create parameters with unnamed layers and default subdivisions.
    pub fn new(ml: f64, radius: f64, layers: impl Into<Vec<f64>>) -> Self {
        Self {
            ml,
            radius,
            layers: layers.into(),
            layer_names: None,
            subdivisions: None,
        }
    }

    /// Name every layer.
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.layer_names = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    /// Give every layer an explicit subdivision count.
    pub fn with_subdivisions(mut self, subdivisions: impl IntoIterator<Item = u32>) -> Self {
        self.subdivisions = Some(subdivisions.into_iter().map(Some).collect());
        self
    }

    /// Sum of all layer thicknesses.
    pub fn total_height(&self) -> f64 {
        self.layers.iter().sum()
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

/// A validated, immutable cylindrical stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSpec {
    mesh_length: f64,
    radius: f64,
    layers: Vec<LayerSpec>,
    names: PhysicalNames,
}

impl StackSpec {
    /// Validate a stack assembled from layer specs.
    ///
    /// Checks positivity of all lengths, subdivision counts, name syntax and
    /// name uniqueness.
    pub fn new(mesh_length: f64, radius: f64, layers: Vec<LayerSpec>) -> StackResult<Self> {
        require_positive("mesh length", mesh_length)?;
        require_positive("radius", radius)?;

        if layers.is_empty() {
            return Err(StackError::EmptyStack);
        }

        for (i, layer) in layers.iter().enumerate() {
            require_positive(format!("layer {} thickness", i + 1), layer.thickness)?;
            if let Slot::Specified(0) = layer.subdivisions {
                return Err(StackError::InvalidSubdivisions { layer: i, value: 0 });
            }
        }

        let names = assign_names(&layers)?;

        debug!(
            layers = layers.len(),
            mesh_length,
            radius,
            "Validated stack"
        );

        Ok(Self {
            mesh_length,
            radius,
            layers,
            names,
        })
    }

    /// Validate caller-supplied parameters.
    pub fn from_parameters(params: &StackParameters) -> StackResult<Self> {
        let n = params.layers.len();

        if let Some(names) = &params.layer_names
            && names.len() != n
        {
            return Err(StackError::LengthMismatch {
                field: "layer names",
                expected: n,
                found: names.len(),
            });
        }
        if let Some(subdivisions) = &params.subdivisions
            && subdivisions.len() != n
        {
            return Err(StackError::LengthMismatch {
                field: "subdivisions",
                expected: n,
                found: subdivisions.len(),
            });
        }

        let layers = params
            .layers
            .iter()
            .enumerate()
            .map(|(i, &thickness)| LayerSpec {
                thickness,
                name: params
                    .layer_names
                    .as_ref()
                    .and_then(|names| names[i].clone())
                    .into(),
                subdivisions: params
                    .subdivisions
                    .as_ref()
                    .and_then(|subs| subs[i])
                    .into(),
            })
            .collect();

        Self::new(params.ml, params.radius, layers)
    }

    /// Echo this stack back as parameters.
    ///
    /// Name and subdivision lists are only present if at least one layer
    /// specifies a value.
    pub fn to_parameters(&self) -> StackParameters {
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

        StackParameters {
            ml: self.mesh_length,
            radius: self.radius,
            layers: self.layers.iter().map(|l| l.thickness).collect(),
            layer_names: names.iter().any(Option::is_some).then_some(names),
            subdivisions: subdivisions.iter().any(Option::is_some).then_some(subdivisions),
        }
    }

    /// Characteristic mesh length.
    pub fn mesh_length(&self) -> f64 {
        self.mesh_length
    }

    /// Cylinder radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Layers, bottom to top.
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Physical group names assigned to this stack.
    pub fn names(&self) -> &PhysicalNames {
        &self.names
    }

    /// Sum of all layer thicknesses.
    pub fn total_height(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }
}

fn require_positive(parameter: impl Into<String>, value: f64) -> StackResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StackError::invalid_value(parameter, value))
    }
}
