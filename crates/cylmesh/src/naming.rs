//! Physical group naming for layered stacks.
//!
//! Layer `i` produces one volume, named after the layer (or `i + 1` when
//! unnamed), and one top surface `{volume}_top`. The first layer additionally
//! owns the bottom cap `{volume}_bottom`, so `n` layers yield `n` volumes and
//! `n + 1` surfaces.
//!
//! Tags are fixed by position: surfaces are numbered from 1 bottom to top,
//! volumes continue after the last surface.

use hashbrown::HashMap;
use serde::Serialize;

use crate::error::{StackError, StackResult};
use crate::stack::{LayerSpec, Slot};

/// Physical group names for a stack, in stack order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhysicalNames {
    /// `n + 1` surface names, bottom cap first.
    pub surfaces: Vec<String>,
    /// `n` volume names, bottom layer first.
    pub volumes: Vec<String>,
}

impl PhysicalNames {
    /// Tag assigned to surface `index`.
    pub fn surface_tag(&self, index: usize) -> i32 {
        (index + 1) as i32
    }

    /// Tag assigned to the volume of layer `index`.
    pub fn volume_tag(&self, index: usize) -> i32 {
        (self.surfaces.len() + 1 + index) as i32
    }
}

/// Volume name for the layer at `index`.
pub fn volume_name(layer: &LayerSpec, index: usize) -> String {
    match &layer.name {
        Slot::Specified(name) => name.clone(),
        Slot::Default => (index + 1).to_string(),
    }
}

/// Assign surface and volume names to an ordered list of layers.
///
/// Fails if a specified name is unusable in a geometry script, or if any two
/// physical groups (surface or volume) would end up with the same name. The
/// latter includes an explicit name that equals another layer's positional
/// default.
pub fn assign_names(layers: &[LayerSpec]) -> StackResult<PhysicalNames> {
    if layers.is_empty() {
        return Err(StackError::EmptyStack);
    }

    for (i, layer) in layers.iter().enumerate() {
        if let Slot::Specified(name) = &layer.name {
            check_name(i, name)?;
        }
    }

    let volumes: Vec<String> = layers
        .iter()
        .enumerate()
        .map(|(i, layer)| volume_name(layer, i))
        .collect();

    let mut surfaces = Vec::with_capacity(layers.len() + 1);
    surfaces.push(format!("{}_bottom", volumes[0]));
    surfaces.extend(volumes.iter().map(|v| format!("{}_top", v)));

    check_unique(&volumes, &surfaces)?;

    Ok(PhysicalNames { surfaces, volumes })
}

/// Reject any name used twice across volumes and surfaces.
fn check_unique(volumes: &[String], surfaces: &[String]) -> StackResult<()> {
    // Owner layer for each name, used to report both sides of a collision.
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(volumes.len() + surfaces.len());
    let owners = volumes
        .iter()
        .enumerate()
        .chain(surfaces.iter().enumerate().map(|(i, s)| (i.saturating_sub(1), s)));
    for (layer, name) in owners {
        if let Some(&first) = seen.get(name.as_str()) {
            return Err(StackError::NamingCollision {
                name: name.clone(),
                first,
                second: layer,
            });
        }
        seen.insert(name.as_str(), layer);
    }
    Ok(())
}

fn check_name(layer: usize, name: &str) -> StackResult<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains('"') {
        Some("name contains a double quote")
    } else if name.contains(['\n', '\r']) {
        Some("name contains a line break")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StackError::InvalidLayerName {
            layer,
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
