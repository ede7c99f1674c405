//! Stack configuration files.
//!
//! A config file holds the same keys as [`StackParameters`], all optional:
//!
//! ```json
//! {
//!   "ml": 2.0,
//!   "radius": 10.0,
//!   "layers": [3.0, 2.0, 1.5],
//!   "layer_names": ["FM1", "MgO", "FM2"],
//!   "subdivisions": [2, 1, 2]
//! }
//! ```
//!
//! Files ending in `.toml` are read and written as TOML, `.yaml`/`.yml` as
//! YAML, everything else as JSON. Values given on the command line (or by the caller) override the
//! file per key via [`StackConfig::merge`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StackError, StackResult};
use crate::stack::StackParameters;

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

/// Partially specified stack parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_names: Option<Vec<Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivisions: Option<Vec<Option<u32>>>,
}

impl StackConfig {
    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> StackResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| StackError::io_read(path, e))?;
        let config = Self::parse(&contents, ConfigFormat::from_path(path)).map_err(|details| {
            StackError::ConfigParse {
                path: path.to_path_buf(),
                details,
            }
        })?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Parse config text in the given format.
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        }
    }

    /// Serialize in the given format.
    ///
    /// TOML has no null, so lists with unset entries cannot be written as TOML.
    pub fn to_text(&self, format: ConfigFormat) -> Result<String, String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| e.to_string()),
        }
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> StackResult<()> {
        let path = path.as_ref();
        let text = self
            .to_text(ConfigFormat::from_path(path))
            .map_err(|details| StackError::ConfigParse {
                path: path.to_path_buf(),
                details,
            })?;
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| StackError::io_write(dir, e))?;
        }
        std::fs::write(path, text).map_err(|e| StackError::io_write(path, e))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Overlay `overrides` on this config; keys set in `overrides` win.
    pub fn merge(self, overrides: StackConfig) -> StackConfig {
        StackConfig {
            ml: overrides.ml.or(self.ml),
            radius: overrides.radius.or(self.radius),
            layers: overrides.layers.or(self.layers),
            layer_names: overrides.layer_names.or(self.layer_names),
            subdivisions: overrides.subdivisions.or(self.subdivisions),
        }
    }

    /// Complete parameters, or the first missing required key.
    pub fn into_parameters(self) -> StackResult<StackParameters> {
        Ok(StackParameters {
            ml: self.ml.ok_or(StackError::MissingParameter { parameter: "ml" })?,
            radius: self
                .radius
                .ok_or(StackError::MissingParameter { parameter: "radius" })?,
            layers: self
                .layers
                .ok_or(StackError::MissingParameter { parameter: "layers" })?,
            layer_names: self.layer_names,
            subdivisions: self.subdivisions,
        })
    }
}

impl From<StackParameters> for StackConfig {
    fn from(params: StackParameters) -> Self {
        Self {
            ml: Some(params.ml),
            radius: Some(params.radius),
            layers: Some(params.layers),
            layer_names: params.layer_names,
            subdivisions: params.subdivisions,
        }
    }
}
