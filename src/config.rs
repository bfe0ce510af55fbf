//! Configuration to acknowledge developer preferences as well as set defaults.
//!
//! Specifically, we try to find a dtoregen.toml, and if present we load settings from there.
//! This provides naming conventions for the generated classes, the using directives every
//! generated file starts with, and the indent width of the output.

use crate::error::{Error, Result};
use facet::Facet;
use std::fs;
use std::io;
use std::path::Path;

/// File looked up in the working directory by [`Config::load`].
pub const CONFIG_FILE: &str = "dtoregen.toml";

const DEFAULT_DTO_SUFFIX: &str = "DTO";
const DEFAULT_MAPPER_SUFFIX: &str = "Mapper";
const DEFAULT_MAPPER_BASE: &str = "MapperBase";
const DEFAULT_USINGS: [&str; 4] = [
    "System",
    "System.Collections.Generic",
    "System.Linq",
    "System.Linq.Expressions",
];
const DEFAULT_INDENT_WIDTH: usize = 4;

fn default_usings() -> Vec<String> {
    DEFAULT_USINGS.iter().map(ToString::to_string).collect()
}

#[derive(Facet, Clone, Debug)]
/// User preferences loaded from dtoregen.toml or falling back to defaults.
pub struct Config {
    #[facet(default = DEFAULT_DTO_SUFFIX.to_string())]
    /// Appended to the entity name to form the DTO class name.
    pub dto_suffix: String,
    #[facet(default = DEFAULT_MAPPER_SUFFIX.to_string())]
    /// Appended to an entity name to form its mapper class name.
    pub mapper_suffix: String,
    #[facet(default = DEFAULT_MAPPER_SUFFIX.to_string())]
    /// Classes whose name contains this text are mappers and never hold custom declarations.
    pub mapper_marker: String,
    #[facet(default = DEFAULT_MAPPER_BASE.to_string())]
    /// Generic base class every generated mapper derives from.
    pub mapper_base: String,
    #[facet(default = default_usings())]
    /// Namespaces imported by every generated file.
    pub usings: Vec<String>,
    #[facet(default = DEFAULT_INDENT_WIDTH)]
    /// Spaces per indentation level in generated output.
    pub indent_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dto_suffix: DEFAULT_DTO_SUFFIX.to_string(),
            mapper_suffix: DEFAULT_MAPPER_SUFFIX.to_string(),
            mapper_marker: DEFAULT_MAPPER_SUFFIX.to_string(),
            mapper_base: DEFAULT_MAPPER_BASE.to_string(),
            usings: default_usings(),
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

impl Config {
    /// Load configuration from dtoregen.toml in the working directory if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from `path`, using defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("cannot read {}: {e}", path.display()))),
        }
    }

    /// Parse configuration from TOML text; omitted keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or has mistyped values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        facet_toml::from_str::<Self>(contents).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
