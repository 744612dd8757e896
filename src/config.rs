//! Layered configuration loading using figment.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `wrapmeta.toml` in the working directory, if present
//! 3. The file passed with `--config`
//! 4. Environment variables (`WRAPMETA_*` prefix, `__` separates sections)
//!
//! Figment maps `WRAPMETA_MARKERS__EXPORT` -> `markers.export` and
//! `WRAPMETA_INPUT__INCLUDE_ROOT` -> `input.include_root`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LOCAL_CONFIG_FILE: &str = "wrapmeta.toml";
pub const ENV_PREFIX: &str = "WRAPMETA_";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Configuration file '{}' does not exist", path.display())]
    MissingFile { path: PathBuf },

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}

/// The annotation vocabulary that drives parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub export: String,
    pub c_export: String,
    pub no_export: String,
    pub interface: String,
    pub out: String,
    pub in_out: String,
    pub async_result: String,
    pub async_result_with_progress: String,
    pub event: String,
    pub no_dispose: String,
    pub enum_flags: String,
    pub ignore_start: String,
    pub ignore_end: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            export: "WRAP_API".to_string(),
            c_export: "WRAP_C_API".to_string(),
            no_export: "WRAP_NO_EXPORT".to_string(),
            interface: "WRAP_INTERFACE".to_string(),
            out: "WRAP_OUT".to_string(),
            in_out: "WRAP_IN_OUT".to_string(),
            async_result: "WRAP_ASYNC_RESULT".to_string(),
            async_result_with_progress: "WRAP_ASYNC_RESULT_WITH_PROGRESS".to_string(),
            event: "WRAP_EVENT".to_string(),
            no_dispose: "WRAP_NO_DISPOSE".to_string(),
            enum_flags: "WRAP_FLAGS".to_string(),
            ignore_start: "WRAP_START_IGNORE".to_string(),
            ignore_end: "WRAP_END_IGNORE".to_string(),
        }
    }
}

impl MarkerConfig {
    pub fn is_export(&self, word: &str) -> bool {
        word == self.export || word == self.c_export
    }

    /// Markers that may only precede a function declaration.
    pub fn is_function_marker(&self, word: &str) -> bool {
        word == self.async_result || word == self.async_result_with_progress || word == self.event
    }

    fn entries(&self) -> [(&'static str, &str); 13] {
        [
            ("export", &self.export),
            ("c_export", &self.c_export),
            ("no_export", &self.no_export),
            ("interface", &self.interface),
            ("out", &self.out),
            ("in_out", &self.in_out),
            ("async_result", &self.async_result),
            ("async_result_with_progress", &self.async_result_with_progress),
            ("event", &self.event),
            ("no_dispose", &self.no_dispose),
            ("enum_flags", &self.enum_flags),
            ("ignore_start", &self.ignore_start),
            ("ignore_end", &self.ignore_end),
        ]
    }
}

/// Type names with special meaning to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TypeNameConfig {
    pub string_type: String,
    pub optional_type: String,
    pub function_type: String,
}

impl Default for TypeNameConfig {
    fn default() -> Self {
        Self {
            string_type: "String".to_string(),
            optional_type: "Optional".to_string(),
            function_type: "function".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Diagnostics and recorded locations are made relative to this.
    pub include_root: Option<PathBuf>,
    /// Extensions picked up when a directory is given as input.
    pub header_extensions: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            include_root: None,
            header_extensions: vec!["h".to_string(), "hpp".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub types: TypeNameConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl Config {
    /// Load configuration from all sources.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
        }
        let config: Config = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.markers.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("markers.{field}"),
                    reason: "marker must not be empty".to_string(),
                });
            }
        }
        if self.input.header_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "input.header_extensions".to_string(),
                reason: "at least one extension is required".to_string(),
            });
        }
        Ok(())
    }
}
