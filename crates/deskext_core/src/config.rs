//! Resource location configuration for extension loading.
//!
//! # Responsibility
//! - Describe where bundled extension resources live.
//! - Select packaged or directory-backed resource providers.
//!
//! # Invariants
//! - The internal extension allowlist is not configurable here.
//! - Environment overrides win over file values.

use crate::extension::ExtensionPaths;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Overrides `resources_dir`.
pub const ENV_RESOURCES_DIR: &str = "DESKEXT_RESOURCES_DIR";
/// Overrides `resource_dir`.
pub const ENV_RESOURCE_DIR: &str = "DESKEXT_RESOURCE_DIR";
/// Overrides `packaged_resources` (`1|true|0|false`).
pub const ENV_PACKAGED_RESOURCES: &str = "DESKEXT_PACKAGED_RESOURCES";

/// Extension resource configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Bundled-resources root stripped from internal extension paths.
    pub resources_dir: Option<PathBuf>,
    /// On-disk resource directory for directory-backed providers. `None`
    /// disables them.
    pub resource_dir: Option<PathBuf>,
    /// Serve internal extensions from packaged resources instead of disk.
    pub packaged_resources: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            resources_dir: None,
            resource_dir: None,
            packaged_resources: cfg!(windows),
        }
    }
}

impl ExtensionConfig {
    /// Parses configuration from a JSON document. Missing keys use defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies `DESKEXT_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`. Blank values are ignored.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(dir) = value(ENV_RESOURCES_DIR) {
            self.resources_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = value(ENV_RESOURCE_DIR) {
            self.resource_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = value(ENV_PACKAGED_RESOURCES) {
            self.packaged_resources = parse_flag(ENV_PACKAGED_RESOURCES, &raw)?;
        }
        Ok(self)
    }

    /// Path resolver bound to `resources_dir`.
    pub fn extension_paths(&self) -> ExtensionPaths {
        ExtensionPaths::new(self.resources_dir.as_deref())
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "failed to read config `{path}`: {message}"),
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for {key}: `{value}` (expected 1|true|0|false)")
            }
        }
    }
}

impl Error for ConfigError {}
