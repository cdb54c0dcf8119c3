//! Generator configuration
//!
//! Loaded from an optional `srvgen.toml`; every key has a default.

use crate::error::{GenError, GenResult};
use crate::hash::HashAlgorithm;
use crate::parser::is_identifier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "srvgen.toml";

/// Environment variable holding extra package search roots
pub const PACKAGE_PATH_ENV: &str = "ROS_PACKAGE_PATH";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub generator: GeneratorSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Code generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    /// Java package prefix; bindings land in `<prefix>.<package>.srv`
    #[serde(default = "default_java_package_prefix")]
    pub java_package_prefix: String,

    /// Java package of the middleware runtime classes
    #[serde(default = "default_runtime_package")]
    pub runtime_package: String,

    /// Extension of generated files
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Digest used for compatibility hashes
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

/// Package search settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Roots searched for message packages
    #[serde(default)]
    pub package_path: Vec<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Default log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_java_package_prefix() -> String {
    "ros.pkg".to_string()
}

fn default_runtime_package() -> String {
    "ros.communication".to_string()
}

fn default_extension() -> String {
    "java".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            java_package_prefix: default_java_package_prefix(),
            runtime_package: default_runtime_package(),
            extension: default_extension(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> GenResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> GenResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `srvgen.toml` in the working directory if
    /// present, else defaults
    pub fn load(path: Option<&Path>) -> GenResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> GenResult<()> {
        if !is_dotted_identifier(&self.generator.java_package_prefix) {
            return Err(GenError::Config(format!(
                "java_package_prefix '{}' is not a dotted identifier",
                self.generator.java_package_prefix
            )));
        }
        if !is_dotted_identifier(&self.generator.runtime_package) {
            return Err(GenError::Config(format!(
                "runtime_package '{}' is not a dotted identifier",
                self.generator.runtime_package
            )));
        }
        if self.generator.extension.is_empty() || self.generator.extension.contains(['/', '.']) {
            return Err(GenError::Config(format!(
                "extension '{}' must be a bare file extension",
                self.generator.extension
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(GenError::Config(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Search roots: configured paths, then `extra`, then `env_path`
    /// (a `ROS_PACKAGE_PATH`-style list)
    pub fn search_roots(&self, extra: &[PathBuf], env_path: Option<&str>) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self.paths.package_path.clone();
        roots.extend(extra.iter().cloned());
        if let Some(env_path) = env_path {
            roots.extend(std::env::split_paths(env_path).filter(|p| !p.as_os_str().is_empty()));
        }
        let mut seen = std::collections::HashSet::new();
        roots.retain(|p| seen.insert(p.clone()));
        roots
    }
}

fn is_dotted_identifier(s: &str) -> bool {
    s.split('.').all(is_identifier)
}
