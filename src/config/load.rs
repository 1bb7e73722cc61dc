//! Configuration loading from files.
//!
//! The site description is read with the `config` crate so that any scalar
//! key can be overridden from the environment, e.g.
//! `SITETREE__GENERATE__QR=false` or `SITETREE__ROOT__DESTINATION=out`.

use std::path::{Path, PathBuf};

use super::{ConfigError, SiteConfig};

pub const DEFAULT_CONFIG_FILE: &str = "sitetree.yaml";

const ENV_PREFIX: &str = "SITETREE";
const ENV_SEPARATOR: &str = "__";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `sitetree.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from_file(&config_path_from_arg(config_file)?)
    }

    /// Load the config from a file path, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        Ok(config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<SiteConfig>()?)
    }
}

/// Absolute path of the config file named on the command line; relative
/// names resolve against the current directory.
pub fn config_path_from_arg(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if config_file.is_relative() {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CwdFailure)?
            .join(config_file))
    } else {
        Ok(config_file.to_path_buf())
    }
}

/// Directory relative paths in the config file are resolved against.
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
