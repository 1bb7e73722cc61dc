//! Configuration loading and types for sitetree.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for the site description (`types`)
//! - Loading it from a file with environment overrides (`load`)
//! - Resolving it into a section tree and run options (`resolve`)

mod load;
mod resolve;
mod types;

// Re-export all types for convenient access
pub use load::{DEFAULT_CONFIG_FILE, base_path_from_config, config_path_from_arg};
pub use types::{
    GenerateConfig, GridConfig, MarkdownConfig, RecordConfig, SectionConfig, SiteConfig,
    TemplatesConfig,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}
