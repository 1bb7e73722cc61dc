//! Pipeline error types.

use std::path::{Path, PathBuf};

use super::qr::EncodeError;
use super::render::RenderError;
use super::selector::SelectorError;

/// Errors that can occur while generating a section tree.
///
/// Missing collaborators for a requested stage are not errors: the stage is
/// skipped with a warning. Everything here stops the run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to extract data from {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Encoding(#[from] EncodeError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("aborted by operator")]
    Aborted,
}

impl PipelineError {
    /// Create a stage-specific error, for use by custom hooks.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn extraction(path: &Path, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Adapter for `map_err` that records which path the IO error was on.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
