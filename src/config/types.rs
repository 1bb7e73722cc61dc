//! Configuration type definitions.
//!
//! This module contains the data structures of a site description file.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::build::rules::Rules;
use crate::build::section::{IndexSettings, QrSettings};
use crate::build::selector::{DEFAULT_EXCEPTIONS, owned};

// =============================================================================
// Site description
// =============================================================================

/// The whole site description: run options plus the section tree.
///
/// ```yaml
/// generate:
///   qr_pages: false
/// root:
///   name: site
///   destination: docs
///   children:
///     - name: parts
///       source: content/parts
///       destination: docs/parts
///       templates:
///         destination: templates/part.html
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub generate: GenerateConfig,

    #[serde(default)]
    pub markdown: MarkdownConfig,

    pub root: SectionConfig,
}

// =============================================================================
// Run options
// =============================================================================

/// Stage switches and exception lists, applied to the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub content_exceptions: Vec<String>,
    pub index: bool,
    pub index_exceptions: Vec<String>,
    pub qr: bool,
    pub qr_images: bool,
    pub qr_image_exceptions: Vec<String>,
    pub qr_pages: bool,
    pub qr_page_exceptions: Vec<String>,
    pub qr_grid: GridConfig,
    /// `{i}` is replaced by the page number
    pub qr_filename_fmt: String,
    /// `{i}` is replaced by the page number
    pub qr_title_fmt: String,
    /// Children inherit these options; when false they run with defaults
    pub pass_through: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            content_exceptions: owned(DEFAULT_EXCEPTIONS),
            index: true,
            index_exceptions: owned(DEFAULT_EXCEPTIONS),
            qr: true,
            qr_images: true,
            qr_image_exceptions: owned(DEFAULT_EXCEPTIONS),
            qr_pages: true,
            qr_page_exceptions: owned(DEFAULT_EXCEPTIONS),
            qr_grid: GridConfig::default(),
            qr_filename_fmt: "qr_codes_{i}.html".to_string(),
            qr_title_fmt: "QR Codes {i}".to_string(),
            pass_through: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { rows: 5, cols: 4 }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// One section and, recursively, its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub name: String,

    /// Output directory (relative to the config file)
    pub destination: PathBuf,

    /// Content directory (relative to the config file); omit for a node that
    /// only groups its children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    /// Public URL each page's stem is appended to, for QR codes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_prefix: Option<String>,

    #[serde(default)]
    pub rules: Rules,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub index: IndexSettings,

    #[serde(default)]
    pub qr: QrSettings,

    #[serde(default)]
    pub record: RecordConfig,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SectionConfig>,
}

/// Template files used by a section (relative to the config file).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Converted pages are rendered through this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    /// Reverse conversion renders source files through this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_pages: Option<PathBuf>,
}

/// Fields every extracted record of a section must carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}
