//! The section tree.
//!
//! A [`SectionNode`] is one logical part of the published site: where its
//! content comes from, where it goes, which [`Rules`] select files for each
//! stage, and which stages are replaced by caller-supplied hooks.
//!
//! Trees are assembled leaves first with [`SectionNode::builder`], then
//! children are attached with [`SectionNode::with_children`]. Once a tree is
//! handed to the generator it is only ever borrowed immutably.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::document::{DataRecord, IndexRow, RecordShape};
use super::error::PipelineError;
use super::qr::{QrGrid, QrOptions, QrPage};
use super::render::Template;
use super::rules::Rules;
use super::selector::Selector;

/// Replaces the whole content stage. Receives the compiled exceptions.
pub type ContentHook = Box<dyn Fn(&SectionNode, &Selector) -> Result<(), PipelineError>>;
/// Reads one source file into a record.
pub type DataExtractor = Box<dyn Fn(&Path) -> Result<DataRecord, PipelineError>>;
/// Writes one converted file: `(node, destination file, template, record)`.
pub type DataWriter =
    Box<dyn Fn(&SectionNode, &Path, &Template, &DataRecord) -> Result<(), PipelineError>>;
/// Replaces the whole index stage.
pub type IndexHook = Box<dyn Fn(&SectionNode, &Selector) -> Result<(), PipelineError>>;
/// Summarizes one output file: `(full path, path relative to the destination)`.
pub type IndexRowExtractor = Box<dyn Fn(&Path, &Path) -> Result<IndexRow, PipelineError>>;
/// Writes the index document from the collected rows.
pub type IndexWriter =
    Box<dyn Fn(&SectionNode, &Template, &[IndexRow]) -> Result<(), PipelineError>>;
/// Replaces the whole QR stage.
pub type QrHook = Box<dyn Fn(&SectionNode, &QrOptions) -> Result<(), PipelineError>>;
/// Replaces QR image generation.
pub type QrImageHook = Box<dyn Fn(&SectionNode, &Selector) -> Result<(), PipelineError>>;
/// Produces the page layout in place of the built-in pagination.
pub type QrPagesExtractor =
    Box<dyn Fn(&SectionNode, QrGrid, &Selector) -> Result<Vec<QrPage>, PipelineError>>;
/// Writes one QR page: `(node, table, template, destination file, title)`.
pub type QrTableWriter =
    Box<dyn Fn(&SectionNode, &QrPage, &Template, &Path, &str) -> Result<(), PipelineError>>;

/// Optional stage overrides and per-file collaborators.
///
/// A hook that is set takes over completely; nothing of the built-in
/// behavior it replaces runs.
#[derive(Default)]
pub struct Hooks {
    pub content: Option<ContentHook>,
    pub data_extractor: Option<DataExtractor>,
    pub data_writer: Option<DataWriter>,
    pub index: Option<IndexHook>,
    pub index_extractor: Option<IndexRowExtractor>,
    pub index_writer: Option<IndexWriter>,
    pub qr: Option<QrHook>,
    pub qr_images: Option<QrImageHook>,
    pub qr_pages_extractor: Option<QrPagesExtractor>,
    pub qr_table_writer: Option<QrTableWriter>,
    /// Reads a published page back into a record for reverse conversion.
    pub reverse_extractor: Option<DataExtractor>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set: Vec<&str> = [
            ("content", self.content.is_some()),
            ("data_extractor", self.data_extractor.is_some()),
            ("data_writer", self.data_writer.is_some()),
            ("index", self.index.is_some()),
            ("index_extractor", self.index_extractor.is_some()),
            ("index_writer", self.index_writer.is_some()),
            ("qr", self.qr.is_some()),
            ("qr_images", self.qr_images.is_some()),
            ("qr_pages_extractor", self.qr_pages_extractor.is_some()),
            ("qr_table_writer", self.qr_table_writer.is_some()),
            ("reverse_extractor", self.reverse_extractor.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, is_set)| is_set.then_some(name))
        .collect();
        f.debug_struct("Hooks").field("set", &set).finish()
    }
}

/// Index document settings for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSettings {
    pub enabled: bool,
    /// Relative to the destination path
    pub filename: String,
    /// Shown in the browser title bar and on top of the index
    pub title: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            filename: "index.html".to_string(),
            title: "Index".to_string(),
        }
    }
}

/// QR artifact settings for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrSettings {
    pub enabled: bool,
    /// Relative to the destination path
    pub image_dirname: String,
    pub pages_enabled: bool,
    /// Relative to the destination path
    pub pages_dirname: String,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            image_dirname: "qr_codes".to_string(),
            pages_enabled: true,
            pages_dirname: "qr_codes/pages".to_string(),
        }
    }
}

/// One node of the section tree.
#[derive(Debug)]
pub struct SectionNode {
    pub name: String,
    pub destination_path: PathBuf,
    /// Without a source, the node only groups its children.
    pub source_path: Option<PathBuf>,
    /// Required for QR images; each page's URL is this prefix plus its stem.
    pub public_url_prefix: Option<String>,
    pub children: Vec<SectionNode>,

    pub record_shape: RecordShape,
    /// Template used to regenerate source files from published pages
    pub source_template_path: Option<PathBuf>,
    /// Template converted files are rendered through
    pub destination_template_path: Option<PathBuf>,
    pub index_template_path: Option<PathBuf>,
    pub qr_pages_template_path: Option<PathBuf>,

    pub hooks: Hooks,
    pub rules: Rules,
    pub index: IndexSettings,
    pub qr: QrSettings,
}

impl SectionNode {
    /// Start building a leaf node.
    pub fn builder(name: impl Into<String>, destination: impl Into<PathBuf>) -> SectionBuilder {
        SectionBuilder {
            node: SectionNode {
                name: name.into(),
                destination_path: destination.into(),
                source_path: None,
                public_url_prefix: None,
                children: Vec::new(),
                record_shape: RecordShape::Any,
                source_template_path: None,
                destination_template_path: None,
                index_template_path: None,
                qr_pages_template_path: None,
                hooks: Hooks::default(),
                rules: Rules::default(),
                index: IndexSettings::default(),
                qr: QrSettings::default(),
            },
        }
    }

    /// Attach children (second construction phase).
    pub fn with_children(mut self, children: Vec<SectionNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn child(mut self, child: SectionNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn index_path(&self) -> PathBuf {
        self.destination_path.join(&self.index.filename)
    }

    pub fn qr_image_dir(&self) -> PathBuf {
        self.destination_path.join(&self.qr.image_dirname)
    }

    pub fn qr_pages_dir(&self) -> PathBuf {
        self.destination_path.join(&self.qr.pages_dirname)
    }

    /// This node and all of its descendants, depth-first in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// First construction phase of a [`SectionNode`].
pub struct SectionBuilder {
    node: SectionNode,
}

impl SectionBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.node.source_path = Some(path.into());
        self
    }

    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.node.public_url_prefix = Some(prefix.into());
        self
    }

    pub fn rules(mut self, rules: Rules) -> Self {
        self.node.rules = rules;
        self
    }

    pub fn record_shape(mut self, shape: RecordShape) -> Self {
        self.node.record_shape = shape;
        self
    }

    pub fn source_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.node.source_template_path = Some(path.into());
        self
    }

    pub fn destination_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.node.destination_template_path = Some(path.into());
        self
    }

    pub fn index_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.node.index_template_path = Some(path.into());
        self
    }

    pub fn qr_pages_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.node.qr_pages_template_path = Some(path.into());
        self
    }

    pub fn index(mut self, settings: IndexSettings) -> Self {
        self.node.index = settings;
        self
    }

    pub fn index_title(mut self, title: impl Into<String>) -> Self {
        self.node.index.title = title.into();
        self
    }

    pub fn qr(mut self, settings: QrSettings) -> Self {
        self.node.qr = settings;
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.node.hooks = hooks;
        self
    }

    pub fn data_extractor(
        mut self,
        f: impl Fn(&Path) -> Result<DataRecord, PipelineError> + 'static,
    ) -> Self {
        self.node.hooks.data_extractor = Some(Box::new(f));
        self
    }

    pub fn index_extractor(
        mut self,
        f: impl Fn(&Path, &Path) -> Result<IndexRow, PipelineError> + 'static,
    ) -> Self {
        self.node.hooks.index_extractor = Some(Box::new(f));
        self
    }

    pub fn build(self) -> SectionNode {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let node = SectionNode::builder("parts", "docs/parts").build();

        assert_eq!(node.name, "parts");
        assert!(node.source_path.is_none());
        assert_eq!(node.index_path(), PathBuf::from("docs/parts/index.html"));
        assert_eq!(node.qr_image_dir(), PathBuf::from("docs/parts/qr_codes"));
        assert_eq!(node.qr_pages_dir(), PathBuf::from("docs/parts/qr_codes/pages"));
        assert!(node.hooks.data_extractor.is_none());
    }

    #[test]
    fn test_two_phase_tree() {
        let parts = SectionNode::builder("parts", "docs/fa/parts")
            .source("content/fa/parts")
            .build();
        let scientists = SectionNode::builder("scientists", "docs/fa/scientists")
            .source("content/fa/scientists")
            .build();
        let fa = SectionNode::builder("fa", "docs/fa").build();
        let root = SectionNode::builder("root", "docs")
            .source("content")
            .build()
            .child(fa.with_children(vec![parts, scientists]));

        let names: Vec<_> = root.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["root", "fa", "parts", "scientists"]);
    }

    #[test]
    fn test_hooks_debug_lists_set_hooks() {
        let node = SectionNode::builder("s", "out")
            .data_extractor(|_| Ok(DataRecord::new()))
            .build();
        let debug = format!("{:?}", node.hooks);
        assert!(debug.contains("data_extractor"));
        assert!(!debug.contains("index_writer"));
    }
}
