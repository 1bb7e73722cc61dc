//! Site description resolution.
//!
//! This module turns a loaded [`SiteConfig`] into what the generator runs:
//! a [`SectionNode`] tree with the default extractors wired in and paths
//! made absolute against the config file's directory, plus
//! [`GenerateOptions`].

use std::path::{Path, PathBuf};

use crate::build::document::{RecordShape, extract_markdown_record};
use crate::build::generator::GenerateOptions;
use crate::build::html::{extract_index_row, extract_page_record};
use crate::build::qr::{QrGrid, QrOptions};
use crate::build::section::SectionNode;

use super::types::{GenerateConfig, MarkdownConfig, SectionConfig};
use super::{ConfigError, SiteConfig};

impl SiteConfig {
    /// Build the section tree, resolving relative paths against `base_path`.
    pub fn section_tree(&self, base_path: &Path) -> SectionNode {
        self.root.to_node(base_path, &self.markdown)
    }

    pub fn generate_options(&self) -> Result<GenerateOptions, ConfigError> {
        self.generate.to_options()
    }
}

impl GenerateConfig {
    pub fn to_options(&self) -> Result<GenerateOptions, ConfigError> {
        let grid = QrGrid::new(self.qr_grid.rows, self.qr_grid.cols)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        Ok(GenerateOptions {
            content_exceptions: self.content_exceptions.clone(),
            index: self.index,
            index_exceptions: self.index_exceptions.clone(),
            qr: self.qr,
            qr_options: QrOptions {
                images: self.qr_images,
                image_exceptions: self.qr_image_exceptions.clone(),
                pages: self.qr_pages,
                page_exceptions: self.qr_page_exceptions.clone(),
                grid,
                filename_fmt: self.qr_filename_fmt.clone(),
                title_fmt: self.qr_title_fmt.clone(),
            },
            pass_through: self.pass_through,
        })
    }
}

impl SectionConfig {
    /// Build this section and its children.
    ///
    /// Markdown conversion and reverse extraction are always wired; the index
    /// row extractor only when an index template is configured, so sections
    /// without one skip indexing quietly.
    pub fn to_node(&self, base_path: &Path, markdown: &MarkdownConfig) -> SectionNode {
        let resolve = |path: &Path| -> PathBuf {
            if path.is_relative() {
                base_path.join(path)
            } else {
                path.to_path_buf()
            }
        };

        let mut builder = SectionNode::builder(&self.name, resolve(&self.destination))
            .rules(self.rules.clone())
            .index(self.index.clone())
            .qr(self.qr.clone());

        if let Some(source) = &self.source {
            builder = builder.source(resolve(source));
        }
        if let Some(prefix) = &self.url_prefix {
            builder = builder.url_prefix(prefix.clone());
        }
        if let Some(path) = &self.templates.destination {
            builder = builder.destination_template(resolve(path));
        }
        if let Some(path) = &self.templates.source {
            builder = builder.source_template(resolve(path));
        }
        if let Some(path) = &self.templates.qr_pages {
            builder = builder.qr_pages_template(resolve(path));
        }
        if let Some(path) = &self.templates.index {
            builder = builder
                .index_template(resolve(path))
                .index_extractor(extract_index_row);
        }
        if !self.record.required.is_empty() {
            builder = builder.record_shape(RecordShape::fields(self.record.required.iter()));
        }

        let extractor_config = markdown.clone();
        let mut node = builder
            .data_extractor(move |path| extract_markdown_record(path, &extractor_config))
            .build();
        node.hooks.reverse_extractor = Some(Box::new(extract_page_record));

        let children = self
            .children
            .iter()
            .map(|child| child.to_node(base_path, markdown))
            .collect();
        node.with_children(children)
    }
}
