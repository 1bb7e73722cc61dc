//! Drives the stages over a section tree.

use std::io::{BufRead, Write};

use tracing::{debug, info};

use super::content;
use super::error::PipelineError;
use super::index;
use super::nuke::{NukeDecision, NukeGate};
use super::qr::{self, QrOptions};
use super::section::SectionNode;
use super::selector::{DEFAULT_EXCEPTIONS, Selector, owned};

/// Stage switches and exception lists for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub content_exceptions: Vec<String>,
    pub index: bool,
    pub index_exceptions: Vec<String>,
    pub qr: bool,
    pub qr_options: QrOptions,
    /// Children get these same options; otherwise they get the defaults.
    pub pass_through: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            content_exceptions: owned(DEFAULT_EXCEPTIONS),
            index: true,
            index_exceptions: owned(DEFAULT_EXCEPTIONS),
            qr: true,
            qr_options: QrOptions::default(),
            pass_through: true,
        }
    }
}

/// Totals over a whole tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub sections: usize,
    pub nuked: usize,
    pub converted: usize,
    pub copied: usize,
    pub indexed: usize,
    pub qr_images: usize,
    pub qr_pages: usize,
}

pub struct Generator {
    options: GenerateOptions,
}

impl Generator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate `node` and then its children, depth-first.
    ///
    /// Stops at the first error. An abort at the nuke gate surfaces as
    /// [`PipelineError::Aborted`] and nothing after it runs.
    pub fn run<R: BufRead, W: Write>(
        &self,
        node: &SectionNode,
        gate: &mut NukeGate<R, W>,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        run_node(node, &self.options, gate, &mut summary)?;
        Ok(summary)
    }
}

fn run_node<R: BufRead, W: Write>(
    node: &SectionNode,
    options: &GenerateOptions,
    gate: &mut NukeGate<R, W>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    info!(
        section = %node.name,
        url_prefix = node.public_url_prefix.as_deref().unwrap_or("-"),
        "generating section"
    );
    summary.sections += 1;

    if node.source_path.is_some() {
        generate_stages(node, options, gate, summary)?;
    } else {
        debug!(section = %node.name, "no source path; only visiting children");
    }

    let defaults;
    let child_options = if options.pass_through {
        options
    } else {
        defaults = GenerateOptions::default();
        &defaults
    };
    for child in &node.children {
        run_node(child, child_options, gate, summary)?;
    }
    Ok(())
}

fn generate_stages<R: BufRead, W: Write>(
    node: &SectionNode,
    options: &GenerateOptions,
    gate: &mut NukeGate<R, W>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let content_exceptions = Selector::compile(&options.content_exceptions)?;
    let index_exceptions = Selector::compile(&options.index_exceptions)?;

    if node.rules.nuke_destination && gate.confirm(node)? == NukeDecision::Removed {
        summary.nuked += 1;
    }

    if node.hooks.data_extractor.is_none() && node.hooks.content.is_none() {
        debug!(section = %node.name, "no data extractor; content stage will only copy");
    }
    let report = content::run(node, &content_exceptions)?;
    summary.converted += report.converted;
    summary.copied += report.copied;

    let can_index = node.hooks.index_extractor.is_some() || node.hooks.index.is_some();
    if options.index && node.index.enabled && can_index {
        summary.indexed += index::generate(node, &index_exceptions)?;
    } else {
        debug!(section = %node.name, "index not requested or no row extractor; skipping index");
    }

    if options.qr && node.qr.enabled {
        let report = qr::generate(node, &options.qr_options)?;
        summary.qr_images += report.images;
        summary.qr_pages += report.pages;
    } else {
        debug!(section = %node.name, "QR generation not requested; skipping");
    }
    Ok(())
}
