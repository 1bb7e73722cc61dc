//! Regenerate source markdown from published pages.
//!
//! Used once when a section's pages were authored as HTML and its sources
//! are being moved to markdown.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::document::DataRecord;
use super::error::PipelineError;
use super::render::{Escape, Template};
use super::section::SectionNode;
use super::selector::Selector;
use crate::util::{to_url_path, walk_files, write_atomic};

/// Walk the published `.html` pages of `node` and write one markdown file
/// per page under `source_path`, mirroring the destination layout.
///
/// With `dry_run` nothing is written; every page is still extracted. Returns
/// the markdown files written, or that would have been.
pub fn generate(
    node: &SectionNode,
    exceptions: &Selector,
    dry_run: bool,
) -> Result<Vec<PathBuf>, PipelineError> {
    let (Some(source_path), Some(template_path), Some(extract)) = (
        &node.source_path,
        &node.source_template_path,
        &node.hooks.reverse_extractor,
    ) else {
        warn!(
            section = %node.name,
            "reverse conversion needs a source path, a source template and a reverse extractor; skipping"
        );
        return Ok(Vec::new());
    };

    let template = Template::load(template_path, Escape::Raw)?;
    let destination = &node.destination_path;
    let files = walk_files(destination, None).map_err(PipelineError::io(destination))?;

    let mut targets = Vec::new();
    for file in files
        .iter()
        .filter(|f| f.name.ends_with(".html") && !exceptions.matches(&f.name))
    {
        let record = extract(&file.path)?;
        let target = source_path.join(file.relative.with_extension("md"));

        if dry_run {
            info!(
                page = %to_url_path(&file.relative),
                target = %target.display(),
                fields = ?record.keys().collect::<Vec<_>>(),
                "would write"
            );
        } else {
            write_source(&template, &target, &record)?;
        }
        targets.push(target);
    }
    Ok(targets)
}

fn write_source(
    template: &Template,
    target: &Path,
    record: &DataRecord,
) -> Result<(), PipelineError> {
    let rendered = template
        .render_value(record)
        .map_err(|e| PipelineError::extraction(target, format!("rendering failed: {e}")))?;
    write_atomic(target, rendered.as_bytes()).map_err(PipelineError::io(target))
}
