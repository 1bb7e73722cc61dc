//! Index stage: one aggregate document per section.

use tracing::{debug, info, warn};

use super::document::IndexRow;
use super::error::PipelineError;
use super::render::{Escape, IndexContext, Template};
use super::rules::Rules;
use super::section::SectionNode;
use super::selector::Selector;
use crate::util::{walk_files, write_atomic};

/// Collect one row per indexable file under the destination and render the
/// index document. Returns the number of rows written.
///
/// Does nothing when indexing is disabled or no row extractor is set.
pub fn generate(node: &SectionNode, exceptions: &Selector) -> Result<usize, PipelineError> {
    if let Some(hook) = &node.hooks.index {
        debug!(section = %node.name, "delegating index generation to custom hook");
        hook(node, exceptions)?;
        return Ok(0);
    }

    let Some(extract) = &node.hooks.index_extractor else {
        debug!(section = %node.name, "no index row extractor; skipping index");
        return Ok(0);
    };
    if !node.index.enabled {
        return Ok(0);
    }
    let Some(template_path) = &node.index_template_path else {
        warn!(
            section = %node.name,
            "indexing is enabled but no index template is set; skipping index"
        );
        return Ok(0);
    };

    let selectors = Selector::compile(&node.rules.index_selectors)?;
    let destination = &node.destination_path;
    let max_depth = (!node.rules.index_recursive).then_some(1);
    let files = walk_files(destination, max_depth).map_err(PipelineError::io(destination))?;

    let mut rows: Vec<IndexRow> = Vec::new();
    for file in &files {
        if Rules::applies_at(node.rules.index_recursive, file.depth)
            && selectors.matches(&file.name)
            && !exceptions.matches(&file.name)
        {
            rows.push(extract(&file.path, &file.relative)?);
        }
    }

    let template = Template::load(template_path, Escape::Html)?;

    // Copy-only or empty sections may not have created it yet.
    std::fs::create_dir_all(destination).map_err(PipelineError::io(destination))?;

    match &node.hooks.index_writer {
        Some(write) => write(node, &template, &rows)?,
        None => {
            let rendered = template.render_value(&IndexContext {
                title: &node.index.title,
                index: &rows,
            })?;
            let path = node.index_path();
            write_atomic(&path, rendered.as_bytes()).map_err(PipelineError::io(&path))?;
        }
    }

    info!(section = %node.name, rows = rows.len(), "index written");
    Ok(rows.len())
}
