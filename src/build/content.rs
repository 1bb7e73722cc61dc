//! Content stage: convert and copy selected source files.

use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::render::{Escape, Template};
use super::rules::Rules;
use super::section::SectionNode;
use super::selector::Selector;
use crate::util::{WalkedFile, converted_path, copy_atomic, walk_files, write_atomic};

/// What the content stage did for one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContentReport {
    pub converted: usize,
    pub copied: usize,
}

/// Run the content stage for `node` on its own.
///
/// Files matching `exceptions` are never converted. A file picked for
/// conversion is never copied, even when its existing output is kept because
/// `convert_overwrite` is off. A node without a source path does nothing. The nuke rule is not enforced here; only the generator
/// asks for confirmation.
pub fn generate(
    node: &SectionNode,
    exceptions: &Selector,
) -> Result<ContentReport, PipelineError> {
    if node.rules.nuke_destination {
        warn!(
            section = %node.name,
            "nuke_destination is set but the content stage does not enforce it; \
             run the generator instead"
        );
    }
    run(node, exceptions)
}

pub(crate) fn run(
    node: &SectionNode,
    exceptions: &Selector,
) -> Result<ContentReport, PipelineError> {
    if let Some(hook) = &node.hooks.content {
        debug!(section = %node.name, "delegating content generation to custom hook");
        hook(node, exceptions)?;
        return Ok(ContentReport::default());
    }

    let Some(source_path) = &node.source_path else {
        return Ok(ContentReport::default());
    };

    let rules = &node.rules;
    let convert_selectors = Selector::compile(&rules.convert_selectors)?;
    let copy_selectors = Selector::compile(&rules.copy_selectors)?;

    let template = match (
        rules.convert_enabled,
        &node.hooks.data_extractor,
        &node.destination_template_path,
    ) {
        (false, _, _) => None,
        (true, Some(_), Some(path)) => Some(Template::load(path, Escape::Raw)?),
        (true, _, _) => {
            warn!(
                section = %node.name,
                "conversion is enabled but a data extractor or destination template is missing; \
                 converting nothing"
            );
            None
        }
    };

    // Neither flag recursive means nothing below the top level can match.
    let max_depth = (!rules.convert_recursive && !rules.copy_recursive).then_some(1);
    let files = walk_files(source_path, max_depth).map_err(PipelineError::io(source_path))?;

    let mut report = ContentReport::default();
    for file in &files {
        if let Some(template) = &template
            && Rules::applies_at(rules.convert_recursive, file.depth)
            && convert_selectors.matches(&file.name)
            && !exceptions.matches(&file.name)
        {
            // Selected for conversion: never copied, even when the existing
            // output is kept.
            if convert_file(node, template, file)? {
                report.converted += 1;
            }
            continue;
        }

        if rules.copy_enabled
            && Rules::applies_at(rules.copy_recursive, file.depth)
            && copy_selectors.matches(&file.name)
            && copy_file(node, file)?
        {
            report.copied += 1;
        }
    }

    info!(
        section = %node.name,
        converted = report.converted,
        copied = report.copied,
        "content stage finished"
    );
    Ok(report)
}

/// Returns false when the destination exists and may not be overwritten.
fn convert_file(
    node: &SectionNode,
    template: &Template,
    file: &WalkedFile,
) -> Result<bool, PipelineError> {
    let destination = node.destination_path.join(converted_path(&file.relative));
    if destination.exists() && !node.rules.convert_overwrite {
        return Ok(false);
    }

    let Some(extract) = &node.hooks.data_extractor else {
        return Ok(false);
    };

    debug!("converting '{}' to '{}'", file.path.display(), destination.display());
    let record = extract(&file.path)?;
    node.record_shape.validate(&file.path, &record)?;

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(PipelineError::io(parent))?;
    }

    match &node.hooks.data_writer {
        Some(write) => write(node, &destination, template, &record)?,
        None => {
            let rendered = template.render_value(&record).map_err(|e| {
                PipelineError::extraction(&file.path, format!("rendering failed: {e}"))
            })?;
            write_atomic(&destination, rendered.as_bytes())
                .map_err(PipelineError::io(&destination))?;
        }
    }
    Ok(true)
}

/// Copies keep the source's directory structure below the destination.
fn copy_file(node: &SectionNode, file: &WalkedFile) -> Result<bool, PipelineError> {
    let destination = node.destination_path.join(&file.relative);
    if destination.exists() && !node.rules.copy_overwrite {
        return Ok(false);
    }

    debug!("copying '{}' to '{}'", file.path.display(), destination.display());
    copy_atomic(&file.path, &destination).map_err(PipelineError::io(&destination))?;
    Ok(true)
}
