//! Extracted data records and the default front-matter extractor.
//!
//! A record is an opaque mapping handed to the destination template. The
//! pipeline never looks inside it beyond the optional [`RecordShape`] check.

use std::path::Path;

use serde::de::DeserializeOwned;

use super::error::PipelineError;
use super::markdown::{parser_options, render_markdown};
use crate::config::MarkdownConfig;

/// One extracted record: template variable name -> value.
pub type DataRecord = serde_json::Map<String, serde_json::Value>;

/// One index entry, passed through to the index template untouched.
pub type IndexRow = serde_json::Value;

/// Result of splitting front matter from markdown content.
#[derive(Debug)]
pub struct ParsedContent {
    /// Front matter fields (empty if the file has none)
    pub front_matter: serde_yaml::Mapping,
    /// The markdown content without the front matter block
    pub content: String,
}

/// Split and parse a YAML front matter block delimited by `---`:
///
/// ```markdown
/// ---
/// title: My Page
/// header: Something longer
/// ---
///
/// Body starts here
/// ```
///
/// A file without an opening delimiter, or without a closing one, is all
/// body. A block that is present but is not a YAML mapping is an error.
pub fn parse_front_matter(content: &str) -> Result<ParsedContent, serde_yaml::Error> {
    let content = content.trim_start_matches('\u{feff}');

    let Some(after_opening) = content.strip_prefix("---") else {
        return Ok(ParsedContent {
            front_matter: serde_yaml::Mapping::new(),
            content: content.to_string(),
        });
    };

    let Some(closing_pos) = after_opening.find("\n---") else {
        return Ok(ParsedContent {
            front_matter: serde_yaml::Mapping::new(),
            content: content.to_string(),
        });
    };

    let yaml_content = after_opening[..closing_pos].trim_start_matches(['\r', '\n']);

    // Skip "\n---" and the rest of the delimiter line.
    let rest = &after_opening[closing_pos + 4..];
    let body = match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim_start_matches(['\r', '\n']),
        None => "",
    };

    let front_matter = if yaml_content.trim().is_empty() {
        serde_yaml::Mapping::new()
    } else {
        serde_yaml::from_str(yaml_content)?
    };

    Ok(ParsedContent {
        front_matter,
        content: body.to_string(),
    })
}

/// Read a markdown file into a record: front matter fields, `content` (the
/// raw body) and `content_html` (the body rendered to HTML).
pub fn extract_markdown_record(
    path: &Path,
    markdown_config: &MarkdownConfig,
) -> Result<DataRecord, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(PipelineError::io(path))?;
    let parsed = parse_front_matter(&raw)
        .map_err(|e| PipelineError::extraction(path, format!("invalid front matter: {e}")))?;
    let options = parser_options(markdown_config)
        .map_err(|e| PipelineError::extraction(path, e.to_string()))?;

    let mut record = match serde_json::to_value(&parsed.front_matter) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) => DataRecord::new(),
        Err(e) => {
            return Err(PipelineError::extraction(
                path,
                format!("front matter cannot be used as template data: {e}"),
            ));
        }
    };

    let content_html = render_markdown(&parsed.content, options);
    record.insert("content".into(), parsed.content.into());
    record.insert("content_html".into(), content_html.into());
    Ok(record)
}

/// The declared shape of one extracted record.
pub enum RecordShape {
    /// Anything goes.
    Any,
    /// Every listed field must be present.
    Fields(Vec<String>),
    /// The record must deserialize into a specific type.
    Typed {
        name: &'static str,
        check: fn(&DataRecord) -> Result<(), String>,
    },
}

impl RecordShape {
    /// Require records to deserialize into `T`.
    pub fn typed<T: DeserializeOwned>() -> Self {
        fn check<T: DeserializeOwned>(record: &DataRecord) -> Result<(), String> {
            serde_json::from_value::<T>(serde_json::Value::Object(record.clone()))
                .map(|_| ())
                .map_err(|e| e.to_string())
        }

        RecordShape::Typed {
            name: std::any::type_name::<T>(),
            check: check::<T>,
        }
    }

    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RecordShape::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Check `record`, naming `path` in the error.
    pub fn validate(&self, path: &Path, record: &DataRecord) -> Result<(), PipelineError> {
        match self {
            RecordShape::Any => Ok(()),
            RecordShape::Fields(fields) => {
                let missing: Vec<&str> = fields
                    .iter()
                    .filter(|f| !record.contains_key(f.as_str()))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(PipelineError::extraction(
                        path,
                        format!("missing field(s): {}", missing.join(", ")),
                    ))
                }
            }
            RecordShape::Typed { name, check } => check(record).map_err(|e| {
                PipelineError::extraction(path, format!("record is not a valid {name}: {e}"))
            }),
        }
    }
}

impl Default for RecordShape {
    fn default() -> Self {
        RecordShape::Any
    }
}

impl std::fmt::Debug for RecordShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordShape::Any => write!(f, "Any"),
            RecordShape::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            RecordShape::Typed { name, .. } => f.debug_tuple("Typed").field(name).finish(),
        }
    }
}
