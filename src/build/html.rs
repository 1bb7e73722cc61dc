//! Lightweight field extraction from generated HTML pages.
//!
//! Only the structural markers the site's own templates produce are
//! recognized: `<title>`, the first `<h1>`, `<meta name="description">` and
//! the `<main>` (or `<body>`) element.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use super::document::{DataRecord, IndexRow};
use super::error::PipelineError;
use crate::util::to_url_path;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\s+name\s*=\s*["']description["']\s+content\s*=\s*["']([^"']*)["']"#)
        .unwrap()
});
static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main[^>]*>(.*?)</main>").unwrap());
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Fields recognized in one HTML page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageFields {
    pub title: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl PageFields {
    pub fn parse(html: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(html)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Self {
            title: capture(&TITLE_RE).map(|t| strip_tags(&t)),
            header: capture(&H1_RE).map(|h| strip_tags(&h)),
            description: capture(&DESCRIPTION_RE),
            content: capture(&MAIN_RE)
                .or_else(|| capture(&BODY_RE))
                .map(|c| c.trim().to_string()),
        }
    }
}

fn strip_tags(fragment: &str) -> String {
    TAG_RE.replace_all(fragment, "").trim().to_string()
}

fn read_page(path: &Path) -> Result<PageFields, PipelineError> {
    let html = std::fs::read_to_string(path).map_err(PipelineError::io(path))?;
    Ok(PageFields::parse(&html))
}

/// Default index row: `{filename, link, title, header, description}`.
///
/// `relative` is the file's path under the indexed directory, which is also
/// where the index document lives, so it doubles as the link.
pub fn extract_index_row(path: &Path, relative: &Path) -> Result<IndexRow, PipelineError> {
    let fields = read_page(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(json!({
        "filename": filename,
        "link": to_url_path(relative),
        "title": fields.title.clone().unwrap_or_else(|| filename.clone()),
        "header": fields.header,
        "description": fields.description,
    }))
}

/// Default reverse extractor: `{title, header, content}` recovered from a
/// published page, for re-rendering through a source template.
pub fn extract_page_record(path: &Path) -> Result<DataRecord, PipelineError> {
    let fields = read_page(path)?;
    let Some(content) = fields.content else {
        return Err(PipelineError::extraction(path, "no <main> or <body> element"));
    };

    let mut record = DataRecord::new();
    record.insert("title".into(), fields.title.into());
    record.insert("header".into(), fields.header.into());
    record.insert("content".into(), content.into());
    Ok(record)
}
