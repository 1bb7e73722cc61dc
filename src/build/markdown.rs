//! Markdown rendering for extracted records.

use pulldown_cmark::{Options, Parser, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Translate configured extension names into parser options.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to an HTML fragment.
pub fn render_markdown(markdown: &str, options: Options) -> String {
    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        let html = render_markdown("# Hello\n\nWorld", options);

        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_tables_enabled_by_default() {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n", options);
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = render_markdown("<span class=\"fa\">x</span>", Options::empty());
        assert!(html.contains("<span class=\"fa\">x</span>"));
    }

    #[test]
    fn test_invalid_extension() {
        let config = MarkdownConfig {
            extensions: vec!["not_a_real_extension".to_string()],
        };
        assert!(parser_options(&config).is_err());
    }
}
