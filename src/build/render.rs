use std::error::Error as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::util::walk_files;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("failed to load template {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },
}

/// Whether interpolated values are HTML-escaped.
///
/// Content and QR page templates are rendered raw so authored HTML inside
/// Markdown (fonts, spans, tables) survives. Index templates escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    Html,
    Raw,
}

/// A single file-backed template, wrapping Tera.
pub struct Template {
    tera: Tera,
    name: String,
    path: PathBuf,
}

impl Template {
    /// Load the template at `path`.
    ///
    /// Files next to it with the same extension are registered under their
    /// file names, so `{% include %}` and `{% extends %}` can refer to them.
    /// A sibling that does not parse is left out; if the set still fails to
    /// link (an `extends` of a missing parent) the template loads alone.
    pub fn load(path: &Path, escape: Escape) -> Result<Self, RenderError> {
        if !path.is_file() {
            return Err(RenderError::TemplateNotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        let load_error = |message: String| RenderError::Load {
            path: path.to_path_buf(),
            message,
        };
        let source = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;

        let mut tera = Tera::default();
        let siblings = sibling_templates(path);
        if !siblings.is_empty() {
            let mut with_siblings = Tera::default();
            let all = siblings.iter().map(|(n, c)| (n.as_str(), c.as_str()));
            match with_siblings.add_raw_templates(all.chain([(name.as_str(), source.as_str())])) {
                Ok(()) => tera = with_siblings,
                Err(e) => debug!(
                    template = %path.display(),
                    "loading without sibling templates: {}",
                    error_chain(&e)
                ),
            }
        }
        if tera.get_template_names().next().is_none() {
            tera.add_raw_template(&name, &source)
                .map_err(|e| load_error(error_chain(&e)))?;
        }

        // Tera decides escaping by template-name suffix; the empty suffix
        // matches every name.
        match escape {
            Escape::Html => tera.autoescape_on(vec![""]),
            Escape::Raw => tera.autoescape_on(vec![]),
        }

        Ok(Self {
            tera,
            name,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render with a prepared context.
    pub fn render(&self, context: &Context) -> Result<String, RenderError> {
        self.tera
            .render(&self.name, context)
            .map_err(|e| RenderError::Render {
                template: self.path.display().to_string(),
                message: error_chain(&e),
            })
    }

    /// Render any serializable map-like value as the top-level context.
    pub fn render_value<T: Serialize>(&self, value: &T) -> Result<String, RenderError> {
        let context = Context::from_serialize(value).map_err(|e| RenderError::Render {
            template: self.path.display().to_string(),
            message: error_chain(&e),
        })?;
        self.render(&context)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Files beside `path` sharing its extension that read and parse as
/// templates, as `(file name, source)`.
fn sibling_templates(path: &Path) -> Vec<(String, String)> {
    let (Some(dir), extension) = (path.parent(), path.extension()) else {
        return Vec::new();
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let Ok(files) = walk_files(dir, Some(1)) else {
        return Vec::new();
    };

    files
        .into_iter()
        .filter(|f| f.path.extension() == extension && f.path.file_name() != path.file_name())
        .filter_map(|f| {
            let source = std::fs::read_to_string(&f.path).ok()?;
            tera::Template::new(&f.name, None, &source).ok()?;
            Some((f.name, source))
        })
        .collect()
}

/// Tera keeps the useful part of an error (e.g. which variable is missing)
/// in the source chain, not in the top-level message.
fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Context passed to index templates.
#[derive(Debug, Serialize)]
pub struct IndexContext<'a> {
    pub title: &'a str,
    pub index: &'a [serde_json::Value],
}

/// Context passed to QR page templates.
#[derive(Debug, Serialize)]
pub struct QrPageContext<'a> {
    pub title: &'a str,
    pub table: &'a [Vec<String>],
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_template(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = Template::load(&dir.path().join("nope.html"), Escape::Raw).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_raw_does_not_escape() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "page.html", "<div>{{ content }}</div>");
        let template = Template::load(&path, Escape::Raw).unwrap();

        let out = template
            .render_value(&serde_json::json!({ "content": "<b>bold</b>" }))
            .unwrap();
        assert_eq!(out, "<div><b>bold</b></div>");
    }

    #[test]
    fn test_html_escapes_regardless_of_name() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "index.tpl", "{{ title }}");
        let template = Template::load(&path, Escape::Html).unwrap();

        let out = template
            .render_value(&serde_json::json!({ "title": "<Parts>" }))
            .unwrap();
        assert_eq!(out, "&lt;Parts&gt;");
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "page.html", "{{ missing }}");
        let template = Template::load(&path, Escape::Raw).unwrap();

        let err = template
            .render_value(&serde_json::json!({ "title": "X" }))
            .unwrap_err();
        assert!(matches!(err, RenderError::Render { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_malformed_template_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, "bad.html", "{% if %}");
        assert!(matches!(
            Template::load(&path, Escape::Raw),
            Err(RenderError::Load { .. })
        ));
    }

    #[test]
    fn test_sibling_templates_resolve() {
        let dir = TempDir::new().unwrap();
        write_template(&dir, "base.html", "<main>{% block body %}{% endblock %}</main>");
        write_template(&dir, "footer.html", "<footer>{{ title }}</footer>");
        let path = write_template(
            &dir,
            "page.html",
            "{% extends \"base.html\" %}{% block body %}{{ content }}{% include \"footer.html\" %}{% endblock %}",
        );
        let template = Template::load(&path, Escape::Raw).unwrap();

        let out = template
            .render_value(&serde_json::json!({ "title": "X", "content": "hi" }))
            .unwrap();
        assert_eq!(out, "<main>hi<footer>X</footer></main>");
    }

    #[test]
    fn test_broken_sibling_is_ignored() {
        let dir = TempDir::new().unwrap();
        write_template(&dir, "broken.html", "{% if %}");
        write_template(&dir, "footer.html", "!");
        std::fs::write(dir.path().join("logo.png"), [0xffu8, 0xd8, 0x00]).unwrap();
        let path = write_template(&dir, "page.html", "{{ title }}{% include \"footer.html\" %}");
        let template = Template::load(&path, Escape::Raw).unwrap();

        let out = template.render_value(&serde_json::json!({ "title": "X" })).unwrap();
        assert_eq!(out, "X!");
    }

    #[test]
    fn test_qr_page_context() {
        let dir = TempDir::new().unwrap();
        let path = write_template(
            &dir,
            "qr.html",
            "{{ title }}|{% for row in table %}{{ row | join(sep=\",\") }};{% endfor %}",
        );
        let template = Template::load(&path, Escape::Raw).unwrap();
        let table = vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]];

        let out = template
            .render_value(&QrPageContext {
                title: "QR Codes 1",
                table: &table,
            })
            .unwrap();
        assert_eq!(out, "QR Codes 1|a,b;c;");
    }
}
