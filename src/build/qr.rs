//! QR stage: one QR image per published page, then printable grid pages.

use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, Luma};
use qrcode::QrCode;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::render::{Escape, QrPageContext, Template};
use super::section::SectionNode;
use super::selector::{DEFAULT_EXCEPTIONS, Selector, owned};
use crate::util::{file_stem, walk_files, write_atomic};

/// Rows of entry identifiers; one printable page.
pub type QrPage = Vec<Vec<String>>;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("failed to encode QR code for '{data}': {source}")]
    Qr {
        data: String,
        #[source]
        source: qrcode::types::QrError,
    },

    #[error("failed to write QR image for '{data}': {source}")]
    Image {
        data: String,
        #[source]
        source: image::ImageError,
    },
}

/// Turns a string into encoded image bytes.
pub trait QrEncoder {
    fn encode(&self, data: &str) -> Result<Vec<u8>, EncodeError>;
}

/// Black-on-white PNG with the default quiet zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrEncoder;

impl QrEncoder for PngQrEncoder {
    fn encode(&self, data: &str) -> Result<Vec<u8>, EncodeError> {
        let code = QrCode::new(data.as_bytes()).map_err(|source| EncodeError::Qr {
            data: data.to_string(),
            source,
        })?;
        let image = code.render::<Luma<u8>>().build();

        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|source| EncodeError::Image {
                data: data.to_string(),
                source,
            })?;
        Ok(bytes.into_inner())
    }
}

/// Page dimensions, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrGrid {
    rows: usize,
    cols: usize,
}

impl QrGrid {
    pub fn new(rows: usize, cols: usize) -> Result<Self, PipelineError> {
        if rows == 0 || cols == 0 {
            return Err(PipelineError::Config(format!(
                "QR page grid must be at least 1x1, got {rows}x{cols}"
            )));
        }
        Ok(Self { rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    fn is_full(&self, page: &QrPage) -> bool {
        page.len() >= self.rows && page.last().is_some_and(|row| row.len() >= self.cols)
    }

    /// Lay entries out row-major, first free slot, in the given order.
    pub fn paginate<I, S>(&self, entries: I) -> Vec<QrPage>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pages: Vec<QrPage> = Vec::new();
        for entry in entries {
            if pages.last().is_none_or(|page| self.is_full(page)) {
                pages.push(Vec::with_capacity(self.rows));
            }
            let Some(page) = pages.last_mut() else {
                continue;
            };
            if page.last().is_none_or(|row| row.len() >= self.cols) {
                page.push(Vec::with_capacity(self.cols));
            }
            if let Some(row) = page.last_mut() {
                row.push(entry.into());
            }
        }
        pages
    }
}

impl Default for QrGrid {
    fn default() -> Self {
        Self { rows: 5, cols: 4 }
    }
}

/// Replace every `{i}` in `fmt` with `i`.
pub fn format_index(fmt: &str, i: usize) -> String {
    fmt.replace("{i}", &i.to_string())
}

/// Per-run QR stage options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOptions {
    pub images: bool,
    pub image_exceptions: Vec<String>,
    pub pages: bool,
    pub page_exceptions: Vec<String>,
    pub grid: QrGrid,
    /// Page file name; `{i}` is the 1-based page number
    pub filename_fmt: String,
    /// Page title; `{i}` is the 1-based page number
    pub title_fmt: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            images: true,
            image_exceptions: owned(DEFAULT_EXCEPTIONS),
            pages: true,
            page_exceptions: owned(DEFAULT_EXCEPTIONS),
            grid: QrGrid::default(),
            filename_fmt: "qr_codes_{i}.html".to_string(),
            title_fmt: "QR Codes {i}".to_string(),
        }
    }
}

/// What the QR stage did for one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QrReport {
    pub images: usize,
    pub pages: usize,
}

/// Run image generation, then page generation, for `node`.
pub fn generate(node: &SectionNode, options: &QrOptions) -> Result<QrReport, PipelineError> {
    if let Some(hook) = &node.hooks.qr {
        debug!(section = %node.name, "delegating QR generation to custom hook");
        hook(node, options)?;
        return Ok(QrReport::default());
    }

    let mut report = QrReport::default();

    if options.images {
        let exceptions = Selector::compile(&options.image_exceptions)?;
        if node.public_url_prefix.is_none() {
            warn!(
                section = %node.name,
                "QR images requested but the section has no public URL prefix; skipping"
            );
        } else if let Some(hook) = &node.hooks.qr_images {
            debug!(section = %node.name, "delegating QR images to custom hook");
            hook(node, &exceptions)?;
        } else {
            report.images = generate_images(node, &exceptions, &PngQrEncoder)?;
        }
    }

    if options.pages && node.qr.pages_enabled {
        let exceptions = Selector::compile(&options.page_exceptions)?;
        report.pages = generate_pages(node, options, &exceptions)?;
    }

    info!(
        section = %node.name,
        images = report.images,
        pages = report.pages,
        "QR stage finished"
    );
    Ok(report)
}

/// Encode `public_url_prefix + stem` for every published `.html` page.
/// Returns the number of images written.
pub fn generate_images(
    node: &SectionNode,
    exceptions: &Selector,
    encoder: &dyn QrEncoder,
) -> Result<usize, PipelineError> {
    let Some(prefix) = &node.public_url_prefix else {
        return Ok(0);
    };

    let destination = &node.destination_path;
    let files = walk_files(destination, None).map_err(PipelineError::io(destination))?;
    let image_dir = node.qr_image_dir();

    let mut written = 0;
    for file in files
        .iter()
        .filter(|f| f.name.ends_with(".html") && !exceptions.matches(&f.name))
    {
        let stem = file_stem(&file.path);
        let url = format!("{prefix}{stem}");
        debug!("generating QR image for {url}");

        let png = encoder.encode(&url)?;
        let path = image_dir.join(format!("{stem}.png"));
        write_atomic(&path, &png).map_err(PipelineError::io(&path))?;
        written += 1;
    }
    Ok(written)
}

/// Built-in page layout: stems of the images under the section's image
/// directory, paginated in traversal order.
pub fn extract_pages(
    node: &SectionNode,
    grid: QrGrid,
    exceptions: &Selector,
) -> Result<Vec<QrPage>, PipelineError> {
    let image_dir = node.qr_image_dir();
    let files = walk_files(&image_dir, None).map_err(PipelineError::io(&image_dir))?;

    let stems = files
        .iter()
        .filter(|f| f.name.ends_with(".png") && !exceptions.matches(&f.name))
        .map(|f| file_stem(&f.path));
    Ok(grid.paginate(stems))
}

/// Render each page through the QR page template. Returns the number of
/// pages written.
pub fn generate_pages(
    node: &SectionNode,
    options: &QrOptions,
    exceptions: &Selector,
) -> Result<usize, PipelineError> {
    let Some(template_path) = &node.qr_pages_template_path else {
        warn!(section = %node.name, "no QR page template is set; skipping QR pages");
        return Ok(0);
    };

    let pages = match &node.hooks.qr_pages_extractor {
        Some(extract) => extract(node, options.grid, exceptions)?,
        None => extract_pages(node, options.grid, exceptions)?,
    };

    // Tables may carry authored markup.
    let template = Template::load(template_path, Escape::Raw)?;
    let pages_dir = node.qr_pages_dir();

    for (i, table) in pages.iter().enumerate() {
        let i = i + 1;
        let path: PathBuf = pages_dir.join(format_index(&options.filename_fmt, i));
        let title = format_index(&options.title_fmt, i);
        debug!("writing QR page '{}'", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(PipelineError::io(parent))?;
        }
        match &node.hooks.qr_table_writer {
            Some(write) => write(node, table, &template, &path, &title)?,
            None => {
                let rendered = template.render_value(&QrPageContext {
                    title: &title,
                    table,
                })?;
                write_atomic(&path, rendered.as_bytes()).map_err(PipelineError::io(&path))?;
            }
        }
    }
    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    fn page(rows: &[&[&str]]) -> QrPage {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_paginate_exact_layout() {
        let grid = QrGrid::new(2, 3).unwrap();
        let pages = grid.paginate(["a", "b", "c", "d", "e", "f", "g"]);

        assert_eq!(
            pages,
            vec![page(&[&["a", "b", "c"], &["d", "e", "f"]]), page(&[&["g"]])]
        );
    }

    #[test]
    fn test_paginate_keeps_every_entry_in_order() {
        for (rows, cols) in [(1, 1), (1, 4), (3, 1), (5, 4), (4, 7)] {
            let grid = QrGrid::new(rows, cols).unwrap();
            let entries: Vec<String> = (0..23).map(|n| n.to_string()).collect();
            let pages = grid.paginate(entries.clone());

            let flat: Vec<String> = pages.iter().flatten().flatten().cloned().collect();
            assert_eq!(flat, entries, "grid {rows}x{cols}");
            assert!(pages.iter().all(|p| p.len() <= rows));
            assert!(pages.iter().flatten().all(|r| !r.is_empty() && r.len() <= cols));
        }
    }

    #[test]
    fn test_paginate_empty() {
        assert!(QrGrid::default().paginate(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_zero_grid_rejected() {
        assert!(matches!(QrGrid::new(0, 4), Err(PipelineError::Config(_))));
        assert!(matches!(QrGrid::new(5, 0), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_format_index() {
        assert_eq!(format_index("qr_codes_{i}.html", 3), "qr_codes_3.html");
        assert_eq!(format_index("{i} of {i}", 2), "2 of 2");
        assert_eq!(format_index("static", 9), "static");
    }

    #[test]
    fn test_png_encoder() {
        let png = PngQrEncoder.encode("https://example.org/parts/pump").unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    struct Recorder(RefCell<Vec<String>>);

    impl QrEncoder for Recorder {
        fn encode(&self, data: &str) -> Result<Vec<u8>, EncodeError> {
            self.0.borrow_mut().push(data.to_string());
            Ok(data.as_bytes().to_vec())
        }
    }

    fn published(dir: &Path) -> PathBuf {
        let dst = dir.join("dst");
        std::fs::create_dir_all(dst.join("sub")).unwrap();
        for name in ["pump.html", "index.html", "qr_codes_1.html", "style.css", "sub/valve.html"] {
            std::fs::write(dst.join(name), "").unwrap();
        }
        dst
    }

    #[test]
    fn test_generate_images_names_and_urls() {
        let dir = TempDir::new().unwrap();
        let dst = published(dir.path());
        let node = SectionNode::builder("parts", &dst)
            .url_prefix("https://example.org/parts/")
            .build();
        let recorder = Recorder(RefCell::new(Vec::new()));

        let exceptions = Selector::compile(DEFAULT_EXCEPTIONS).unwrap();
        let written = generate_images(&node, &exceptions, &recorder).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            *recorder.0.borrow(),
            vec![
                "https://example.org/parts/pump".to_string(),
                "https://example.org/parts/valve".to_string()
            ]
        );
        assert_eq!(
            std::fs::read_to_string(dst.join("qr_codes/valve.png")).unwrap(),
            "https://example.org/parts/valve"
        );
        assert!(!dst.join("qr_codes/index.png").exists());
    }

    #[test]
    fn test_images_skipped_without_url_prefix() {
        let dir = TempDir::new().unwrap();
        let dst = published(dir.path());
        let node = SectionNode::builder("parts", &dst).build();
        let options = QrOptions {
            pages: false,
            ..QrOptions::default()
        };

        assert_eq!(generate(&node, &options).unwrap(), QrReport::default());
        assert!(!dst.join("qr_codes").exists());
    }

    fn node_with_images(dir: &Path, stems: &[&str]) -> SectionNode {
        let dst = dir.join("dst");
        let images = dst.join("qr_codes");
        std::fs::create_dir_all(&images).unwrap();
        for stem in stems {
            std::fs::write(images.join(format!("{stem}.png")), "").unwrap();
        }
        let template = dir.join("qr_page.html");
        std::fs::write(
            &template,
            "{{ title }}|{% for row in table %}{{ row | join(sep=\",\") }};{% endfor %}",
        )
        .unwrap();

        SectionNode::builder("parts", &dst)
            .qr_pages_template(&template)
            .build()
    }

    #[test]
    fn test_generate_pages_files_and_titles() {
        let dir = TempDir::new().unwrap();
        let node = node_with_images(dir.path(), &["g", "a", "b", "c", "d", "e", "f"]);
        let options = QrOptions {
            images: false,
            grid: QrGrid::new(2, 3).unwrap(),
            ..QrOptions::default()
        };

        let report = generate(&node, &options).unwrap();
        assert_eq!(report.pages, 2);

        let pages_dir = node.qr_pages_dir();
        assert_eq!(
            std::fs::read_to_string(pages_dir.join("qr_codes_1.html")).unwrap(),
            "QR Codes 1|a,b,c;d,e,f;"
        );
        assert_eq!(
            std::fs::read_to_string(pages_dir.join("qr_codes_2.html")).unwrap(),
            "QR Codes 2|g;"
        );
    }

    #[test]
    fn test_pages_without_template_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut node = node_with_images(dir.path(), &["a"]);
        node.qr_pages_template_path = None;

        let exceptions = Selector::empty();
        assert_eq!(generate_pages(&node, &QrOptions::default(), &exceptions).unwrap(), 0);
        assert!(!node.qr_pages_dir().exists());
    }

    #[test]
    fn test_missing_page_template_is_error() {
        let dir = TempDir::new().unwrap();
        let mut node = node_with_images(dir.path(), &["a"]);
        node.qr_pages_template_path = Some(dir.path().join("nope.html"));

        let err = generate_pages(&node, &QrOptions::default(), &Selector::empty()).unwrap_err();
        assert!(matches!(err, PipelineError::Render(_)));
    }

    #[test]
    fn test_custom_page_extractor_and_writer() {
        let dir = TempDir::new().unwrap();
        let mut node = node_with_images(dir.path(), &[]);
        node.hooks.qr_pages_extractor = Some(Box::new(|_, _, _| {
            Ok(vec![vec![vec!["x".to_string()]], vec![vec!["y".to_string()]]])
        }));
        node.hooks.qr_table_writer = Some(Box::new(|_, table, _, path, title| {
            std::fs::write(path, format!("{title}:{}", table[0][0]))
                .map_err(PipelineError::io(path))
        }));
        let options = QrOptions {
            title_fmt: "Sheet {i}".to_string(),
            filename_fmt: "sheet-{i}.txt".to_string(),
            ..QrOptions::default()
        };

        assert_eq!(generate_pages(&node, &options, &Selector::empty()).unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(node.qr_pages_dir().join("sheet-2.txt")).unwrap(),
            "Sheet 2:y"
        );
    }
}
