//! Filename selection with ordered regular expression collections.
//!
//! A [`Selector`] matches a filename when any of its patterns finds a match
//! anywhere in it. Case-insensitivity is expressed inside the pattern itself,
//! e.g. `(?i:^.*\.md$)`.

use regex::Regex;

pub const MATCH_EVERYTHING: &str = r".*";
pub const MATCH_NOTHING: &str = r"[^\w\W]";
pub const MATCH_MD: &str = r"(?i:^.*\.md$)";
pub const MATCH_HTML: &str = r"(?i:^.*\.html$)";
pub const MATCH_CSS: &str = r"(?i:^.*\.css$)";
/// TrueType fonts
pub const MATCH_TTF: &str = r"(?i:^.*\.ttf$)";
/// Web Open Font Format
pub const MATCH_WOFF: &str = r"(?i:^.*\.woff$)";
pub const MATCH_WOFF2: &str = r"(?i:^.*\.woff2$)";
pub const MATCH_INDEX: &str = r"index\.html";
pub const MATCH_QR_PAGES: &str = r"qr_codes_.+\.html";

/// Files no stage should ever pick up: generated indexes and QR pages.
pub const DEFAULT_EXCEPTIONS: &[&str] = &[MATCH_INDEX, MATCH_QR_PAGES];

#[derive(thiserror::Error, Debug)]
pub enum SelectorError {
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled, ordered collection of patterns.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    patterns: Vec<Regex>,
}

impl Selector {
    /// Compile every pattern up front. A single malformed pattern fails the
    /// whole collection.
    pub fn compile<I, S>(patterns: I) -> Result<Self, SelectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| SelectorError::Pattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// A selector that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if any pattern matches somewhere in `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The source text of each pattern, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

/// Owned copy of a pattern constant list, for option and rule defaults.
pub fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}
