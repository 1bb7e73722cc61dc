//! Per-section selection and behavior rules.
//!
//! These types are pure data - constructing them performs no I/O and compiles
//! no patterns. Patterns are compiled by the stage that uses them.

use serde::{Deserialize, Serialize};

use super::selector::{MATCH_EVERYTHING, MATCH_HTML, MATCH_MD};

/// Which files each stage acts upon, and how.
///
/// Recursion must stay optional: a root section usually wants to convert its
/// home page and copy a favicon without descending into the directories that
/// belong to its child sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Ask the operator before wiping the destination tree.
    pub nuke_destination: bool,

    pub convert_selectors: Vec<String>,
    pub convert_enabled: bool,
    pub convert_recursive: bool,
    pub convert_overwrite: bool,

    pub copy_selectors: Vec<String>,
    pub copy_enabled: bool,
    pub copy_recursive: bool,
    pub copy_overwrite: bool,

    pub index_selectors: Vec<String>,
    pub index_recursive: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            nuke_destination: false,

            convert_selectors: vec![MATCH_MD.to_string()],
            convert_enabled: true,
            convert_recursive: true,
            convert_overwrite: true,

            copy_selectors: vec![MATCH_EVERYTHING.to_string()],
            copy_enabled: false,
            copy_recursive: true,
            copy_overwrite: false,

            index_selectors: vec![MATCH_HTML.to_string()],
            index_recursive: true,
        }
    }
}

impl Rules {
    /// Whether a stage with the given recursion flag acts on files at `depth`
    /// (1 = directly inside the walked root).
    pub(crate) fn applies_at(recursive: bool, depth: usize) -> bool {
        recursive || depth <= 1
    }
}
