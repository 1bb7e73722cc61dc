//! Rule-driven generation of a static site from a tree of sections.
//!
//! Each [`build::SectionNode`] names a source and a destination directory
//! and carries the [`build::Rules`] deciding which files are converted,
//! copied, indexed or turned into QR codes. A [`build::Generator`] walks the
//! tree and runs the stages for every node.

pub mod build;
pub mod config;
pub mod util;
