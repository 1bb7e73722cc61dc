pub mod content;
pub mod document;
pub mod error;
pub mod generator;
pub mod html;
pub mod index;
pub mod markdown;
pub mod nuke;
pub mod qr;
pub mod render;
pub mod reverse;
pub mod rules;
pub mod section;
pub mod selector;

pub use error::PipelineError;
pub use generator::{GenerateOptions, Generator, RunSummary};
pub use nuke::{NukeDecision, NukeGate, NukeState};
pub use qr::{QrGrid, QrOptions};
pub use rules::Rules;
pub use section::{Hooks, SectionNode};
pub use selector::{DEFAULT_EXCEPTIONS, Selector};
