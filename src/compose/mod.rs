//! Composition of loaded inputs into positioned, resolved page content.

mod engine;
mod options;
mod output;
mod resolver;
mod stats;

pub use engine::Composer;
pub use options::{ComposeOptions, DEFAULT_ROW_HEIGHT};
pub use output::{
    BatchReport, ComposedDocument, ComposedPage, PositionedContentBlock, RecordFailure, RunOutcome,
    Warning,
};
pub use resolver::{resolve_str, Resolver};
pub use stats::CompositionStats;
