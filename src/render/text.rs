//! Plain text proof rendering for composed documents.

use std::fmt::Write;

use crate::compose::ComposedDocument;
use crate::error::Result;
use crate::model::ContentType;

use super::{DocumentRenderer, RenderOptions};

/// Render a proof listing: every page and every block with its region.
pub fn to_text(doc: &ComposedDocument, options: &RenderOptions) -> Result<String> {
    let mut output = String::new();

    let _ = writeln!(output, "{} {}", options.title, doc.record);
    for page in &doc.pages {
        let _ = write!(
            output,
            "\n== Page {} (layout page {}",
            page.sequence, page.number
        );
        if page.is_continuation() {
            let _ = write!(output, ", continuation {}", page.continuation);
        }
        let _ = writeln!(output, ", {}x{}) ==", page.size.width, page.size.height);

        for block in &page.blocks {
            let tag = match (&block.content_type, block.row) {
                (ContentType::Array(name), Some(row)) => format!("A:{}[{}]", name, row),
                (content_type, _) => content_type.to_string(),
            };
            let region = block.region.to_string();
            let _ = writeln!(output, "{:<24} {:<12} {}", region, tag, block.resolved_value);
        }
    }

    for warning in &doc.warnings {
        let _ = writeln!(output, "\nwarning: {}", warning);
    }

    Ok(output)
}

/// Writes a human-readable proof of the composed page sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    /// Create a new text renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for TextRenderer {
    fn name(&self) -> &str {
        "text"
    }

    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, doc: &ComposedDocument, options: &RenderOptions) -> Result<Vec<u8>> {
        to_text(doc, options).map(String::into_bytes)
    }
}
