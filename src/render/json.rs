//! JSON rendering for composed documents.

use crate::compose::ComposedDocument;
use crate::error::{Error, Result};

use super::{DocumentRenderer, RenderOptions};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a composed document to JSON.
pub fn to_json(doc: &ComposedDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Writes the composed document as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    /// Create a new JSON renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn render(&self, doc: &ComposedDocument, options: &RenderOptions) -> Result<Vec<u8>> {
        to_json(doc, options.json_format).map(String::into_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{ComposedPage, CompositionStats, PositionedContentBlock};
    use crate::model::{ContentType, PageSize, RecordId, Region};

    fn document() -> ComposedDocument {
        ComposedDocument {
            record: RecordId::new(1, Some("1001".into())),
            pages: vec![ComposedPage {
                sequence: 1,
                number: 1,
                continuation: 0,
                size: PageSize {
                    width: 612,
                    height: 792,
                },
                blocks: vec![PositionedContentBlock {
                    region: Region::new(10, 200, 10, 30).unwrap(),
                    content_type: ContentType::Text,
                    resolved_value: "Hello World".into(),
                    rule_line: Some(1),
                    row: None,
                }],
            }],
            warnings: Vec::new(),
            stats: CompositionStats::default(),
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&document(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"resolved_value\""));
        assert!(json.contains("Hello World"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&document(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let back: ComposedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, document());
    }

    #[test]
    fn test_renderer_uses_options() {
        let options = RenderOptions::new().with_json_format(JsonFormat::Compact);
        let bytes = JsonRenderer::new().render(&document(), &options).unwrap();
        assert!(!bytes.contains(&b'\n'));
    }
}
