//! Rendering options and configuration.

use super::JsonFormat;

/// Options for rendering composed documents.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Font size for text and row blocks, in points
    pub font_size: f32,

    /// Distance between baselines of wrapped lines inside one block
    pub line_height: f32,

    /// Base-14 font used by the PDF renderer
    pub font_name: String,

    /// Layout of JSON output
    pub json_format: JsonFormat,

    /// Prefix for generated document titles (`<title> record-3-1001`)
    pub title: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size (clamped to at least 1pt).
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size.max(1.0);
        self
    }

    /// Set the line height (clamped to at least 1pt).
    pub fn with_line_height(mut self, height: f32) -> Self {
        self.line_height = height.max(1.0);
        self
    }

    /// Set the PDF font name.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Set the JSON output format.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the document title prefix.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            line_height: 12.0,
            font_name: "Helvetica".to_string(),
            json_format: JsonFormat::Pretty,
            title: "Document".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.font_size, 10.0);
        assert_eq!(options.line_height, 12.0);
        assert_eq!(options.font_name, "Helvetica");
        assert_eq!(options.json_format, JsonFormat::Pretty);
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .with_font_size(0.0)
            .with_line_height(14.0)
            .with_font_name("Courier")
            .with_json_format(JsonFormat::Compact)
            .with_title("Invoice");
        assert_eq!(options.font_size, 1.0);
        assert_eq!(options.line_height, 14.0);
        assert_eq!(options.font_name, "Courier");
        assert_eq!(options.title, "Invoice");
    }
}
