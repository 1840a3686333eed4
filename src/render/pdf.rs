//! Minimal PDF rendering with `lopdf`.
//!
//! One PDF page per composed page. Layout coordinates grow downward from the
//! top edge, so every y value is flipped against the page height. Text and
//! row blocks are drawn with a single base-14 font; graphic blocks become a
//! stroked frame labelled with the graphic name.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::compose::{ComposedDocument, ComposedPage, PositionedContentBlock};
use crate::error::Result;
use crate::model::{ContentType, Region};

use super::{DocumentRenderer, RenderOptions};

const FONT_KEY: &str = "F1";
const LABEL_PADDING: f32 = 2.0;

/// Writes one PDF per composed document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a new PDF renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extension(&self) -> &str {
        "pdf"
    }

    fn render(&self, doc: &ComposedDocument, options: &RenderOptions) -> Result<Vec<u8>> {
        to_pdf(doc, options)
    }
}

/// Render a composed document to PDF bytes.
pub fn to_pdf(doc: &ComposedDocument, options: &RenderOptions) -> Result<Vec<u8>> {
    let mut document = Document::with_version("1.7");
    let pages_id = document.new_object_id();

    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(options.font_name.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_KEY => font_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let content = page_content(page, options);
        let content_id = document.add_object(Stream::new(Dictionary::new(), content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (page.size.width as i64).into(),
                (page.size.height as i64).into(),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let title = format!("{} {}", options.title, doc.record.label());
    let creation_date = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = document.add_object(dictionary! {
        "Title" => Object::string_literal(encode_text(&title)),
        "Producer" => Object::string_literal(format!("pagebind {}", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(creation_date),
    });
    document.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    document.save_to(&mut bytes)?;
    log::debug!(
        "Rendered record {} as PDF: {} page(s), {} bytes",
        doc.record,
        page_ids.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn page_content(page: &ComposedPage, options: &RenderOptions) -> Content {
    let mut ctx = PageContext::new(page.size.height as f32, options);
    for block in &page.blocks {
        ctx.draw_block(block);
    }
    ctx.finish()
}

struct PageContext<'a> {
    page_height: f32,
    options: &'a RenderOptions,
    content: Content,
}

impl<'a> PageContext<'a> {
    fn new(page_height: f32, options: &'a RenderOptions) -> Self {
        Self {
            page_height,
            options,
            content: Content { operations: vec![] },
        }
    }

    fn finish(self) -> Content {
        self.content
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    fn draw_block(&mut self, block: &PositionedContentBlock) {
        match block.content_type {
            ContentType::Graphic => self.draw_graphic(&block.region, &block.resolved_value),
            ContentType::Text | ContentType::Array(_) => {
                self.draw_text(&block.region, &block.resolved_value)
            }
        }
    }

    fn draw_graphic(&mut self, region: &Region, name: &str) {
        let x = region.x_start as f32;
        let y = self.page_height - region.y_end as f32;
        self.push("w", vec![0.5f32.into()]);
        self.push(
            "re",
            vec![
                x.into(),
                y.into(),
                (region.width() as f32).into(),
                (region.height() as f32).into(),
            ],
        );
        self.push("S", vec![]);
        self.draw_text(region, name);
    }

    fn draw_text(&mut self, region: &Region, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let font_size = self.options.font_size;
        let line_height = self.options.line_height;
        let bottom = region.y_end as f32;
        let x = region.x_start as f32 + LABEL_PADDING;
        let mut baseline = region.y_start as f32 + font_size * 0.8;

        self.push("BT", vec![]);
        self.push("Tf", vec![FONT_KEY.into(), font_size.into()]);
        let mut first = true;
        for line in text.lines() {
            // Lines below the region are clipped, except the first.
            if !first && baseline > bottom {
                break;
            }
            let pdf_y = self.page_height - baseline;
            self.push("Td", vec![x.into(), pdf_y.into()]);
            self.push("Tj", vec![Object::string_literal(encode_text(line))]);
            // Td is relative to the start of the current line.
            self.push("Td", vec![(-x).into(), (-pdf_y).into()]);
            baseline += line_height;
            first = false;
        }
        self.push("ET", vec![]);
    }
}

/// Encode text for a WinAnsi base-14 font; characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}
