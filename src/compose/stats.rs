//! Statistics collected during composition.

use super::output::PositionedContentBlock;
use crate::model::ContentType;
use serde::{Deserialize, Serialize};

/// Counters for one composed document, or merged across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionStats {
    /// Composed records
    pub record_count: u32,

    /// Output pages, continuation pages included
    pub page_count: u32,

    /// Pages synthesized for overflowing rows
    pub continuation_page_count: u32,

    /// Pages skipped because their condition was false
    pub skipped_page_count: u32,

    /// Content rules skipped because their condition was false
    pub skipped_rule_count: u32,

    /// Text blocks emitted
    pub text_block_count: u32,

    /// Graphic blocks emitted (page images included)
    pub graphic_block_count: u32,

    /// Fanned-out row blocks emitted
    pub row_block_count: u32,

    /// Rows dropped because a part was full and overflow was off
    pub rows_dropped: u32,

    /// Characters of resolved text (excluding whitespace)
    pub char_count: u32,
}

impl CompositionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of emitted blocks.
    pub fn block_count(&self) -> u32 {
        self.text_block_count + self.graphic_block_count + self.row_block_count
    }

    /// Count an emitted block.
    pub fn add_block(&mut self, block: &PositionedContentBlock) {
        match block.content_type {
            ContentType::Text => self.text_block_count += 1,
            ContentType::Graphic => self.graphic_block_count += 1,
            ContentType::Array(_) => self.row_block_count += 1,
        }
        if block.content_type != ContentType::Graphic {
            self.char_count += block
                .resolved_value
                .chars()
                .filter(|c| !c.is_whitespace())
                .count() as u32;
        }
    }

    /// Count an output page.
    pub fn add_page(&mut self, continuation: bool) {
        self.page_count += 1;
        if continuation {
            self.continuation_page_count += 1;
        }
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &CompositionStats) {
        self.record_count += other.record_count;
        self.page_count += other.page_count;
        self.continuation_page_count += other.continuation_page_count;
        self.skipped_page_count += other.skipped_page_count;
        self.skipped_rule_count += other.skipped_rule_count;
        self.text_block_count += other.text_block_count;
        self.graphic_block_count += other.graphic_block_count;
        self.row_block_count += other.row_block_count;
        self.rows_dropped += other.rows_dropped;
        self.char_count += other.char_count;
    }
}
