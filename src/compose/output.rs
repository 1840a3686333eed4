//! Composition output: positioned blocks, pages, documents and batch reports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats::CompositionStats;
use crate::error::Error;
use crate::model::{ContentType, Page, PageSize, RecordId, Region};

/// A resolved value placed at a region; the unit a renderer consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedContentBlock {
    /// Where the block goes
    pub region: Region,
    /// How the block is rendered
    pub content_type: ContentType,
    /// Value with every placeholder substituted
    pub resolved_value: String,
    /// Source line of the content rule (`None` for the page image)
    pub rule_line: Option<usize>,
    /// 1-indexed array row, for fanned-out blocks
    pub row: Option<usize>,
}

/// One output page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPage {
    /// 1-indexed position in the document
    pub sequence: usize,
    /// Page number of the layout page this was composed from
    pub number: u16,
    /// 0 for the layout page itself, 1.. for synthesized continuation pages
    pub continuation: usize,
    /// Page size
    pub size: PageSize,
    /// Blocks in placement order
    pub blocks: Vec<PositionedContentBlock>,
}

impl ComposedPage {
    /// Start an empty output page for a layout page.
    pub fn from_layout(page: &Page, continuation: usize) -> Self {
        Self {
            sequence: 0,
            number: page.number,
            continuation,
            size: page.size,
            blocks: Vec::new(),
        }
    }

    /// Check if this is a synthesized continuation page.
    pub fn is_continuation(&self) -> bool {
        self.continuation > 0
    }
}

/// A non-fatal condition noticed during composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Fanned-out rows did not fit a part on a page without overflow.
    RowsDropped {
        /// Layout page number
        page: u16,
        /// Zone name
        zone: String,
        /// Part name
        part: String,
        /// Array the rows came from
        array: String,
        /// Rows that fit
        capacity: usize,
        /// Rows dropped
        dropped: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::RowsDropped {
                page,
                zone,
                part,
                array,
                capacity,
                dropped,
            } => write!(
                f,
                "{} row(s) of {} dropped: part {}_{}_{} holds {} and overflow is off",
                dropped, array, page, zone, part, capacity
            ),
        }
    }
}

/// The composed page sequence of one customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedDocument {
    /// Record the document was composed for
    pub record: RecordId,
    /// Output pages in order
    pub pages: Vec<ComposedPage>,
    /// Non-fatal warnings
    pub warnings: Vec<Warning>,
    /// Composition statistics
    pub stats: CompositionStats,
}

impl ComposedDocument {
    /// Number of output pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Iterate over every block in page order.
    pub fn blocks(&self) -> impl Iterator<Item = &PositionedContentBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Plain text of every non-graphic block, one per line.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in self.blocks() {
            if block.content_type != ContentType::Graphic {
                out.push_str(&block.resolved_value);
                out.push('\n');
            }
        }
        out
    }
}

/// A customer record that produced no document.
#[derive(Debug)]
pub struct RecordFailure {
    /// The failed record
    pub record: RecordId,
    /// Where it failed (the page condition or content rule), if known
    pub location: Option<String>,
    /// Why it failed
    pub error: Error,
}

impl RecordFailure {
    /// Create a failure without a location.
    pub fn new(record: RecordId, error: Error) -> Self {
        Self {
            record,
            location: None,
            error,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "record {} at {}: {}", self.record, location, self.error),
            None => write!(f, "record {}: {}", self.record, self.error),
        }
    }
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every record produced a document
    Success,
    /// Some records produced documents, others failed
    PartialSuccess,
    /// No record produced a document
    Failure,
}

impl RunOutcome {
    /// Derive the outcome from success and failure counts.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (0, _) => RunOutcome::Failure,
            (_, 0) => RunOutcome::Success,
            _ => RunOutcome::PartialSuccess,
        }
    }

    /// Process exit status for the outcome (0, 2 or 1).
    pub fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::PartialSuccess => 2,
            RunOutcome::Failure => 1,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => f.write_str("success"),
            RunOutcome::PartialSuccess => f.write_str("partial success"),
            RunOutcome::Failure => f.write_str("failure"),
        }
    }
}

/// Result of composing a batch of customer records.
#[derive(Debug)]
pub struct BatchReport {
    /// Composed documents, ordered by record index
    pub documents: Vec<ComposedDocument>,
    /// Failed records, ordered by record index
    pub failures: Vec<RecordFailure>,
    /// Overall outcome
    pub outcome: RunOutcome,
    /// Statistics merged across documents
    pub stats: CompositionStats,
    /// When composition started
    pub started_at: DateTime<Utc>,
    /// When composition finished
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Build a report, ordering documents and failures and deriving the outcome.
    pub fn new(
        documents: Vec<ComposedDocument>,
        failures: Vec<RecordFailure>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut report = Self {
            documents,
            failures,
            outcome: RunOutcome::Failure,
            stats: CompositionStats::default(),
            started_at,
            finished_at: Utc::now(),
        };
        report.refresh();
        report
    }

    /// Number of records that produced a document.
    pub fn succeeded(&self) -> usize {
        self.documents.len()
    }

    /// Number of records that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Check if every record succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    /// Every warning in the batch, with its record.
    pub fn warnings(&self) -> impl Iterator<Item = (&RecordId, &Warning)> {
        self.documents
            .iter()
            .flat_map(|d| d.warnings.iter().map(move |w| (&d.record, w)))
    }

    /// Wall-clock duration of the batch.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Move a composed document to the failure list (for example after a render error).
    pub fn fail_document(&mut self, record: &RecordId, failure: RecordFailure) {
        self.documents.retain(|d| &d.record != record);
        self.failures.push(failure);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.documents.sort_by_key(|d| d.record.index);
        self.failures.sort_by_key(|f| f.record.index);
        self.outcome = RunOutcome::from_counts(self.documents.len(), self.failures.len());
        let mut stats = CompositionStats::default();
        for doc in &self.documents {
            stats.merge(&doc.stats);
        }
        self.stats = stats;
    }
}
