//! The composition engine.
//!
//! For each customer record the engine walks the layout page by page,
//! evaluates conditions, resolves content rules into positioned blocks and
//! fans array rules out across row slots, synthesizing continuation pages
//! where a page allows overflow.

use std::collections::HashMap;

use chrono::Utc;
use rayon::prelude::*;

use super::options::ComposeOptions;
use super::output::{
    BatchReport, ComposedDocument, ComposedPage, PositionedContentBlock, RecordFailure, Warning,
};
use super::resolver::Resolver;
use super::stats::CompositionStats;
use crate::error::{Error, Result};
use crate::model::{
    ContentRecord, ContentRules, ContentType, CustomerRecord, Layout, Page, Part, PartIndex, Row,
    VariableTable, Zone,
};
use crate::parser::CustomerData;

/// Composes customer records against shared, read-only inputs.
///
/// A `Composer` borrows the layout, rules and variables; it holds no
/// mutable state, so one instance serves every worker of a batch.
#[derive(Debug)]
pub struct Composer<'a> {
    layout: &'a Layout,
    content: &'a ContentRules,
    variables: &'a VariableTable,
    options: ComposeOptions,
    /// Rule indices per part, in source order
    index: HashMap<PartIndex, Vec<usize>>,
}

type RecordResult<T> = std::result::Result<T, (Option<String>, Error)>;

impl<'a> Composer<'a> {
    /// Create a composer, checking that every rule addresses an existing part.
    pub fn new(
        layout: &'a Layout,
        content: &'a ContentRules,
        variables: &'a VariableTable,
        options: ComposeOptions,
    ) -> Result<Self> {
        let mut index: HashMap<PartIndex, Vec<usize>> = HashMap::new();
        for (i, rule) in content.iter().enumerate() {
            let part = layout
                .locate(&rule.page_key, &rule.zone_key, &rule.part_key)
                .ok_or_else(|| Error::UnresolvedAddress {
                    line: rule.line,
                    address: rule.address(),
                })?;
            index.entry(part).or_default().push(i);
        }
        log::debug!(
            "Composer ready: {} rules over {} parts",
            content.len(),
            index.len()
        );
        Ok(Self {
            layout,
            content,
            variables,
            options,
            index,
        })
    }

    /// The options in use.
    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Compose one record.
    pub fn compose(&self, record: &CustomerRecord) -> Result<ComposedDocument> {
        self.compose_record(record).map_err(|failure| failure.error)
    }

    /// Compose one record, reporting where it failed.
    pub fn compose_record(
        &self,
        record: &CustomerRecord,
    ) -> std::result::Result<ComposedDocument, RecordFailure> {
        self.compose_inner(record).map_err(|(location, error)| {
            let failure = RecordFailure {
                record: record.id.clone(),
                location,
                error,
            };
            log::warn!("Composition failed for {}", failure);
            failure
        })
    }

    /// Compose every record; a failing record never aborts the others.
    pub fn compose_batch(&self, records: &[CustomerRecord]) -> BatchReport {
        let started_at = Utc::now();
        let results: Vec<_> = if self.options.parallel {
            records.par_iter().map(|r| self.compose_record(r)).collect()
        } else {
            records.iter().map(|r| self.compose_record(r)).collect()
        };

        let mut documents = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(doc) => documents.push(doc),
                Err(failure) => failures.push(failure),
            }
        }

        let report = BatchReport::new(documents, failures, started_at);
        log::info!(
            "Composed {} of {} records ({})",
            report.succeeded(),
            records.len(),
            report.outcome
        );
        report
    }

    /// Compose loaded customer data; records rejected at load time are reported as failures.
    pub fn compose_customers(&self, data: CustomerData) -> BatchReport {
        let mut report = self.compose_batch(&data.records);
        for rejected in data.rejected {
            report.fail_document(
                &rejected.id,
                RecordFailure::new(rejected.id.clone(), rejected.error).at("customer data"),
            );
        }
        report
    }

    fn compose_inner(&self, record: &CustomerRecord) -> RecordResult<ComposedDocument> {
        let resolver = Resolver::new(self.variables, record);
        let mut stats = CompositionStats::new();
        let mut warnings = Vec::new();
        let mut pages = Vec::new();

        for (page_idx, page) in self.layout.pages.iter().enumerate() {
            if let Some(condition) = &page.condition {
                let keep = resolver
                    .evaluate(condition)
                    .map_err(|e| (Some(format!("page {} condition", page.number)), e))?;
                if !keep {
                    log::debug!("Record {}: page {} skipped by condition", record.id, page.number);
                    stats.skipped_page_count += 1;
                    continue;
                }
            }
            let composed = self.compose_page(page_idx, page, record, &resolver, &mut stats, &mut warnings)?;
            pages.extend(composed);
        }

        for (i, page) in pages.iter_mut().enumerate() {
            page.sequence = i + 1;
            stats.add_page(page.is_continuation());
            for block in &page.blocks {
                stats.add_block(block);
            }
        }
        stats.record_count = 1;

        Ok(ComposedDocument {
            record: record.id.clone(),
            pages,
            warnings,
            stats,
        })
    }

    /// Compose one layout page into itself plus any continuation pages.
    fn compose_page(
        &self,
        page_idx: usize,
        page: &Page,
        record: &CustomerRecord,
        resolver: &Resolver<'_>,
        stats: &mut CompositionStats,
        warnings: &mut Vec<Warning>,
    ) -> RecordResult<Vec<ComposedPage>> {
        let mut main = ComposedPage::from_layout(page, 0);
        let mut continuations: Vec<Vec<PositionedContentBlock>> = Vec::new();

        for (zone_idx, zone) in page.zones.iter().enumerate() {
            for (part_idx, part) in zone.parts.iter().enumerate() {
                let key = PartIndex {
                    page: page_idx,
                    zone: zone_idx,
                    part: part_idx,
                };
                let Some(rule_indices) = self.index.get(&key) else {
                    continue;
                };

                let mut placement = PartPlacement::new(page, zone, part, self.options.row_height);
                for &rule_idx in rule_indices {
                    let rule = &self.content.records[rule_idx];
                    let location = || {
                        Some(format!("rule on line {} ({})", rule.line, rule.address()))
                    };

                    if let Some(condition) = &rule.condition {
                        let keep = resolver.evaluate(condition).map_err(|e| (location(), e))?;
                        if !keep {
                            stats.skipped_rule_count += 1;
                            continue;
                        }
                    }

                    match &rule.content_type {
                        ContentType::Array(name) => {
                            // An empty scalar named like the array is an array with no rows.
                            let rows = record
                                .array(name)
                                .or_else(|| {
                                    record
                                        .field(name)
                                        .filter(|v| v.is_empty())
                                        .map(|_| &[] as &[Row])
                                })
                                .ok_or_else(|| (location(), Error::MissingArray(name.clone())))?;
                            for (row_idx, row) in rows.iter().enumerate() {
                                let value = resolver
                                    .with_row(row)
                                    .resolve(&rule.template)
                                    .map_err(|e| (location(), e))?;
                                placement.place_row(
                                    rule,
                                    row_idx + 1,
                                    value,
                                    &mut main,
                                    &mut continuations,
                                );
                            }
                        }
                        ContentType::Text | ContentType::Graphic => {
                            let value = resolver.resolve(&rule.template).map_err(|e| (location(), e))?;
                            main.blocks.push(PositionedContentBlock {
                                region: part.region,
                                content_type: rule.content_type.clone(),
                                resolved_value: value,
                                rule_line: Some(rule.line),
                                row: None,
                            });
                        }
                    }
                }

                if let Some(warning) = placement.finish() {
                    log::warn!("Record {}: {}", record.id, warning);
                    if let Warning::RowsDropped { dropped, .. } = &warning {
                        stats.rows_dropped += *dropped as u32;
                    }
                    warnings.push(warning);
                }
            }
        }

        let mut out = Vec::with_capacity(1 + continuations.len());
        if let Some(image) = image_block(page) {
            main.blocks.insert(0, image);
        }
        out.push(main);
        for (i, blocks) in continuations.into_iter().enumerate() {
            let mut next = ComposedPage::from_layout(page, i + 1);
            next.blocks.extend(image_block(page));
            next.blocks.extend(blocks);
            out.push(next);
        }
        if out.len() > 1 {
            log::debug!(
                "Page {} overflowed onto {} continuation page(s)",
                page.number,
                out.len() - 1
            );
        }
        Ok(out)
    }
}

fn image_block(page: &Page) -> Option<PositionedContentBlock> {
    page.image.as_ref().map(|image| PositionedContentBlock {
        region: image.region,
        content_type: ContentType::Graphic,
        resolved_value: image.name.clone(),
        rule_line: None,
        row: None,
    })
}

/// Row slot bookkeeping for one part; successive array rules share the cursor.
struct PartPlacement<'p> {
    page: &'p Page,
    zone: &'p Zone,
    part: &'p Part,
    row_height: u32,
    capacity: usize,
    cursor: usize,
    dropped: usize,
    dropped_array: Option<String>,
}

impl<'p> PartPlacement<'p> {
    fn new(page: &'p Page, zone: &'p Zone, part: &'p Part, row_height: u32) -> Self {
        Self {
            page,
            zone,
            part,
            row_height,
            capacity: part.region.slot_capacity(row_height),
            cursor: 0,
            dropped: 0,
            dropped_array: None,
        }
    }

    fn place_row(
        &mut self,
        rule: &ContentRecord,
        row: usize,
        value: String,
        main: &mut ComposedPage,
        continuations: &mut Vec<Vec<PositionedContentBlock>>,
    ) {
        let slot = self.cursor;
        self.cursor += 1;
        let page_offset = slot / self.capacity;
        let block = PositionedContentBlock {
            region: self.part.region.slot(slot % self.capacity, self.row_height),
            content_type: rule.content_type.clone(),
            resolved_value: value,
            rule_line: Some(rule.line),
            row: Some(row),
        };

        if page_offset == 0 {
            main.blocks.push(block);
        } else if self.page.overflow {
            if continuations.len() < page_offset {
                continuations.resize_with(page_offset, Vec::new);
            }
            continuations[page_offset - 1].push(block);
        } else {
            self.dropped += 1;
            if self.dropped_array.is_none() {
                self.dropped_array = rule.content_type.array_name().map(str::to_string);
            }
        }
    }

    fn finish(self) -> Option<Warning> {
        if self.dropped == 0 {
            return None;
        }
        Some(Warning::RowsDropped {
            page: self.page.number,
            zone: self.zone.name.clone(),
            part: self.part.name.clone(),
            array: self.dropped_array.unwrap_or_default(),
            capacity: self.capacity,
            dropped: self.dropped,
        })
    }
}
