//! # pagebind
//!
//! Variable-data document composition for Rust.
//!
//! This library merges four independently authored inputs (a geometric page
//! layout, conditional content rules, a variable table and a batch of
//! customer records) into fully resolved, positioned content blocks, one
//! composed document per customer record, and renders them to PDF, JSON or
//! a plain-text proof.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagebind::Pagebind;
//!
//! fn main() -> pagebind::Result<()> {
//!     let outcome = Pagebind::new()
//!         .with_format("pdf")
//!         .run("layout.xml", "content.txt", "variables.txt", "invoices.xml", "out")?;
//!
//!     println!("{}: {} document(s)", outcome.report.outcome, outcome.artifacts.len());
//!     for failure in &outcome.report.failures {
//!         eprintln!("{}", failure);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Geometric model**: pages, zones and parts addressed by `page_zone_part`
//! - **Conditional content**: page and rule conditions over variables and record fields
//! - **Fan-out**: one block per row of a customer array, with overflow onto continuation pages
//! - **Record isolation**: one failing record never stops the rest of the batch
//! - **Parallel processing**: uses Rayon to compose records concurrently

pub mod compose;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use compose::{
    BatchReport, ComposeOptions, ComposedDocument, ComposedPage, Composer, CompositionStats,
    PositionedContentBlock, RecordFailure, RunOutcome, Warning,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, SourceFormat};
pub use error::{Error, Result};
pub use model::{
    Condition, ContentRecord, ContentRules, ContentType, CustomerRecord, CustomerSchema,
    FieldType, Layout, Page, PageSize, Part, RecordId, Region, Row, Template, VariableTable, Zone,
};
pub use parser::{load_inputs, CustomerData, ErrorMode, Inputs, LoadOptions};
pub use render::{
    DocumentRenderer, JsonFormat, RenderOptions, RenderedArtifact, RendererRegistry,
};

use std::path::Path;

/// Compose already loaded inputs.
///
/// Fails only on run-level errors (a content rule addressing a part the
/// layout does not have). Per-record failures are reported in the
/// returned [`BatchReport`].
pub fn compose_inputs(inputs: Inputs, options: ComposeOptions) -> Result<BatchReport> {
    let Inputs {
        layout,
        content,
        variables,
        customers,
    } = inputs;
    let composer = Composer::new(&layout, &content, &variables, options)?;
    Ok(composer.compose_customers(customers))
}

/// Load four input files and compose every customer record with default options.
///
/// # Example
///
/// ```no_run
/// use pagebind::compose_files;
///
/// let report = compose_files("layout.xml", "content.txt", "variables.txt", "invoices.xml")?;
/// std::process::exit(report.outcome.exit_code());
/// # Ok::<(), pagebind::Error>(())
/// ```
pub fn compose_files(
    layout: impl AsRef<Path>,
    content: impl AsRef<Path>,
    variables: impl AsRef<Path>,
    customers: impl AsRef<Path>,
) -> Result<BatchReport> {
    let inputs = load_inputs(layout, content, variables, customers, &LoadOptions::default())?;
    compose_inputs(inputs, ComposeOptions::default())
}

/// Compose in-memory sources with default options.
///
/// # Example
///
/// ```
/// let layout = r#"<Pages><Page Pagenumber="1"><Pagesize>612x792</Pagesize>
///   <Zones><Zone Zonename="A" Xstart="0" XEnd="612" YStart="0" YEnd="100">
///     <Parts><Part Partname="1" Xstart="0" XEnd="612" YStart="0" YEnd="100"/></Parts>
///   </Zone></Zones></Page></Pages>"#;
///
/// let report = pagebind::compose_str(
///     layout,
///     "1_A_1|T|Hello %%1%%",
///     "1|World|",
///     "<Invoices><Invoice><Id>7</Id></Invoice></Invoices>",
/// )?;
/// assert_eq!(report.documents[0].plain_text(), "Hello World\n");
/// # Ok::<(), pagebind::Error>(())
/// ```
pub fn compose_str(
    layout: &str,
    content: &str,
    variables: &str,
    customers: &str,
) -> Result<BatchReport> {
    let options = LoadOptions::default();
    let inputs = Inputs {
        layout: parser::parse_layout(layout, &options)?,
        content: parser::parse_content(content, &options)?,
        variables: parser::parse_variables(variables, &options)?,
        customers: parser::parse_customers(customers, &options)?,
    };
    compose_inputs(inputs, ComposeOptions::default())
}

/// Builder for loading, composing and rendering a batch.
///
/// # Example
///
/// ```no_run
/// use pagebind::Pagebind;
///
/// let outcome = Pagebind::new()
///     .strict()
///     .sequential()
///     .with_row_height(14)
///     .with_format("json")
///     .run("layout.xml", "content.txt", "variables.txt", "invoices.json", "out")?;
/// # Ok::<(), pagebind::Error>(())
/// ```
pub struct Pagebind {
    load_options: LoadOptions,
    compose_options: ComposeOptions,
    render_options: RenderOptions,
    format: String,
    registry: RendererRegistry,
}

impl Pagebind {
    /// Create a new builder (PDF output, lenient loading, parallel composition).
    pub fn new() -> Self {
        Self {
            load_options: LoadOptions::default(),
            compose_options: ComposeOptions::default(),
            render_options: RenderOptions::default(),
            format: "pdf".to_string(),
            registry: RendererRegistry::with_defaults(),
        }
    }

    /// Abort loading when a customer record fails type conformance.
    pub fn strict(mut self) -> Self {
        self.load_options = self.load_options.strict();
        self
    }

    /// Skip and report customer records that fail type conformance.
    pub fn lenient(mut self) -> Self {
        self.load_options = self.load_options.with_error_mode(ErrorMode::Lenient);
        self
    }

    /// Fail on non-contiguous page numbers and escaping child regions.
    pub fn strict_layout(mut self) -> Self {
        self.load_options = self.load_options.strict_layout();
        self
    }

    /// Disable parallel composition.
    pub fn sequential(mut self) -> Self {
        self.compose_options = self.compose_options.sequential();
        self
    }

    /// Set the height of one fanned-out row slot.
    pub fn with_row_height(mut self, height: u32) -> Self {
        self.compose_options = self.compose_options.with_row_height(height);
        self
    }

    /// Set the font size used by the PDF renderer.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.render_options = self.render_options.with_font_size(size);
        self
    }

    /// Set the output format by renderer name (`pdf`, `json`, `text`).
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Replace the loader options.
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Replace the composition options.
    pub fn with_compose_options(mut self, options: ComposeOptions) -> Self {
        self.compose_options = options;
        self
    }

    /// Replace the render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Register an additional renderer.
    pub fn with_renderer(mut self, renderer: std::sync::Arc<dyn DocumentRenderer>) -> Self {
        self.registry.register(renderer);
        self
    }

    /// Load the four inputs.
    pub fn load(
        &self,
        layout: impl AsRef<Path>,
        content: impl AsRef<Path>,
        variables: impl AsRef<Path>,
        customers: impl AsRef<Path>,
    ) -> Result<Inputs> {
        load_inputs(layout, content, variables, customers, &self.load_options)
    }

    /// Compose loaded inputs.
    pub fn compose(&self, inputs: Inputs) -> Result<BatchReport> {
        compose_inputs(inputs, self.compose_options.clone())
    }

    /// Load, compose and render into `out_dir`, one artifact per composed record.
    pub fn run(
        &self,
        layout: impl AsRef<Path>,
        content: impl AsRef<Path>,
        variables: impl AsRef<Path>,
        customers: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> Result<RunResult> {
        let renderer = self.registry.require(&self.format)?;
        let inputs = self.load(layout, content, variables, customers)?;
        let mut report = self.compose(inputs)?;
        let artifacts =
            render::write_batch(&mut report, renderer.as_ref(), out_dir.as_ref(), &self.render_options)?;
        Ok(RunResult { report, artifacts })
    }
}

impl Default for Pagebind {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`Pagebind::run`].
#[derive(Debug)]
pub struct RunResult {
    /// Composition report, including render failures
    pub report: BatchReport,
    /// Artifacts written
    pub artifacts: Vec<RenderedArtifact>,
}

impl RunResult {
    /// Overall outcome.
    pub fn outcome(&self) -> RunOutcome {
        self.report.outcome
    }
}
