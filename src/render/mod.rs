//! Rendering of composed documents to output artifacts.
//!
//! A [`DocumentRenderer`] turns one [`ComposedDocument`] into bytes. The
//! registry maps renderer names to implementations, and [`write_batch`]
//! writes one artifact per composed record, each written atomically.
//!
//! # Example
//!
//! ```no_run
//! use pagebind::render::{RenderOptions, RendererRegistry};
//!
//! let registry = RendererRegistry::with_defaults();
//! let renderer = registry.get_by_name("pdf").expect("pdf renderer");
//! assert_eq!(renderer.extension(), "pdf");
//! # let _ = RenderOptions::default();
//! ```

mod json;
mod options;
mod pdf;
mod result;
mod text;

pub use json::{to_json, JsonFormat, JsonRenderer};
pub use options::RenderOptions;
pub use pdf::{to_pdf, PdfRenderer};
pub use result::{total_bytes, RenderedArtifact};
pub use text::{to_text, TextRenderer};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compose::{BatchReport, ComposedDocument, RecordFailure};
use crate::error::{Error, Result};

/// Trait for output renderers.
///
/// Implement this trait to add a new output format.
pub trait DocumentRenderer: Send + Sync {
    /// Get the name of this renderer (`pdf`, `json`, `text`).
    fn name(&self) -> &str;

    /// File extension of the produced artifacts, without the leading dot.
    fn extension(&self) -> &str;

    /// Render one composed document.
    fn render(&self, doc: &ComposedDocument, options: &RenderOptions) -> Result<Vec<u8>>;
}

/// Registry for output renderers, keyed by lowercase name.
pub struct RendererRegistry {
    by_name: HashMap<String, Arc<dyn DocumentRenderer>>,
}

impl RendererRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the bundled renderers (pdf, json, text).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfRenderer::new()));
        registry.register(Arc::new(JsonRenderer::new()));
        registry.register(Arc::new(TextRenderer::new()));
        registry
    }

    /// Register a renderer, replacing any renderer of the same name.
    pub fn register(&mut self, renderer: Arc<dyn DocumentRenderer>) {
        self.by_name.insert(renderer.name().to_lowercase(), renderer);
    }

    /// Get a renderer by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentRenderer>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Get a renderer by name, failing with a descriptive error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn DocumentRenderer>> {
        self.get_by_name(name).ok_or_else(|| {
            let mut known = self.names();
            known.sort_unstable();
            Error::Other(format!(
                "No renderer named '{}' (available: {})",
                name,
                known.join(", ")
            ))
        })
    }

    /// Names of every registered renderer.
    pub fn names(&self) -> Vec<&str> {
        self.by_name.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Path of the artifact for `doc` inside `dir`.
pub fn artifact_path(dir: &Path, doc: &ComposedDocument, renderer: &dyn DocumentRenderer) -> PathBuf {
    dir.join(format!("{}.{}", doc.record.label(), renderer.extension()))
}

/// Render one document and write it to `path` atomically.
///
/// The bytes go to a `.part` sibling first and are renamed into place, so
/// an interrupted run never leaves a truncated artifact under the final name.
pub fn write_document(
    doc: &ComposedDocument,
    renderer: &dyn DocumentRenderer,
    path: &Path,
    options: &RenderOptions,
) -> Result<RenderedArtifact> {
    let bytes = renderer.render(doc, options)?;

    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    if let Err(err) = fs::write(&part, &bytes).and_then(|_| fs::rename(&part, path)) {
        let _ = fs::remove_file(&part);
        return Err(Error::Render(format!(
            "cannot write {}: {}",
            path.display(),
            err
        )));
    }

    log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(RenderedArtifact::new(doc.record.clone(), path, bytes.len()))
}

/// Render every composed document of a batch into `dir`.
///
/// A record whose rendering fails is moved from the report's documents to
/// its failures; the remaining records are still written. Only a failure to
/// create `dir` aborts the whole batch.
pub fn write_batch(
    report: &mut BatchReport,
    renderer: &dyn DocumentRenderer,
    dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<RenderedArtifact>> {
    fs::create_dir_all(dir)?;

    let mut artifacts = Vec::with_capacity(report.documents.len());
    let mut failed = Vec::new();
    for doc in &report.documents {
        let path = artifact_path(dir, doc, renderer);
        match write_document(doc, renderer, &path, options) {
            Ok(artifact) => artifacts.push(artifact),
            Err(err) => {
                log::warn!("Record {} failed to render: {}", doc.record, err);
                failed.push(RecordFailure::new(doc.record.clone(), err).at("rendering"));
            }
        }
    }

    for failure in failed {
        let record = failure.record.clone();
        report.fail_document(&record, failure);
    }

    log::info!(
        "Rendered {} artifact(s) with the {} renderer into {}",
        artifacts.len(),
        renderer.name(),
        dir.display()
    );
    Ok(artifacts)
}
