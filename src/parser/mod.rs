//! Input loaders.
//!
//! Loaders run once, before composition, and produce immutable models.
//! Any loader error aborts the run.

mod content;
mod customer;
mod layout;
mod lines;
mod options;
mod variables;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{ContentRules, Layout, VariableTable};

pub use content::{parse_content, parse_content_line};
pub use customer::{
    parse_customers, parse_customers_json, parse_customers_xml, CustomerData, RejectedRecord,
};
pub use layout::parse_layout;
pub use lines::{source_lines, split_first_last, strip_trailing_delimiter, SourceLine};
pub use options::{DuplicateKeyPolicy, ErrorMode, LoadOptions};
pub use variables::parse_variables;

/// The four loaded inputs of a composition run.
#[derive(Debug)]
pub struct Inputs {
    /// Page layout
    pub layout: Layout,
    /// Content rules
    pub content: ContentRules,
    /// Variable table
    pub variables: VariableTable,
    /// Customer records
    pub customers: CustomerData,
}

/// Read a source file, mapping a missing file to [`Error::InputNotFound`].
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Load a page layout file.
pub fn load_layout<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Layout> {
    parse_layout(&read_source(path)?, options)
}

/// Load a content rule file.
pub fn load_content<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<ContentRules> {
    parse_content(&read_source(path)?, options)
}

/// Load a variable file.
pub fn load_variables<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<VariableTable> {
    parse_variables(&read_source(path)?, options)
}

/// Load a customer data file (XML or JSON).
pub fn load_customers<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<CustomerData> {
    parse_customers(&read_source(path)?, options)
}

/// Load all four inputs, in the fixed order layout, content, variables, customers.
pub fn load_inputs(
    layout: impl AsRef<Path>,
    content: impl AsRef<Path>,
    variables: impl AsRef<Path>,
    customers: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<Inputs> {
    let inputs = Inputs {
        layout: load_layout(layout, options)?,
        content: load_content(content, options)?,
        variables: load_variables(variables, options)?,
        customers: load_customers(customers, options)?,
    };
    log::info!(
        "Loaded inputs: {} pages, {} rules, {} variables, {} customer records",
        inputs.layout.page_count(),
        inputs.content.len(),
        inputs.variables.len(),
        inputs.customers.records.len()
    );
    Ok(inputs)
}
