//! Loader options and configuration.

use crate::model::{CustomerSchema, DEFAULT_MARKER, DEFAULT_SEPARATOR};

/// Options for loading the four composition inputs.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter of variable and content lines
    pub delimiter: char,

    /// Separator between the page, zone and part of a content address,
    /// and between a placeholder's qualifier and field path
    pub index_separator: char,

    /// Placeholder marker (opening and closing)
    pub placeholder_marker: String,

    /// How customer records failing type conformance are handled
    pub error_mode: ErrorMode,

    /// How duplicate variable keys are handled
    pub duplicate_keys: DuplicateKeyPolicy,

    /// Fail (instead of warn) when page numbers are not 1..n
    pub strict_page_sequence: bool,

    /// Fail (instead of warn) when a child region escapes its parent
    pub strict_containment: bool,

    /// Declared customer field types
    pub customer_schema: CustomerSchema,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line field delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the address/placeholder separator.
    pub fn with_index_separator(mut self, separator: char) -> Self {
        self.index_separator = separator;
        self
    }

    /// Set the placeholder marker.
    pub fn with_placeholder_marker(mut self, marker: impl Into<String>) -> Self {
        self.placeholder_marker = marker.into();
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Abort the load on the first invalid customer record.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Set the duplicate variable key policy.
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Make the recommended layout checks fatal.
    pub fn strict_layout(mut self) -> Self {
        self.strict_page_sequence = true;
        self.strict_containment = true;
        self
    }

    /// Set the customer schema.
    pub fn with_customer_schema(mut self, schema: CustomerSchema) -> Self {
        self.customer_schema = schema;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: '|',
            index_separator: DEFAULT_SEPARATOR,
            placeholder_marker: DEFAULT_MARKER.to_string(),
            error_mode: ErrorMode::Lenient,
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            strict_page_sequence: false,
            strict_containment: false,
            customer_schema: CustomerSchema::invoice(),
        }
    }
}

/// Handling of customer records that fail type conformance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Abort the load
    Strict,
    /// Skip the record, report it and continue
    #[default]
    Lenient,
}

/// Handling of a variable key that appears more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyPolicy {
    /// The later line replaces the earlier one
    #[default]
    LastWins,
    /// A duplicate key is a format error
    Reject,
}
