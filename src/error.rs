//! Error types for pagebind library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagebind operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading inputs, composing or rendering.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input source does not exist or cannot be opened.
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A structured source is neither XML nor JSON.
    #[error("Unknown input format: {0}")]
    UnknownFormat(String),

    /// The layout source is not well-formed or violates the declared schema.
    #[error("Layout schema error: {0}")]
    LayoutSchema(String),

    /// The layout is schema-valid but structurally invalid.
    #[error("Layout structure error: {0}")]
    LayoutStructure(String),

    /// A variable line could not be parsed.
    #[error("Variable format error on line {line}: {message}")]
    VariableFormat {
        /// 1-indexed source line
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A content rule line could not be parsed.
    #[error("Content format error on line {line}: {message}")]
    ContentFormat {
        /// 1-indexed source line
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// A content rule addresses a page/zone/part that the layout does not define.
    #[error("Content rule on line {line} addresses unknown region {address}")]
    UnresolvedAddress {
        /// 1-indexed source line of the rule
        line: usize,
        /// The `page_zone_part` address as written
        address: String,
    },

    /// A customer record field failed its declared type.
    #[error("Customer record {record}: {message}")]
    CustomerData {
        /// 1-indexed record position in the source
        record: usize,
        /// What was wrong with the record
        message: String,
    },

    /// A placeholder token has no value in its source.
    #[error("Unresolved placeholder: %%{0}%%")]
    UnresolvedPlaceholder(String),

    /// A condition expression could not be parsed.
    #[error("Condition syntax error: {0}")]
    ConditionSyntax(String),

    /// A condition could not be evaluated for the active record.
    #[error("Condition evaluation error: {0}")]
    ConditionEvaluation(String),

    /// A fan-out rule names an array the customer record does not contain.
    #[error("Missing array in customer record: {0}")]
    MissingArray(String),

    /// Error produced by a renderer.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Check if this error belongs to a single customer record rather than the whole run.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Error::CustomerData { .. }
                | Error::UnresolvedPlaceholder(_)
                | Error::ConditionEvaluation(_)
                | Error::MissingArray(_)
                | Error::Render(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Render(format!("PDF writer error: {}", err))
    }
}
