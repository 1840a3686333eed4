//! Placeholder resolution and condition evaluation.
//!
//! Numeric tokens come from the variable table and never from customer
//! data. Any other token is a field of the active row (during fan-out) or
//! of the customer record.

use crate::error::{Error, Result};
use crate::model::{Condition, CustomerRecord, PlaceholderRef, Row, Segment, Template, VariableTable};

/// Resolves placeholders against one customer record.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    variables: &'a VariableTable,
    record: &'a CustomerRecord,
    row: Option<&'a Row>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for a record.
    pub fn new(variables: &'a VariableTable, record: &'a CustomerRecord) -> Self {
        Self {
            variables,
            record,
            row: None,
        }
    }

    /// A resolver that looks at `row` before the record.
    pub fn with_row(&self, row: &'a Row) -> Self {
        Self {
            row: Some(row),
            ..*self
        }
    }

    /// Resolve one placeholder token.
    pub fn resolve_token(&self, token: &str, reference: &PlaceholderRef) -> Result<String> {
        let value = match reference {
            PlaceholderRef::Variable { key } => self.variables.get(*key),
            PlaceholderRef::Field { path, .. } => {
                self.lookup(path).or_else(|| self.lookup(token))
            }
        };
        value
            .map(str::to_string)
            .ok_or_else(|| Error::UnresolvedPlaceholder(token.to_string()))
    }

    fn lookup(&self, path: &str) -> Option<&'a str> {
        self.row
            .and_then(|row| row.get(path))
            .or_else(|| self.record.field(path))
    }

    /// Resolve every placeholder of a template, left to right.
    ///
    /// Substituted values are not rescanned, so a value that itself
    /// contains a marker is copied through as-is.
    pub fn resolve(&self, template: &Template) -> Result<String> {
        let mut out = String::new();
        for segment in &template.segments {
            match segment {
                Segment::Literal { text } => out.push_str(text),
                Segment::Placeholder { token, reference } => {
                    out.push_str(&self.resolve_token(token, reference)?)
                }
            }
        }
        Ok(out)
    }

    /// Evaluate a condition against this record.
    pub fn evaluate(&self, condition: &Condition) -> Result<bool> {
        condition
            .evaluate(&mut |token: &str, reference: &PlaceholderRef| {
                self.resolve_token(token, reference).map_err(|e| e.to_string())
            })
            .map_err(Error::ConditionEvaluation)
    }
}

/// Parse and resolve a value body in one step.
pub fn resolve_str(source: &str, variables: &VariableTable, record: &CustomerRecord) -> Result<String> {
    let template = Template::parse(source).map_err(Error::Other)?;
    Resolver::new(variables, record).resolve(&template)
}
