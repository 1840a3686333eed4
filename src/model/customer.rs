//! Customer (invoice) records bound to a composition run.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

/// Identity of a customer record within its batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId {
    /// 1-indexed position in the source
    pub index: usize,
    /// Value of the record's key field (`Id`), if present
    pub key: Option<String>,
}

impl RecordId {
    /// Create a record identity.
    pub fn new(index: usize, key: Option<String>) -> Self {
        Self { index, key }
    }

    /// A file-system friendly label (`record-3` or `record-3-1001`).
    pub fn label(&self) -> String {
        match &self.key {
            Some(key) => {
                let key: String = key
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
                    .collect();
                format!("record-{}-{}", self.index, key)
            }
            None => format!("record-{}", self.index),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "#{} (Id {})", self.index, key),
            None => write!(f, "#{}", self.index),
        }
    }
}

/// One row of a named array (an invoice line item).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Row fields by name
    pub fields: BTreeMap<String, String>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A customer record: scalar fields plus named arrays of rows.
///
/// Nested blocks are flattened to dotted paths (`BillTo.City`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Record identity
    pub id: RecordId,
    /// Scalar fields by path
    pub fields: BTreeMap<String, String>,
    /// Named arrays (`Items`)
    pub arrays: BTreeMap<String, Vec<Row>>,
}

impl CustomerRecord {
    /// Create an empty record at the given 1-indexed position.
    pub fn new(index: usize) -> Self {
        Self {
            id: RecordId::new(index, None),
            fields: BTreeMap::new(),
            arrays: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    /// Builder-style array setter.
    pub fn with_array(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.arrays.insert(name.into(), rows);
        self
    }

    /// Get a scalar field by path.
    pub fn field(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    /// Get the rows of a named array.
    pub fn array(&self, name: &str) -> Option<&[Row]> {
        self.arrays.get(name).map(Vec::as_slice)
    }

    /// Total number of rows across all arrays.
    pub fn row_count(&self) -> usize {
        self.arrays.values().map(Vec::len).sum()
    }
}

/// Declared type of a customer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldType {
    /// Any text
    #[default]
    Text,
    /// A signed integer
    Integer,
    /// A currency amount (`1250`, `1,250.00`, `$1,250.00`, `-3.5`)
    Currency,
}

impl FieldType {
    /// Check if a value conforms to this type.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            FieldType::Text => true,
            FieldType::Integer => value.trim().parse::<i64>().is_ok(),
            FieldType::Currency => parse_amount(value).is_some(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => f.write_str("text"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Currency => f.write_str("currency"),
        }
    }
}

/// Declared field types for customer records.
///
/// Fields not listed are text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerSchema {
    /// Record field types by path
    pub fields: BTreeMap<String, FieldType>,
    /// Row field types by `(array name, field name)`
    pub row_fields: BTreeMap<(String, String), FieldType>,
    /// Field whose value identifies a record
    pub key_field: Option<String>,
}

impl CustomerSchema {
    /// Schema with no typed fields and no key field.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// The invoice schema: integer ids and zip codes, currency GST and unit prices.
    pub fn invoice() -> Self {
        Self::untyped()
            .with_key_field("Id")
            .with_field("Id", FieldType::Integer)
            .with_field("Zip", FieldType::Integer)
            .with_field("BilltoZip", FieldType::Integer)
            .with_field("ShiptoZip", FieldType::Integer)
            .with_field("Gst", FieldType::Currency)
            .with_row_field("Items", "UnitPrice", FieldType::Currency)
    }

    /// Declare a record field type.
    pub fn with_field(mut self, path: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(path.into(), field_type);
        self
    }

    /// Declare a row field type.
    pub fn with_row_field(
        mut self,
        array: impl Into<String>,
        field: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        self.row_fields
            .insert((array.into(), field.into()), field_type);
        self
    }

    /// Set the key field.
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = Some(field.into());
        self
    }

    /// Names of the arrays with declared row fields.
    pub fn array_names(&self) -> BTreeSet<&str> {
        self.row_fields.keys().map(|(array, _)| array.as_str()).collect()
    }

    /// Check every declared field present in `record`.
    ///
    /// Missing fields are not an error; present fields must conform.
    pub fn validate(&self, record: &CustomerRecord) -> Result<(), String> {
        for (path, field_type) in &self.fields {
            if let Some(value) = record.field(path) {
                if !field_type.accepts(value) {
                    return Err(format!(
                        "field {} = \"{}\" is not a valid {}",
                        path, value, field_type
                    ));
                }
            }
        }
        for ((array, field), field_type) in &self.row_fields {
            for (i, row) in record.array(array).unwrap_or_default().iter().enumerate() {
                if let Some(value) = row.get(field) {
                    if !field_type.accepts(value) {
                        return Err(format!(
                            "{}[{}].{} = \"{}\" is not a valid {}",
                            array,
                            i + 1,
                            field,
                            value,
                            field_type
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn amount_regex() -> &'static Regex {
    static AMOUNT: OnceLock<Regex> = OnceLock::new();
    AMOUNT.get_or_init(|| {
        Regex::new(r"^(?:-\$?|\$-?)?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?$").expect("amount pattern is valid")
    })
}

/// Parse a plain number or currency amount.
///
/// Accepts an optional sign, an optional `$`, thousands separators and a fraction.
pub fn parse_amount(value: &str) -> Option<f64> {
    let value = value.trim();
    if !value.bytes().any(|b| b.is_ascii_digit()) || !amount_regex().is_match(value) {
        return None;
    }
    let negative = value.starts_with('-') || value.starts_with("$-");
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let amount: f64 = digits.parse().ok()?;
    Some(if negative { -amount } else { amount })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice() -> CustomerRecord {
        CustomerRecord::new(1)
            .with_field("Id", "17")
            .with_field("Company", "Acme")
            .with_field("Gst", "12.50")
            .with_array(
                "Items",
                vec![
                    Row::new()
                        .with_field("Description", "Widget")
                        .with_field("UnitPrice", "4.00"),
                    Row::new()
                        .with_field("Description", "Gadget")
                        .with_field("UnitPrice", "$1,250.00"),
                ],
            )
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1250"), Some(1250.0));
        assert_eq!(parse_amount("1,250.50"), Some(1250.5));
        assert_eq!(parse_amount(" $1,250.00 "), Some(1250.0));
        assert_eq!(parse_amount("-3.5"), Some(-3.5));
        assert_eq!(parse_amount("$-3"), Some(-3.0));
        assert_eq!(parse_amount("-$3"), Some(-3.0));
        assert_eq!(parse_amount("--5"), None);
        assert_eq!(parse_amount("-$-5"), None);
        assert_eq!(parse_amount(".5"), Some(0.5));
        assert_eq!(parse_amount("12,50"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_field_type_accepts() {
        assert!(FieldType::Integer.accepts("98101"));
        assert!(!FieldType::Integer.accepts("98-101"));
        assert!(FieldType::Currency.accepts("$10.00"));
        assert!(!FieldType::Currency.accepts("ten"));
        assert!(FieldType::Text.accepts("anything"));
    }

    #[test]
    fn test_invoice_schema_validation() {
        let schema = CustomerSchema::invoice();
        assert!(schema.validate(&invoice()).is_ok());

        let bad = invoice().with_field("Zip", "ninety");
        let err = schema.validate(&bad).unwrap_err();
        assert!(err.contains("Zip"));

        let bad_row = invoice().with_array(
            "Items",
            vec![Row::new().with_field("UnitPrice", "free")],
        );
        let err = schema.validate(&bad_row).unwrap_err();
        assert!(err.contains("Items[1].UnitPrice"));
    }

    #[test]
    fn test_record_accessors() {
        let record = invoice();
        assert_eq!(record.field("Company"), Some("Acme"));
        assert_eq!(record.array("Items").map(|rows| rows.len()), Some(2));
        assert!(record.array("Payments").is_none());
        assert_eq!(record.row_count(), 2);
    }

    #[test]
    fn test_record_id_label() {
        assert_eq!(RecordId::new(3, None).label(), "record-3");
        assert_eq!(RecordId::new(3, Some("A/7".into())).label(), "record-3-A_7");
        assert_eq!(RecordId::new(2, Some("9".into())).to_string(), "#2 (Id 9)");
    }
}
