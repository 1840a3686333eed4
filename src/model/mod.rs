//! Composition model types.
//!
//! Four independently authored inputs meet here: the page layout
//! (pages, zones, parts), the content rules addressed onto that layout,
//! the variable table and the customer records. All of them are
//! immutable once loaded and shared by reference during composition.

mod condition;
mod content;
mod customer;
mod geometry;
mod template;
mod variables;

pub use condition::{compare_values, CompareOp, Condition, Operand};
pub use content::{ContentRecord, ContentRules, ContentType};
pub use customer::{parse_amount, CustomerRecord, CustomerSchema, FieldType, RecordId, Row};
pub use geometry::{Image, Layout, Page, PageSize, Part, PartIndex, Region, Zone};
pub use template::{PlaceholderRef, Segment, Template, DEFAULT_MARKER, DEFAULT_SEPARATOR};
pub use variables::VariableTable;
