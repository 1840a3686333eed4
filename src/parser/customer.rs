//! Customer data loader for XML and JSON sources.
//!
//! Both formats are normalized to [`CustomerRecord`]s: scalar leaves become
//! fields, nested blocks flatten to dotted paths (`BillTo.City`) and a
//! repeated block of rows becomes a named array (`Items`).

use std::collections::{BTreeMap, BTreeSet};

use roxmltree::{Document, Node};
use serde_json::{Map, Value};

use super::options::{ErrorMode, LoadOptions};
use crate::detect::{detect_format_from_bytes, SourceFormat};
use crate::error::{Error, Result};
use crate::model::{CustomerRecord, RecordId, Row};

/// A customer record rejected while loading.
#[derive(Debug)]
pub struct RejectedRecord {
    /// Record identity
    pub id: RecordId,
    /// Why the record was rejected
    pub error: Error,
}

/// The loaded customer record set.
#[derive(Debug, Default)]
pub struct CustomerData {
    /// Records that passed type conformance, in source order
    pub records: Vec<CustomerRecord>,
    /// Records skipped in lenient mode
    pub rejected: Vec<RejectedRecord>,
}

impl CustomerData {
    /// Number of records in the source, accepted or not.
    pub fn source_count(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Parse customer data, detecting XML or JSON from the content.
pub fn parse_customers(input: &str, options: &LoadOptions) -> Result<CustomerData> {
    match detect_format_from_bytes(input.as_bytes())? {
        SourceFormat::Xml => parse_customers_xml(input, options),
        SourceFormat::Json => parse_customers_json(input, options),
    }
}

/// Parse customer data from XML.
///
/// The root element holds one element per record (`Invoices/Invoice*`).
/// A root whose children are all leaves, or do not share one element name,
/// is itself a single record.
///
/// An empty element named like a declared schema array (`<Items/>`) is an
/// array with no rows.
pub fn parse_customers_xml(input: &str, options: &LoadOptions) -> Result<CustomerData> {
    let doc = Document::parse(input).map_err(|e| Error::CustomerData {
        record: 0,
        message: format!("not well-formed XML: {}", e),
    })?;
    let root = doc.root_element();
    let arrays = options.customer_schema.array_names();

    let raw: Vec<CustomerRecord> = if element_children(root).next().is_none() {
        Vec::new()
    } else if is_single_record(root) {
        vec![xml_record(root, 1, &arrays)]
    } else {
        element_children(root)
            .enumerate()
            .map(|(i, node)| xml_record(node, i + 1, &arrays))
            .collect()
    };

    finish(raw, options)
}

/// Parse customer data from JSON.
///
/// Accepts an array of record objects, an object holding exactly one such
/// array, or a single record object.
pub fn parse_customers_json(input: &str, options: &LoadOptions) -> Result<CustomerData> {
    let value: Value = serde_json::from_str(input).map_err(|e| Error::CustomerData {
        record: 0,
        message: format!("invalid JSON: {}", e),
    })?;

    let objects: Vec<&Map<String, Value>> = match &value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object().ok_or_else(|| Error::CustomerData {
                    record: i + 1,
                    message: "record is not a JSON object".to_string(),
                })
            })
            .collect::<Result<_>>()?,
        Value::Object(map) => match single_record_array(map) {
            Some(items) => items,
            None => vec![map],
        },
        _ => {
            return Err(Error::UnknownFormat(
                "customer JSON must be an object or an array".to_string(),
            ))
        }
    };

    let raw = objects
        .into_iter()
        .enumerate()
        .map(|(i, object)| json_record(object, i + 1))
        .collect();

    finish(raw, options)
}

/// Assign record keys and apply the schema.
fn finish(raw: Vec<CustomerRecord>, options: &LoadOptions) -> Result<CustomerData> {
    let schema = &options.customer_schema;
    let mut data = CustomerData::default();

    for mut record in raw {
        if let Some(key_field) = &schema.key_field {
            record.id.key = record.field(key_field).map(|v| v.trim().to_string());
        }
        match schema.validate(&record) {
            Ok(()) => data.records.push(record),
            Err(message) => {
                let error = Error::CustomerData {
                    record: record.id.index,
                    message,
                };
                if options.error_mode == ErrorMode::Strict {
                    return Err(error);
                }
                log::warn!("Skipping customer record {}: {}", record.id, error);
                data.rejected.push(RejectedRecord {
                    id: record.id,
                    error,
                });
            }
        }
    }

    log::debug!(
        "Loaded {} customer records ({} rejected)",
        data.records.len(),
        data.rejected.len()
    );
    Ok(data)
}

fn element_children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(|c| c.is_element())
}

fn is_leaf(node: Node) -> bool {
    !node.children().any(|c| c.is_element())
}

/// A root is a batch only when its children share one element name and are blocks.
fn is_single_record(root: Node) -> bool {
    if element_children(root).all(is_leaf) {
        return true;
    }
    let mut names = element_children(root).map(|c| c.tag_name().name());
    let first = names.next();
    names.any(|name| Some(name) != first)
}

fn is_empty_element(node: Node) -> bool {
    is_leaf(node) && node.text().map_or(true, |t| t.trim().is_empty())
}

/// A wrapper whose children share one element name and are themselves blocks.
fn is_row_wrapper(node: Node) -> bool {
    let mut children = element_children(node).peekable();
    let first_name = match children.peek() {
        Some(first) => first.tag_name().name(),
        None => return false,
    };
    children.all(|c| c.tag_name().name() == first_name && !is_leaf(c))
}

fn xml_record(node: Node, index: usize, arrays: &BTreeSet<&str>) -> CustomerRecord {
    let mut record = CustomerRecord::new(index);
    for attr in node.attributes() {
        record.fields.insert(attr.name().to_string(), attr.value().trim().to_string());
    }
    for child in element_children(node) {
        let name = child.tag_name().name();
        if arrays.contains(name) && is_empty_element(child) {
            record.arrays.insert(name.to_string(), Vec::new());
        } else if is_leaf(child) {
            record
                .fields
                .insert(name.to_string(), child.text().unwrap_or_default().trim().to_string());
        } else if is_row_wrapper(child) {
            let rows = element_children(child).map(xml_row).collect();
            record.arrays.insert(name.to_string(), rows);
        } else {
            flatten_xml(child, name, &mut record.fields);
        }
    }
    record
}

fn xml_row(node: Node) -> Row {
    let mut row = Row::new();
    for attr in node.attributes() {
        row.fields.insert(attr.name().to_string(), attr.value().trim().to_string());
    }
    for child in element_children(node) {
        let name = child.tag_name().name();
        if is_leaf(child) {
            row.fields
                .insert(name.to_string(), child.text().unwrap_or_default().trim().to_string());
        } else {
            flatten_xml(child, name, &mut row.fields);
        }
    }
    row
}

fn flatten_xml(node: Node, prefix: &str, fields: &mut BTreeMap<String, String>) {
    for attr in node.attributes() {
        fields.insert(
            format!("{}.{}", prefix, attr.name()),
            attr.value().trim().to_string(),
        );
    }
    for child in element_children(node) {
        let path = format!("{}.{}", prefix, child.tag_name().name());
        if is_leaf(child) {
            fields.insert(path, child.text().unwrap_or_default().trim().to_string());
        } else {
            flatten_xml(child, &path, fields);
        }
    }
}

fn single_record_array(map: &Map<String, Value>) -> Option<Vec<&Map<String, Value>>> {
    if map.len() != 1 {
        return None;
    }
    let items = map.values().next()?.as_array()?;
    items.iter().map(Value::as_object).collect()
}

fn json_record(object: &Map<String, Value>, index: usize) -> CustomerRecord {
    let mut record = CustomerRecord::new(index);
    for (name, value) in object {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let rows = items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|item| {
                        let mut row = Row::new();
                        flatten_json(item, None, &mut row.fields);
                        row
                    })
                    .collect();
                record.arrays.insert(name.clone(), rows);
            }
            _ => flatten_value(value, name, &mut record.fields),
        }
    }
    record
}

fn flatten_json(object: &Map<String, Value>, prefix: Option<&str>, fields: &mut BTreeMap<String, String>) {
    for (name, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.clone(),
        };
        flatten_value(value, &path, fields);
    }
}

fn flatten_value(value: &Value, path: &str, fields: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {
            fields.insert(path.to_string(), String::new());
        }
        Value::Bool(b) => {
            fields.insert(path.to_string(), b.to_string());
        }
        Value::Number(n) => {
            fields.insert(path.to_string(), n.to_string());
        }
        Value::String(s) => {
            fields.insert(path.to_string(), s.trim().to_string());
        }
        Value::Object(map) => flatten_json(map, Some(path), fields),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(item, &format!("{}.{}", path, i + 1), fields);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerSchema;

    const INVOICES_XML: &str = r#"<?xml version="1.0"?>
<Invoices>
  <Invoice>
    <Id>1001</Id>
    <Company>Acme</Company>
    <BillTo>
      <City>Seattle</City>
      <Address><Line1>1 Main St</Line1></Address>
    </BillTo>
    <Items>
      <Item><Description>Widget</Description><UnitPrice>4.00</UnitPrice></Item>
      <Item><Description>Gadget</Description><UnitPrice>$1,250.00</UnitPrice></Item>
    </Items>
    <Gst>12.50</Gst>
  </Invoice>
  <Invoice>
    <Id>1002</Id>
    <Company>Globex</Company>
    <Items>
      <Item><Description>Sprocket</Description><UnitPrice>2.00</UnitPrice></Item>
    </Items>
  </Invoice>
</Invoices>"#;

    fn lenient() -> LoadOptions {
        LoadOptions::default()
    }

    #[test]
    fn test_parse_xml_invoices() {
        let data = parse_customers(INVOICES_XML, &lenient()).unwrap();
        assert_eq!(data.records.len(), 2);
        assert!(data.rejected.is_empty());

        let first = &data.records[0];
        assert_eq!(first.id, RecordId::new(1, Some("1001".into())));
        assert_eq!(first.field("Company"), Some("Acme"));
        assert_eq!(first.field("BillTo.City"), Some("Seattle"));
        assert_eq!(first.field("BillTo.Address.Line1"), Some("1 Main St"));

        let items = first.array("Items").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].get("Description"), Some("Gadget"));
        assert_eq!(data.records[1].array("Items").unwrap().len(), 1);
    }

    #[test]
    fn test_xml_single_record_root() {
        let xml = "<Invoice Id=\"7\"><Company>Initech</Company></Invoice>";
        let data = parse_customers(xml, &lenient()).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].field("Company"), Some("Initech"));
        assert_eq!(data.records[0].id.key.as_deref(), Some("7"));
    }

    #[test]
    fn test_xml_single_record_with_items() {
        let xml = r#"<Invoice>
  <Id>1</Id>
  <Company>Acme</Company>
  <Items>
    <Item><Description>Widget</Description></Item>
    <Item><Description>Gadget</Description></Item>
  </Items>
</Invoice>"#;
        let data = parse_customers(xml, &lenient()).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].field("Company"), Some("Acme"));
        assert_eq!(data.records[0].array("Items").map(|rows| rows.len()), Some(2));
    }

    #[test]
    fn test_xml_empty_items_is_empty_array() {
        let xml = "<Invoices>\
<Invoice><Id>1</Id><Items/></Invoice>\
<Invoice><Id>2</Id><Items></Items></Invoice>\
</Invoices>";
        let data = parse_customers(xml, &lenient()).unwrap();
        assert_eq!(data.records.len(), 2);
        for record in &data.records {
            assert_eq!(record.array("Items").map(|rows| rows.len()), Some(0));
            assert_eq!(record.field("Items"), None);
        }

        let untyped = LoadOptions::new().with_customer_schema(CustomerSchema::untyped());
        let data = parse_customers(xml, &untyped).unwrap();
        assert_eq!(data.records[0].field("Items"), Some(""));
    }

    #[test]
    fn test_xml_empty_root() {
        let data = parse_customers("<Invoices/>", &lenient()).unwrap();
        assert_eq!(data.source_count(), 0);
    }

    #[test]
    fn test_parse_json_invoices() {
        let json = r#"{"Invoices": [
            {"Id": 1, "Company": "Acme", "Paid": true,
             "BillTo": {"City": "Seattle"},
             "Items": [{"Description": "Widget", "UnitPrice": 4.5}]},
            {"Id": 2, "Company": "Globex", "Items": []}
        ]}"#;
        let data = parse_customers(json, &lenient()).unwrap();
        assert_eq!(data.records.len(), 2);

        let first = &data.records[0];
        assert_eq!(first.field("Id"), Some("1"));
        assert_eq!(first.field("Paid"), Some("true"));
        assert_eq!(first.field("BillTo.City"), Some("Seattle"));
        assert_eq!(first.array("Items").unwrap()[0].get("UnitPrice"), Some("4.5"));
        assert_eq!(data.records[1].array("Items").map(|r| r.len()), Some(0));
    }

    #[test]
    fn test_json_top_level_array_and_single_object() {
        let data = parse_customers(r#"[{"Company": "A"}, {"Company": "B"}]"#, &lenient()).unwrap();
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.records[1].id.index, 2);

        let data = parse_customers(r#"{"Company": "Solo", "Zip": "98101"}"#, &lenient()).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].field("Zip"), Some("98101"));
    }

    #[test]
    fn test_type_failure_is_record_scoped() {
        let json = r#"[{"Id": 1, "Zip": "98101"}, {"Id": 2, "Zip": "nineties"}, {"Id": 3}]"#;
        let data = parse_customers(json, &lenient()).unwrap();
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.rejected.len(), 1);
        assert_eq!(data.rejected[0].id.index, 2);
        assert!(matches!(data.rejected[0].error, Error::CustomerData { record: 2, .. }));
        assert_eq!(data.source_count(), 3);

        let strict = LoadOptions::new().strict();
        assert!(matches!(
            parse_customers(json, &strict),
            Err(Error::CustomerData { record: 2, .. })
        ));
    }

    #[test]
    fn test_untyped_schema_accepts_anything() {
        let options = LoadOptions::new().with_customer_schema(CustomerSchema::untyped());
        let data = parse_customers(r#"[{"Id": "x", "Gst": "n/a"}]"#, &options).unwrap();
        assert_eq!(data.records.len(), 1);
        assert!(data.records[0].id.key.is_none());
    }

    #[test]
    fn test_malformed_sources() {
        assert!(matches!(
            parse_customers("Id,Company", &lenient()),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            parse_customers("<Invoices><Invoice>", &lenient()),
            Err(Error::CustomerData { .. })
        ));
        assert!(matches!(
            parse_customers("[1, 2]", &lenient()),
            Err(Error::CustomerData { record: 1, .. })
        ));
    }
}
