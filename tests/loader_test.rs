//! Integration tests for the input loaders.

use std::fs;
use std::path::Path;

use pagebind::parser::{
    load_content, load_customers, load_layout, load_variables, parse_customers, parse_variables,
    DuplicateKeyPolicy,
};
use pagebind::{
    detect_format_from_path, load_inputs, Error, ErrorMode, LoadOptions, SourceFormat,
    VariableTable,
};

const LAYOUT: &str = r#"<Pages>
  <Page Pagenumber="1">
    <Pagesize>612x792</Pagesize>
    <Zones>
      <Zone Zonename="A" Xstart="0" XEnd="612" YStart="0" YEnd="200">
        <Parts>
          <Part Partname="1" Xstart="10" XEnd="300" YStart="10" YEnd="100"/>
          <Part Partname="2" Xstart="300" XEnd="600" YStart="10" YEnd="100"/>
        </Parts>
      </Zone>
    </Zones>
  </Page>
  <Page Pagenumber="2">
    <Pagesize>612x792</Pagesize>
  </Page>
  <Page Pagenumber="3">
    <Pagesize>792x612</Pagesize>
  </Page>
</Pages>"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_page_count_matches_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "layout.xml", LAYOUT);

    let layout = load_layout(&path, &LoadOptions::default()).unwrap();
    assert_eq!(layout.page_count(), LAYOUT.matches("<Page ").count());
    assert_eq!(layout.zone_count(), 1);
    assert_eq!(layout.part_count(), 2);
    assert!(layout.pages[2].size.is_landscape());
}

#[test]
fn test_missing_input_is_input_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.xml");

    match load_layout(&missing, &LoadOptions::default()) {
        Err(Error::InputNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected InputNotFound, got {:?}", other.map(|_| ())),
    }
    assert!(matches!(
        load_variables(&missing, &LoadOptions::default()),
        Err(Error::InputNotFound(_))
    ));
}

#[test]
fn test_load_inputs_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write(dir.path(), "layout.xml", LAYOUT);
    let content = write(
        dir.path(),
        "content.txt",
        "1_A_1|T|Hello %%1%%\n\n1_A_2|%%1_Balance%% > 100|T|Overdue\n",
    );
    let variables = write(dir.path(), "variables.txt", "1|World|\n2|a|b|\n");
    let customers = write(
        dir.path(),
        "customers.json",
        r#"{"invoices": [{"Id": 1, "Balance": "$150.00"}, {"Id": 2, "Balance": "20"}]}"#,
    );

    let inputs = load_inputs(&layout, &content, &variables, &customers, &LoadOptions::default())
        .unwrap();
    assert_eq!(inputs.layout.page_count(), 3);
    assert_eq!(inputs.content.len(), 2);
    assert_eq!(inputs.variables.get(1), Some("World"));
    assert_eq!(inputs.variables.get(2), Some("a|b"));
    assert_eq!(inputs.customers.records.len(), 2);
    assert_eq!(inputs.customers.records[1].id.key.as_deref(), Some("2"));
}

#[test]
fn test_variable_round_trip_is_lossless() {
    let table: VariableTable = [
        (1, "Dear".to_string()),
        (-4, String::new()),
        (42, "pipe | inside".to_string()),
        (1_000_000, "  padded  ".to_string()),
    ]
    .into_iter()
    .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "variables.txt", &table.to_lines('|'));
    let loaded = load_variables(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded, table);
}

#[test]
fn test_variable_errors() {
    let options = LoadOptions::default();
    assert!(matches!(
        parse_variables("1|ok|\nno delimiter here", &options),
        Err(Error::VariableFormat { line: 2, .. })
    ));
    assert!(matches!(
        parse_variables("x|value|", &options),
        Err(Error::VariableFormat { line: 1, .. })
    ));

    let reject = options.with_duplicate_keys(DuplicateKeyPolicy::Reject);
    assert!(matches!(
        parse_variables("1|a|\n1|b|", &reject),
        Err(Error::VariableFormat { line: 2, .. })
    ));
    let last_wins = parse_variables("1|a|\n1|b|", &LoadOptions::default()).unwrap();
    assert_eq!(last_wins.get(1), Some("b"));
}

#[test]
fn test_content_errors() {
    let dir = tempfile::tempdir().unwrap();
    let options = LoadOptions::default();

    let empty = write(dir.path(), "empty.txt", "\n\n");
    assert!(matches!(
        load_content(&empty, &options),
        Err(Error::ContentFormat { .. })
    ));

    let ambiguous = write(dir.path(), "ambiguous.txt", "1_A_B_1|T|x");
    assert!(matches!(
        load_content(&ambiguous, &options),
        Err(Error::ContentFormat { line: 1, .. })
    ));

    let bad_condition = write(dir.path(), "condition.txt", "1_A_1|T|ok\n1_A_1|%%1_X%% ~ 3|T|x");
    assert!(matches!(
        load_content(&bad_condition, &options),
        Err(Error::ConditionSyntax(_))
    ));
}

#[test]
fn test_layout_errors() {
    let dir = tempfile::tempdir().unwrap();
    let options = LoadOptions::default();

    let schema = write(dir.path(), "schema.xml", "<Pages><Page Pagenumber=\"1\"><Bogus/></Page></Pages>");
    assert!(matches!(load_layout(&schema, &options), Err(Error::LayoutSchema(_))));

    let structure = write(dir.path(), "structure.xml", "<Pages><Page Pagenumber=\"1\"/></Pages>");
    assert!(matches!(load_layout(&structure, &options), Err(Error::LayoutStructure(_))));

    let gap = write(
        dir.path(),
        "gap.xml",
        "<Pages><Page Pagenumber=\"1\"><Pagesize>10x10</Pagesize></Page><Page Pagenumber=\"3\"><Pagesize>10x10</Pagesize></Page></Pages>",
    );
    assert!(load_layout(&gap, &options).is_ok());
    assert!(matches!(
        load_layout(&gap, &options.clone().strict_layout()),
        Err(Error::LayoutStructure(_))
    ));
}

#[test]
fn test_customer_formats() {
    let dir = tempfile::tempdir().unwrap();
    let xml = write(dir.path(), "c.xml", "<Invoices><Invoice><Id>1</Id></Invoice></Invoices>");
    let json = write(dir.path(), "c.json", r#"[{"Id": 1, "Items": [{"Description": "Widget"}]}]"#);
    let csv = write(dir.path(), "c.csv", "Id,Company\n1,Acme\n");

    assert_eq!(detect_format_from_path(&xml).unwrap(), SourceFormat::Xml);
    assert_eq!(detect_format_from_path(&json).unwrap(), SourceFormat::Json);
    assert!(matches!(detect_format_from_path(&csv), Err(Error::UnknownFormat(_))));

    let options = LoadOptions::default();
    let from_json = load_customers(&json, &options).unwrap();
    assert_eq!(from_json.records[0].array("Items").map(|rows| rows.len()), Some(1));
    assert!(matches!(load_customers(&csv, &options), Err(Error::UnknownFormat(_))));
}

#[test]
fn test_customer_error_modes() {
    let source = r#"[{"Id": 1, "Gst": "12.50"}, {"Id": 2, "Gst": "twelve"}]"#;

    let lenient = parse_customers(source, &LoadOptions::default()).unwrap();
    assert_eq!(lenient.records.len(), 1);
    assert_eq!(lenient.rejected.len(), 1);
    assert_eq!(lenient.rejected[0].id.index, 2);
    assert_eq!(lenient.source_count(), 2);

    let strict = LoadOptions::default().with_error_mode(ErrorMode::Strict);
    assert!(matches!(
        parse_customers(source, &strict),
        Err(Error::CustomerData { record: 2, .. })
    ));
}
