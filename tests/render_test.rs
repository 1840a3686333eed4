//! Integration tests for rendering composed batches to disk.

use std::fs;
use std::path::{Path, PathBuf};

use pagebind::render::{write_batch, PdfRenderer, RenderOptions};
use pagebind::{compose_str, ComposedDocument, Pagebind, RunOutcome};

const LAYOUT: &str = r#"<Pages>
  <Page Pagenumber="1">
    <Pagesize>612x792</Pagesize>
    <Overflow>true</Overflow>
    <Image Imagename="logo.png" Xstart="20" XEnd="120" YStart="20" YEnd="80"/>
    <Zones>
      <Zone Zonename="A" Xstart="0" XEnd="612" YStart="100" YEnd="200">
        <Parts>
          <Part Partname="1" Xstart="20" XEnd="600" YStart="100" YEnd="130"/>
        </Parts>
      </Zone>
      <Zone Zonename="C" Xstart="0" XEnd="612" YStart="200" YEnd="700">
        <Parts>
          <Part Partname="1" Xstart="20" XEnd="600" YStart="200" YEnd="224"/>
        </Parts>
      </Zone>
    </Zones>
  </Page>
</Pages>"#;

const CONTENT: &str = "1_A_1|T|Invoice for %%1_Company%%\n1_C_1|A:Items|%%Description%%\n";

const CUSTOMERS: &str = r#"<Invoices>
  <Invoice>
    <Id>1001</Id>
    <Company>Acme</Company>
    <Items>
      <Item><Description>Widget</Description></Item>
      <Item><Description>Gadget</Description></Item>
      <Item><Description>Sprocket</Description></Item>
    </Items>
  </Invoice>
  <Invoice>
    <Id>1002</Id>
    <Items>
      <Item><Description>Cog</Description></Item>
    </Items>
  </Invoice>
</Invoices>"#;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("layout.xml"), LAYOUT).unwrap();
        fs::write(dir.path().join("content.txt"), CONTENT).unwrap();
        fs::write(dir.path().join("variables.txt"), "1|Dear|\n").unwrap();
        fs::write(dir.path().join("customers.xml"), CUSTOMERS).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, builder: Pagebind) -> pagebind::RunResult {
        builder
            .run(
                self.path("layout.xml"),
                self.path("content.txt"),
                self.path("variables.txt"),
                self.path("customers.xml"),
                self.path("out"),
            )
            .unwrap()
    }
}

fn no_part_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .all(|entry| entry.path().extension().map_or(true, |ext| ext != "part"))
}

#[test]
fn test_run_pdf_partial_success() {
    let fixture = Fixture::new();
    let result = fixture.run(Pagebind::new());

    // Record 1002 has no Company field.
    assert_eq!(result.outcome(), RunOutcome::PartialSuccess);
    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.report.failures.len(), 1);
    assert_eq!(result.report.failures[0].record.key.as_deref(), Some("1002"));

    let artifact = &result.artifacts[0];
    assert_eq!(artifact.path, fixture.path("out").join("record-1-1001.pdf"));
    assert!(no_part_files(&fixture.path("out")));

    // Two row slots per page: three items need one continuation page.
    let pdf = lopdf::Document::load(&artifact.path).unwrap();
    assert_eq!(pdf.get_pages().len(), 2);
    assert_eq!(fs::metadata(&artifact.path).unwrap().len() as usize, artifact.bytes);
}

#[test]
fn test_run_json_round_trips() {
    let fixture = Fixture::new();
    let result = fixture.run(Pagebind::new().with_format("json").sequential());

    let text = fs::read_to_string(&result.artifacts[0].path).unwrap();
    let doc: ComposedDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[1].is_continuation());
    assert_eq!(doc.pages[1].blocks[0].resolved_value, "logo.png");
    assert_eq!(doc.pages[1].blocks[1].resolved_value, "Sprocket");
    assert_eq!(&doc, &result.report.documents[0]);
}

#[test]
fn test_run_text_proof() {
    let fixture = Fixture::new();
    let result = fixture.run(Pagebind::new().with_format("text"));

    let text = fs::read_to_string(&result.artifacts[0].path).unwrap();
    assert!(text.contains("Invoice for Acme"));
    assert!(text.contains("A:Items[3]"));
    assert!(text.contains("continuation 1"));
}

#[test]
fn test_write_batch_replaces_existing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut report = compose_str(LAYOUT, CONTENT, "", CUSTOMERS).unwrap();
    let options = RenderOptions::default();

    let first = write_batch(&mut report, &PdfRenderer, dir.path(), &options).unwrap();
    let second = write_batch(&mut report, &PdfRenderer, dir.path(), &options).unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].path, second[0].path);
    assert!(no_part_files(dir.path()));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
