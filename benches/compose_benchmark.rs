//! Benchmarks for pagebind composition performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks compose synthetic invoice batches.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagebind::parser::{parse_content, parse_customers, parse_layout, parse_variables};
use pagebind::{ComposeOptions, Composer, LoadOptions};

const LAYOUT: &str = r#"<Pages>
  <Page Pagenumber="1">
    <Pagesize>612x792</Pagesize>
    <Overflow>true</Overflow>
    <Image Imagename="logo.png" Xstart="20" XEnd="120" YStart="20" YEnd="80"/>
    <Zones>
      <Zone Zonename="A" Xstart="0" XEnd="612" YStart="100" YEnd="200">
        <Parts>
          <Part Partname="1" Xstart="20" XEnd="300" YStart="100" YEnd="150"/>
          <Part Partname="2" Xstart="300" XEnd="600" YStart="100" YEnd="150"/>
        </Parts>
      </Zone>
      <Zone Zonename="C" Xstart="0" XEnd="612" YStart="200" YEnd="700">
        <Parts>
          <Part Partname="1" Xstart="20" XEnd="600" YStart="200" YEnd="440"/>
        </Parts>
      </Zone>
    </Zones>
  </Page>
</Pages>"#;

const CONTENT: &str = "\
1_A_1|T|%%1%% %%1_Company%%
1_A_2|%%1_Balance%% > 0|T|Balance due: %%1_Balance%%
1_C_1|A:Items|%%Description%% x %%Quantity%% @ %%UnitPrice%%
";

const VARIABLES: &str = "1|Dear|\n2|Acme Billing|\n";

/// Creates a synthetic XML invoice batch.
fn create_customers(records: usize, items: usize) -> String {
    let mut xml = String::from("<Invoices>");
    for r in 0..records {
        xml.push_str(&format!(
            "<Invoice><Id>{}</Id><Company>Company {}</Company><Balance>{}.50</Balance><Items>",
            r + 1,
            r + 1,
            r * 10
        ));
        for i in 0..items {
            xml.push_str(&format!(
                "<Item><Description>Item {}</Description><Quantity>{}</Quantity><UnitPrice>{}.00</UnitPrice></Item>",
                i + 1,
                i % 5 + 1,
                i + 3
            ));
        }
        xml.push_str("</Items></Invoice>");
    }
    xml.push_str("</Invoices>");
    xml
}

/// Benchmark loading of the four inputs.
fn bench_loading(c: &mut Criterion) {
    let options = LoadOptions::default();
    let customers = create_customers(100, 10);

    c.bench_function("load_layout", |b| {
        b.iter(|| parse_layout(black_box(LAYOUT), &options).unwrap());
    });

    c.bench_function("load_customers_100", |b| {
        b.iter(|| parse_customers(black_box(&customers), &options).unwrap());
    });
}

/// Benchmark batch composition at various sizes, parallel and sequential.
fn bench_composition(c: &mut Criterion) {
    let options = LoadOptions::default();
    let layout = parse_layout(LAYOUT, &options).unwrap();
    let content = parse_content(CONTENT, &options).unwrap();
    let variables = parse_variables(VARIABLES, &options).unwrap();

    let mut group = c.benchmark_group("composition");

    for record_count in [10, 100, 1000].iter() {
        let customers = parse_customers(&create_customers(*record_count, 30), &options).unwrap();

        for (label, compose_options) in [
            ("parallel", ComposeOptions::default()),
            ("sequential", ComposeOptions::default().sequential()),
        ] {
            let composer = Composer::new(&layout, &content, &variables, compose_options).unwrap();
            group.bench_function(format!("{}_records_{}", record_count, label), |b| {
                b.iter(|| composer.compose_batch(black_box(&customers.records)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_loading, bench_composition);
criterion_main!(benches);
