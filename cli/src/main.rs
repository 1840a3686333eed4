//! pagebind CLI - variable-data document composition tool

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagebind::render;
use pagebind::{
    compose_inputs, load_inputs, BatchReport, ComposeOptions, Composer, Inputs, LoadOptions,
    RecordFailure, RenderOptions, RenderedArtifact, RendererRegistry, RunOutcome,
};

#[derive(Parser)]
#[command(name = "pagebind")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Compose layouts, content rules, variables and customer data into documents", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(flatten)]
    inputs: Option<InputArgs>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose every customer record and write one document per record
    Compose {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Load and validate the four inputs without composing
    Check {
        #[command(flatten)]
        inputs: InputArgs,

        /// Abort on customer records that fail type checks
        #[arg(long)]
        strict: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Page layout (XML)
    #[arg(value_name = "LAYOUT")]
    layout: PathBuf,

    /// Content rules
    #[arg(value_name = "CONTENT")]
    content: PathBuf,

    /// Variable table
    #[arg(value_name = "VARIABLES")]
    variables: PathBuf,

    /// Customer data (XML or JSON)
    #[arg(value_name = "CUSTOMERS")]
    customers: PathBuf,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    format: OutputFormat,

    /// Compose records one at a time
    #[arg(long)]
    sequential: bool,

    /// Abort on customer records that fail type checks
    #[arg(long)]
    strict: bool,

    /// Height of one array row slot, in layout units
    #[arg(long, value_name = "N", default_value_t = pagebind::compose::DEFAULT_ROW_HEIGHT)]
    row_height: u32,

    /// PDF font size in points
    #[arg(long, value_name = "N", default_value_t = 10.0)]
    font_size: f32,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One PDF per record
    Pdf,
    /// Composed page structure as JSON
    Json,
    /// Plain-text proof listing
    Text,
}

impl OutputFormat {
    fn renderer_name(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Compose { inputs, run }) => cmd_compose(&inputs, &run),
        Some(Commands::Check { inputs, strict }) => cmd_check(&inputs, strict),
        Some(Commands::Version) => {
            cmd_version();
            Ok(RunOutcome::Success)
        }
        None => {
            // Default behavior: compose if the four inputs are provided
            if let Some(inputs) = cli.inputs {
                cmd_compose(&inputs, &cli.run)
            } else {
                println!(
                    "{}",
                    "Usage: pagebind <LAYOUT> <CONTENT> <VARIABLES> <CUSTOMERS> [-o DIR]".yellow()
                );
                println!("       pagebind --help for more information");
                Ok(RunOutcome::Success)
            }
        }
    };

    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_code() as u8),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(RunOutcome::Failure.exit_code() as u8)
        }
    }
}

fn load_options(strict: bool) -> LoadOptions {
    if strict {
        LoadOptions::new().strict()
    } else {
        LoadOptions::new()
    }
}

fn load(inputs: &InputArgs, options: &LoadOptions) -> pagebind::Result<Inputs> {
    load_inputs(
        &inputs.layout,
        &inputs.content,
        &inputs.variables,
        &inputs.customers,
        options,
    )
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb
}

fn cmd_compose(
    inputs: &InputArgs,
    run: &RunArgs,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let registry = RendererRegistry::with_defaults();
    let renderer = registry.require(run.format.renderer_name())?;
    let render_options = RenderOptions::new().with_font_size(run.font_size);
    let compose_options = ComposeOptions::new()
        .with_row_height(run.row_height)
        .with_parallel(!run.sequential);

    let pb = spinner("Loading inputs...");
    let loaded = load(inputs, &load_options(run.strict))?;
    pb.set_message("Composing records...");
    let mut report = compose_inputs(loaded, compose_options)?;
    pb.finish_and_clear();

    std::fs::create_dir_all(&run.output)?;
    log::debug!(
        "rendering {} document(s) as {} into {}",
        report.documents.len(),
        renderer.name(),
        run.output.display()
    );
    let pb = ProgressBar::new(report.documents.len() as u64);
    let template = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut artifacts: Vec<RenderedArtifact> = Vec::new();
    let mut render_failures = Vec::new();
    for doc in &report.documents {
        pb.set_message(doc.record.to_string());
        let path = render::artifact_path(&run.output, doc, renderer.as_ref());
        match render::write_document(doc, renderer.as_ref(), &path, &render_options) {
            Ok(artifact) => artifacts.push(artifact),
            Err(err) => {
                render_failures.push(RecordFailure::new(doc.record.clone(), err).at("rendering"))
            }
        }
        pb.inc(1);
    }
    for failure in render_failures {
        let record = failure.record.clone();
        report.fail_document(&record, failure);
    }
    pb.finish_and_clear();

    print_report(&report, &artifacts, &run.output);
    Ok(report.outcome)
}

fn print_report(report: &BatchReport, artifacts: &[RenderedArtifact], output: &Path) {
    let outcome = match report.outcome {
        RunOutcome::Success => report.outcome.to_string().green().bold(),
        RunOutcome::PartialSuccess => report.outcome.to_string().yellow().bold(),
        RunOutcome::Failure => report.outcome.to_string().red().bold(),
    };
    println!(
        "{}: {} of {} record(s) composed in {} ms",
        outcome,
        report.succeeded(),
        report.succeeded() + report.failed(),
        report.duration().num_milliseconds()
    );

    if !artifacts.is_empty() {
        println!("\n{} {}", "Output files:".green().bold(), output.display());
        let last = artifacts.len() - 1;
        for (i, artifact) in artifacts.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            let name = artifact
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("  {} {} ({} bytes)", branch.dimmed(), name, artifact.bytes);
        }
    }

    let warnings: Vec<_> = report.warnings().collect();
    if !warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for (record, warning) in warnings {
            println!("  {} record {}: {}", "-".dimmed(), record, warning);
        }
    }

    if !report.failures.is_empty() {
        println!("\n{}", "Failed records:".red().bold());
        for failure in &report.failures {
            println!("  {} {}", "-".dimmed(), failure);
        }
    }
}

fn cmd_check(inputs: &InputArgs, strict: bool) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let loaded = load(inputs, &load_options(strict))?;
    Composer::new(
        &loaded.layout,
        &loaded.content,
        &loaded.variables,
        ComposeOptions::default(),
    )?;

    println!("{}", "Input Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Pages".bold(), loaded.layout.page_count());
    println!("{}: {}", "Zones".bold(), loaded.layout.zone_count());
    println!("{}: {}", "Parts".bold(), loaded.layout.part_count());
    println!("{}: {}", "Content rules".bold(), loaded.content.len());
    println!("{}: {}", "Variables".bold(), loaded.variables.len());
    println!("{}: {}", "Records".bold(), loaded.customers.records.len());
    println!(
        "{}: {}",
        "Skipped records".bold(),
        loaded.customers.rejected.len()
    );

    for rejected in &loaded.customers.rejected {
        println!("  {} record {}: {}", "-".dimmed(), rejected.id, rejected.error);
    }

    let outcome = if loaded.customers.rejected.is_empty() {
        RunOutcome::Success
    } else {
        RunOutcome::PartialSuccess
    };
    println!("\n{}", "Inputs are valid.".green());
    Ok(outcome)
}

fn cmd_version() {
    println!("{} {}", "pagebind".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Variable-data document composition tool");
    println!();
    println!("Formats: pdf, json, text");
    println!("License: MIT");
}
