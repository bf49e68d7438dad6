use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use rayon::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use variableizer::prelude::*;

/// How the anomaly report is printed.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Turns contact flow exports into parameterized templates
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Flow file to process, or a directory of flow files when --all is given
    input: PathBuf,

    /// Process every *.json file in the input directory
    #[arg(long)]
    all: bool,

    /// Rule definitions file (JSON or JSONC)
    #[arg(short, long, default_value = "block-definitions.jsonc")]
    rules: PathBuf,

    /// Directory the variableized flows are written to
    #[arg(short, long, default_value = "outputted/flows")]
    output_dir: PathBuf,

    /// Optional TOML file with [policy] and [layout] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format of the anomaly report
    #[arg(long, value_enum, default_value_t)]
    report_format: ReportFormat,

    /// Exit non-zero when any file reports a fatal anomaly (e.g. a name collision)
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Result of processing one flow file.
struct FileReport {
    input: PathBuf,
    result: Result<(PathBuf, RunOutcome)>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => exit_with_error(&format!("{:#}", e)),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(false)` when at least one file failed (or reported a fatal anomaly in
/// strict mode); errors that stop the whole batch are returned as `Err`.
fn run(cli: Cli) -> Result<bool> {
    let total_start = Instant::now();

    // --- 1. Configuration and rules ---
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => Config::default(),
    };
    println!("Loading rule definitions from: {}", cli.rules.display());
    let index = RuleIndex::from_file(&cli.rules)
        .with_context(|| format!("Failed to load rules '{}'", cli.rules.display()))?;

    println!("Found {} node types:", index.node_types().count());
    for node_type in index.node_types() {
        let rules = index.lookup(node_type);
        let drafts = rules.iter().filter(|rule| !rule.is_active()).count();
        if drafts > 0 {
            println!("  {}: {} rules ({} draft)", node_type, rules.len(), drafts);
        } else {
            println!("  {}: {} rules", node_type, rules.len());
        }
    }

    // --- 2. Input discovery ---
    let inputs = discover_inputs(&cli.input, cli.all)?;
    if inputs.is_empty() {
        bail!("No flow files found in '{}'", cli.input.display());
    }
    fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            cli.output_dir.display()
        )
    })?;
    println!("Output directory: {}", cli.output_dir.display());

    // --- 3. Variableization, one independent run per file ---
    println!("\nProcessing {} flow file(s)...", inputs.len());
    let engine = Variableizer::builder(&index)
        .with_config(config.clone())
        .build();
    let reports: Vec<FileReport> = inputs
        .par_iter()
        .map(|input| FileReport {
            input: input.clone(),
            result: process_flow_file(&engine, &config.layout, input, &cli.output_dir),
        })
        .collect();

    // --- 4. Results ---
    let mut all_ok = true;
    for report in &reports {
        match &report.result {
            Ok((output, outcome)) => {
                println!(
                    "\nProcessed: {} -> {}",
                    report.input.display(),
                    output.display()
                );
                println!(
                    "  {} nodes ({} done, {} skipped, {} failed), {} substitutions, {} mirrored",
                    outcome.stats.nodes_seen,
                    outcome.stats.nodes_done,
                    outcome.stats.nodes_skipped,
                    outcome.stats.nodes_failed,
                    outcome.stats.substitutions,
                    outcome.stats.mirrors
                );
                if !outcome.report.is_empty() {
                    let rendered = match cli.report_format {
                        ReportFormat::Table => ReportFormatter::format_table(&outcome.report),
                        ReportFormat::Json => ReportFormatter::format_json(&outcome.report),
                    };
                    println!("{}", rendered);
                }
                if cli.strict && outcome.has_fatal() {
                    error!(file = %report.input.display(), "fatal anomalies recorded");
                    all_ok = false;
                }
            }
            Err(e) => {
                eprintln!("\nError processing {}: {:#}", report.input.display(), e);
                all_ok = false;
            }
        }
    }

    info!(elapsed = ?total_start.elapsed(), files = reports.len(), "batch finished");
    println!("\nDone!");
    Ok(all_ok)
}

fn discover_inputs(input: &Path, all: bool) -> Result<Vec<PathBuf>> {
    if !all {
        if !input.is_file() {
            bail!("'{}' not found", input.display());
        }
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("'{}' is not a directory", input.display());
    }

    let pattern = input.join("*.json");
    let pattern = pattern.to_string_lossy();
    let mut inputs = glob::glob(&pattern)
        .with_context(|| format!("Invalid glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    inputs.sort();
    Ok(inputs)
}

fn process_flow_file(
    engine: &Variableizer<'_>,
    layout: &FlowLayout,
    input: &Path,
    output_dir: &Path,
) -> Result<(PathBuf, RunOutcome)> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let mut flow: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse '{}' as JSON", input.display()))?;
    validate_identifiers(&flow, layout)?;

    let outcome = engine.run(&mut flow);

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flow".to_string());
    let output = output_dir.join(format!("{}_variableized.json", stem));
    let rendered = serde_json::to_string_pretty(&flow)?;
    fs::write(&output, rendered)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    Ok((output, outcome))
}

/// Node identifiers end up inside variable names, so they must be restricted to
/// letters, digits, underscores and hyphens.
fn validate_identifiers(flow: &Value, layout: &FlowLayout) -> Result<()> {
    let Some(nodes) = flow.get(&layout.nodes_key).and_then(Value::as_array) else {
        return Ok(());
    };
    for node in nodes {
        if let Some(id) = node.get(&layout.identifier_key).and_then(Value::as_str) {
            if !is_valid_identifier(id) {
                bail!(
                    "Node identifier '{}' may only contain letters, digits, '_' and '-'",
                    id
                );
            }
        }
    }
    Ok(())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
