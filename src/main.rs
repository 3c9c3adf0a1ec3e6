use anyhow::{Context, Result};
use clap::Parser;
use peerscope::cli::{Cli, OutputFormat};
use peerscope::config::AnalysisConfig;
use peerscope::{csv_output, json_output, pipeline, text_output};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolve configuration: file (if any), then command-line overrides
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    Ok(args.apply(base))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let report = pipeline::analyze_bytes(&bytes, &config)
        .with_context(|| format!("Failed to analyse {}", args.input.display()))?;

    let output = match (args.format, args.gaps_only) {
        (OutputFormat::Text, false) => text_output::render(&report),
        (OutputFormat::Text, true) => text_output::render_gaps_only(&report),
        (OutputFormat::Json, false) => json_output::to_json(&report)?,
        (OutputFormat::Json, true) => json_output::gaps_to_json(&report)?,
        (OutputFormat::Csv, _) => csv_output::to_csv(&report, args.table)?,
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
