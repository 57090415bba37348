//! printspec - Validate print-ready PDFs and images.
//!
//! A CLI tool that checks files against a print shop's production
//! specification before they go to press.

mod cli;

use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use printspec::batch::BatchRunner;
use printspec::error::PrintSpecError;
use printspec::output::{OutputFormatter, create_formatter, create_renderer};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Run the application and handle errors
    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(err.exit_code());
        }
    }
}

/// Install the log subscriber.
///
/// Logs go to stderr so stdout carries only reports. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "printspec=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
///
/// Returns the process exit status for a completed batch.
async fn run(cli: Cli) -> Result<i32, PrintSpecError> {
    // Validate CLI arguments
    cli.validate()?;

    // Resolve settings before touching any input
    let config = Arc::new(cli.to_config()?);
    let all_inputs = cli.get_all_inputs().await?;
    let run_config = cli.to_run_config(all_inputs)?;

    let formatter = create_formatter(&run_config);
    let renderer = create_renderer(&run_config, &formatter);

    if formatter.is_verbose() {
        formatter.debug(&format!("{} v{}", printspec::NAME, printspec::VERSION));
        describe_config(&formatter, &config);
    }

    formatter.info(&format!(
        "Validating {} file(s)...",
        run_config.inputs.len()
    ));

    let runner = BatchRunner::from_run_config(Arc::clone(&config), &run_config);
    let (reports, summary) = runner
        .run_paths_with_progress(&run_config.inputs, |done, total, report| {
            formatter.progress(done, total, Some(&report.item_name));
        })
        .await;

    formatter.clear_line();
    formatter.raw(&renderer.render(&reports, &summary)?);

    Ok(summary.exit_code())
}

/// Print the effective settings in verbose mode.
fn describe_config(formatter: &OutputFormatter, config: &printspec::ValidationConfig) {
    let sizes = config
        .accepted_sizes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let colorants = config
        .accepted_colorants
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    formatter.debug(&format!("Accepted sizes: {sizes}"));
    formatter.debug(&format!(
        "Tolerance: {} in (documents), {} in (images)",
        config.document_tolerance, config.image_tolerance
    ));
    formatter.debug(&format!("Minimum resolution: {} DPI", config.min_dpi));
    formatter.debug(&format!("Safe-zone margin: {:.3} in", config.margin.inches()));
    formatter.debug(&format!("Accepted colorants: {colorants}"));
}
