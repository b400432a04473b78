mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod scenario;
mod utils;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if parse_failure_code(&e) == 0 => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let outcome = std::panic::catch_unwind(move || run_app(cli));
    match &outcome {
        Ok(Err(e)) => eprintln!("\n❌ Error: {}", e),
        Err(_) => eprintln!("\n❌ Error: the simulation panicked"),
        Ok(Ok(())) => {}
    }
    std::process::exit(exit_code(&outcome));
}

/// `--help` and `--version` succeed; every other argument error is a failure.
fn parse_failure_code(error: &clap::Error) -> i32 {
    if error.exit_code() == 0 { 0 } else { 1 }
}

fn exit_code(outcome: &std::thread::Result<Result<()>>) -> i32 {
    match outcome {
        Ok(Ok(())) => 0,
        Ok(Err(_)) | Err(_) => 1,
    }
}

fn run_app(cli: Cli) -> Result<()> {
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 IBFSI CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!(
            "Setting Rayon global thread pool to {} threads.",
            num_threads
        );
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let command_result =
        commands::run::run(&cli.parameters, &cli.set_values, cli.history.as_deref());

    match &command_result {
        Ok(_) => {
            info!("✅ Simulation completed successfully.");
        }
        Err(e) => {
            error!("❌ Simulation failed: {}", e);
        }
    }
    command_result
}
