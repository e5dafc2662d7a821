mod archiver;
mod batch;
mod config;
mod converter;
mod dates;
mod error;
mod fetcher;
mod interrupt;
mod locator;
mod models;
mod parser;
mod prompt;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::archiver::ImageFetcher;
use crate::batch::BatchOrchestrator;
use crate::config::{Cli, Config};
use crate::converter::{LocalToUtcConverter, SupportedRange};
use crate::fetcher::HttpTransport;
use crate::interrupt::Cancellation;
use crate::locator::ImageLocator;
use crate::prompt::TerminalConsole;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.into()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "moon_phases=debug,reqwest=warn,hyper=warn"
    } else {
        "moon_phases=info,reqwest=warn,hyper=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: Config) -> Result<u8> {
    tracing::info!("Starting moon_phases v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "configuration");

    let cancellation = Cancellation::install().context("failed to install the Ctrl-C handler")?;
    let transport = HttpTransport::new(config.timeout).context("failed to build the HTTP client")?;

    let mut batch = BatchOrchestrator::new(
        TerminalConsole::stdio(config.show_progress),
        config.zone.today(),
        LocalToUtcConverter::new(config.zone, SupportedRange::current()),
        ImageLocator::new(&transport, config.api_base.as_str(), config.quality),
        ImageFetcher::new(&transport, cancellation.clone()),
        config.download_dir.clone(),
        config.quality,
        config.confirm,
        cancellation,
    );

    Ok(batch.run().exit_code())
}
