//! BrewFlash command-line flasher
//!
//! Walks the user through picking a firmware from the online catalog,
//! finding the board's serial port and flashing it with esptool or avrdude.

mod cli;
mod prompt;
mod session;
mod settings;

use std::process::ExitCode;

use brew_catalog::{CatalogLocation, JsonCatalogSource};
use brew_detect::PortScanner;
use brew_flash::{Backends, FlashError, HttpFetcher, SerialHandshake};
use clap::Parser;
use cli::Cli;
use prompt::Prompt;
use session::{Outcome, Session, Toolkit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = Cli::parse();

    let default_filter = match args.verbose {
        0 => "brewflash=info,brew_catalog=info,brew_detect=info,brew_plan=info,brew_flash=info",
        1 => {
            "brewflash=debug,brew_catalog=debug,brew_detect=debug,\
             brew_plan=debug,brew_flash=debug"
        }
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = settings::load();
    tracing::info!("Starting BrewFlash v{}", config.version);

    let location = CatalogLocation::parse(args.catalog.as_deref().unwrap_or(&config.catalog));
    let catalog = JsonCatalogSource::new(location).esptool_only(args.esptool_only);
    let fetcher = HttpFetcher::new();
    let handshake = SerialHandshake;
    let ports = PortScanner::new();
    let toolkit = Toolkit {
        catalog: &catalog,
        fetcher: &fetcher,
        handshake: &handshake,
        ports: &ports,
        backends: Backends::from_config(&config),
    };

    let mut session = Session::new(&config, &args, Prompt::stdio());
    match session.run(toolkit) {
        Ok(Outcome::Flashed(report)) => {
            tracing::debug!("Flashed {} segment(s) to {}", report.segments, report.port);
            println!("Done! Exiting.");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Declined | Outcome::NoDevice) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(error: &anyhow::Error) {
    eprintln!("\nError: {error:#}");
    if let Some(flash) = error.downcast_ref::<FlashError>() {
        if flash.is_fatal() {
            tracing::error!("Aborting: {}", flash);
        }
        for hint in flash.remediation() {
            eprintln!("\n{hint}");
        }
    }
}
