//! KV Latency Tester - Main CLI Application
//!
//! Issues rate-limited PING probes against a Redis-compatible server from a
//! pool of clients and writes every probe's latency to a CSV file.

use clap::Parser;
use kv_latency_tester::{
    cli::Cli,
    client::RespClientFactory,
    config::{load_config, EnvManager},
    dns::{EndpointResolver, SystemLookup},
    error::{AppError, Result},
    log_info,
    logging::{stderr_supports_color, Logger},
    models::RunConfig,
    output::create_output_file,
    Orchestrator, RunSummary, PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    // .env values must be in place before clap reads its env fallbacks
    if let Err(e) = EnvManager::load_env_file() {
        exit_with(&e);
    }

    let cli = Cli::parse();

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let logger = match Logger::from_config(PKG_NAME, &config) {
        Ok(logger) => logger,
        Err(e) => exit_with(&e),
    };

    let logs_to_file = config.log_file.is_some();
    let out_file = config.out_file.clone();

    match run_application(config, &logger).await {
        Ok(summary) => {
            log_info!(logger, "Wrote {} rows to {}", summary.jobs_completed, out_file.display());
            logger.flush();
        }
        Err(e) => {
            // Console logging would print the same line twice
            if logs_to_file {
                logger.fatal(&e.to_string()).error_info(&e).log();
            }
            logger.flush();
            exit_with(&e);
        }
    }
}

/// Main application logic
async fn run_application(config: RunConfig, logger: &Logger) -> Result<RunSummary> {
    logger.info(&format!("{} v{}", PKG_NAME, VERSION)).log();
    logger.debug(&format!("Configuration:\n{}", config.display_summary())).log();

    for warning in EnvManager::validate_current_env() {
        logger.warn(&warning).log();
    }

    let resolver = EndpointResolver::new(
        Arc::new(SystemLookup::new()),
        config.host.clone(),
        config.port,
        logger.child("resolver"),
    );
    let factory = RespClientFactory::from_config(&config, resolver, logger.clone());
    let sink = create_output_file(&config.out_file)?;

    let mut orchestrator = Orchestrator::new(config, Arc::new(factory), logger.clone());
    orchestrator.run(sink).await
}

/// Print the single diagnostic line and terminate with the error's exit code
fn exit_with(error: &AppError) -> ! {
    eprintln!("Error: {}", error.format_for_console(stderr_supports_color()));
    process::exit(error.exit_code());
}
