//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    client::RetryPolicy,
    error::{AppError, Result},
    models::RunConfig,
};
use std::time::Duration;

/// Turns parsed arguments (with their environment fallbacks) into a `RunConfig`
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Build and validate the run configuration
    pub fn parse(&self) -> Result<RunConfig> {
        self.cli.validate().map_err(AppError::config)?;

        let config = RunConfig {
            host: self.cli.redis_host.trim().to_string(),
            port: self.cli.redis_port,
            password: self.cli.password().map(String::from),
            workers: self.cli.clients,
            jobs: self.cli.writes,
            rate_limit: self.cli.rate_limit,
            log_file: self.cli.logfile.clone(),
            out_file: self.cli.out_file.clone(),
            retry: RetryPolicy {
                min_backoff: Duration::from_millis(self.cli.min_retry_backoff_ms),
                max_backoff: Duration::from_millis(self.cli.max_retry_backoff_ms),
                max_retries: self.cli.max_retries,
            },
            dial_timeout: Duration::from_millis(self.cli.dial_timeout_ms),
            read_timeout: Duration::from_millis(self.cli.read_timeout_ms),
            log_level: self.cli.log_level,
            log_format: self.cli.log_format,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<RunConfig> {
    ConfigParser::new(cli).parse()
}
