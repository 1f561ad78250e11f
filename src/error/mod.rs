//! Error handling for the latency tester
//!
//! Every error is fatal to a run. The variants exist so the operator can tell
//! which stage gave up, and so each stage exits with its own status code.

use thiserror::Error;

/// Custom error types for the latency tester
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Hostname lookup failed or returned no addresses
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// Dial failed or the reconnect budget was exhausted
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered a probe with an error
    #[error("Probe error: {0}")]
    Probe(String),

    /// Writing or flushing the result file failed
    #[error("Output error: {0}")]
    Output(String),

    /// I/O errors (log files, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    /// Create a new probe error
    pub fn probe<S: Into<String>>(message: S) -> Self {
        Self::Probe(message.into())
    }

    /// Create a new output error
    pub fn output<S: Into<String>>(message: S) -> Self {
        Self::Output(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::DnsResolution(_) => "DNS",
            Self::Connection(_) => "CONNECTION",
            Self::Probe(_) => "PROBE",
            Self::Output(_) => "OUTPUT",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) => 1,  // Invalid configuration/usage
            Self::DnsResolution(_) => 6,  // clap owns 2
            Self::Connection(_) => 3,
            Self::Probe(_) => 4,
            Self::Output(_) | Self::Io(_) => 5,
            Self::Internal(_) => 99,  // Internal/unexpected errors
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::DnsResolution(_) | Self::Connection(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Probe(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Output(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(error: csv::Error) -> Self {
        Self::output(format!("CSV write failed: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
