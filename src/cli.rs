//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap.
//! Every serving option can also be set through the environment.

use clap::Parser;
use std::path::PathBuf;

/// Dealboard - sales deal analytics dashboard
///
/// Loads a deal snapshot, aggregates it per manager, ad source and
/// product, and serves the resulting charts as a single web page.
///
/// Examples:
///   dealboard --data deals.csv
///   PORT=8080 dealboard
///   dealboard --data deals.json --output dashboard.html
///   dealboard --output summary.json --format json
///   dealboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the deal snapshot (CSV or JSON)
    ///
    /// Defaults to the [data] path from the config file, or deals.csv.
    #[arg(short, long, value_name = "FILE", env = "DEALBOARD_DATA")]
    pub data: Option<PathBuf>,

    /// Address to bind the web server to
    #[arg(long, value_name = "HOST", env = "HOST")]
    pub host: Option<String>,

    /// Port to bind the web server to (default: 10000)
    #[arg(short, long, value_name = "PORT", env = "PORT")]
    pub port: Option<u16>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .dealboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the rendered dashboard to a file and exit instead of serving it
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format for --output (html, json)
    #[arg(long, default_value = "html", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .dealboard.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Standalone HTML page (default)
    #[default]
    Html,
    /// Summary tables and chart specifications as JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if self.format == OutputFormat::Json && self.output.is_none() {
            return Err("--format json requires --output".to_string());
        }

        if let Some(ref host) = self.host {
            if host.trim().is_empty() {
                return Err("Host must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
