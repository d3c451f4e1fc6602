//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.dealboard.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".dealboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Chart labels, colors and layout.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Web server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

/// Snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the deal snapshot.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("deals.csv")
}

/// Dashboard presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Page and figure title.
    pub title: String,
    /// Figure height in pixels.
    pub height: u32,
    /// Order owner and ad panels by conversion rate instead of by name.
    pub sort_by_conversion: bool,
    /// Color of the deal count bars.
    pub bar_color: String,
    /// Color of the amount line.
    pub line_color: String,
    pub owner_title: String,
    pub ad_title: String,
    pub product_sum_title: String,
    pub product_count_title: String,
    /// Legend name of the deal count bars.
    pub clients_label: String,
    /// Legend name of the amount line.
    pub amount_label: String,
    pub clients_axis_title: String,
    pub amount_axis_title: String,
    pub sum_axis_title: String,
    pub count_axis_title: String,
    pub legend_title: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Sales Analytics Dashboard".to_string(),
            height: 1000,
            sort_by_conversion: false,
            bar_color: "#1f77b4".to_string(),
            line_color: "#ff7f0e".to_string(),
            owner_title: "Manager performance".to_string(),
            ad_title: "Ad campaign performance".to_string(),
            product_sum_title: "Contracts by amount".to_string(),
            product_count_title: "Contracts by count".to_string(),
            clients_label: "Clients".to_string(),
            amount_label: "Contract amount".to_string(),
            clients_axis_title: "Number of clients".to_string(),
            amount_axis_title: "Contract amount".to_string(),
            sum_axis_title: "Amount".to_string(),
            count_axis_title: "Count".to_string(),
            legend_title: "Parameters".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.dealboard.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments and environment variables take precedence over
    /// config file settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
    }

    /// Socket address string the server binds to.
    ///
    /// IPv6 hosts are bracketed (`[::]:10000`).
    pub fn bind_address(&self) -> String {
        let host = self.server.host.as_str();
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.server.port)
        } else {
            format!("{}:{}", host, self.server.port)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
