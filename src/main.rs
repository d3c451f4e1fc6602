//! Dealboard - sales deal analytics dashboard
//!
//! Loads a static snapshot of deals, aggregates it per manager, per ad
//! source and per product/education type, and serves the resulting
//! charts as a single web page.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Startup error (bad arguments, config, snapshot, bind failure)

mod analysis;
mod chart;
mod cli;
mod config;
mod loader;
mod models;
mod report;
mod server;

use anyhow::{Context, Result};
use axum::body::Bytes;
use chart::Dashboard;
use cli::{Args, OutputFormat};
use config::Config;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Dealboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Dealboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .dealboard.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .dealboard.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .dealboard.toml")?;

    println!("✅ Created .dealboard.toml with default settings.");
    println!("   Edit it to customize the server, snapshot path and chart labels.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, aggregate, assemble, then either write the result or serve it.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let dashboard = build_dashboard(&config)?;
    print_summary(&dashboard, args.quiet);

    if let Some(ref output_path) = args.output {
        let output = match args.format {
            OutputFormat::Html => report::render_html(&dashboard)?,
            OutputFormat::Json => report::render_json(&dashboard)?,
        };
        std::fs::write(output_path, &output)
            .with_context(|| format!("Failed to write dashboard to {}", output_path.display()))?;

        if !args.quiet {
            println!("\n✅ Dashboard saved to: {}", output_path.display());
        }
        return Ok(());
    }

    let page = Bytes::from(report::render_html(&dashboard)?);
    let listener = server::bind(&config.bind_address()).await?;

    if !args.quiet {
        println!("\n🌐 Serving dashboard at http://{}", config.bind_address());
    }
    server::serve(listener, page).await
}

/// Run the pipeline once over the configured snapshot.
fn build_dashboard(config: &Config) -> Result<Dashboard> {
    let deals = loader::load_deals(&config.data.path)?;
    if deals.is_empty() {
        warn!("Snapshot {} contains no deals", config.data.path.display());
    }

    let data = analysis::prepare_data(&deals);
    Ok(chart::assemble_dashboard(
        &data,
        deals.len(),
        &config.dashboard,
    ))
}

fn print_summary(dashboard: &Dashboard, quiet: bool) {
    if quiet {
        return;
    }

    let data = &dashboard.data;
    println!("\n📊 Dashboard Summary:");
    println!("   Deals: {}", dashboard.deal_count);
    println!("   Managers: {}", data.owners.len());
    println!("   Ad sources: {}", data.ads.len());
    println!(
        "   Products: {} | Education types: {}",
        data.products.sum.rows.len(),
        data.products.sum.columns.len()
    );
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .dealboard.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
