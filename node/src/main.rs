use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use o2ul_economics::{
    DecisionSource, PegBandSource, StableTokenConfig, UltraStableManager, ValueTokenConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod banner;
mod config;
mod genesis;
pub mod logging;
mod version;

use config::NodeConfig;

#[derive(Parser)]
#[command(name = "o2ul")]
#[command(about = "O2UL dual-token node")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Chain ID (ignored when a config file is given)
    #[arg(long)]
    chain_id: Option<u64>,

    /// Use devnet defaults
    #[arg(long)]
    devnet: bool,

    /// UltraStable scheduler tick in seconds
    #[arg(long, value_name = "SECS")]
    update_interval: Option<u64>,

    /// Treasury account for supply adjustments (hex)
    #[arg(long, value_name = "ADDR")]
    treasury: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Where to write the file
        #[arg(short, long, default_value = "o2ul.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show genesis state information
    GenesisInfo {
        /// Print the genesis report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the version string
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Uses LOG_FORMAT, LOG_FILE, LOG_ANSI and RUST_LOG
    let log_config = logging::LogConfig::from_env();
    if let Err(e) = logging::init_logging(&log_config) {
        // Fallback to basic logging if structured logging fails
        eprintln!("Warning: Failed to initialize structured logging: {}", e);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("o2ul=info".parse()?))
            .try_init();
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { output, force }) => return init_config(&output, force),
        Some(Commands::GenesisInfo { json }) => {
            let config = load_config(&cli)?;
            return show_genesis_info(&config, json);
        }
        Some(Commands::Version) => {
            println!("{}", version::current_version(Utc::now()));
            return Ok(());
        }
        None => {}
    }

    let config = load_config(&cli)?;
    start_node(config).await
}

/// Config file or defaults, then CLI overrides
fn load_config(cli: &Cli) -> Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_file(path)?,
        None if cli.devnet => NodeConfig::devnet(),
        None => NodeConfig::default(),
    };

    // Config file chain ID takes precedence
    if cli.config.is_none() {
        if let Some(chain_id) = cli.chain_id {
            config.chain.chain_id = chain_id;
        }
    }
    if let Some(interval) = cli.update_interval {
        config.ultrastable.update_interval_secs = interval;
    }
    if let Some(treasury) = &cli.treasury {
        config.ultrastable.treasury = Some(treasury.clone());
    }

    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

fn init_config(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
    }
    let config = NodeConfig::default();
    config.save(path)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn show_genesis_info(config: &NodeConfig, json: bool) -> Result<()> {
    let boot = genesis::bootstrap(config, Utc::now().timestamp().max(0) as u64)?;
    let report = &boot.report;

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{}",
        banner::chain_description(
            config.chain.chain_id,
            &version::current_version(Utc::now()),
            &ValueTokenConfig::default(),
            &StableTokenConfig::default(),
        )
    );
    println!();
    println!("{}Genesis Allocations{}", banner::BOLD, banner::RESET);
    println!(
        "  Founder:  {} ({}{}{})",
        report.founder,
        banner::GREEN,
        report.founder_balance,
        banner::RESET
    );
    println!(
        "  Reserve:  {} ({}{}{})",
        report.reserve,
        banner::GREEN,
        report.reserve_balance,
        banner::RESET
    );
    println!("  Treasury: {}", report.treasury);
    println!(
        "  Stable supply: {}{}{} (minimum {})",
        banner::YELLOW,
        report.stable_supply,
        banner::RESET,
        report.minimum_stable_supply
    );
    println!("  State root: {}", boot.state.calculate_state_root().to_hex());
    Ok(())
}

/// UltraStable manager over the bootstrapped state, driven by the peg band
/// source. Every scheduler tick refreshes the source before checking it.
fn build_manager(
    config: &NodeConfig,
    boot: &genesis::Bootstrap,
    stable: StableTokenConfig,
) -> Result<Arc<UltraStableManager>> {
    let source: Arc<dyn DecisionSource> =
        Arc::new(PegBandSource::new(config.ultrastable.peg_band(stable)));
    Ok(Arc::new(UltraStableManager::new(
        config.ultrastable.manager_config()?,
        Arc::new(boot.state.clone()),
        source,
    )))
}

async fn start_node(config: NodeConfig) -> Result<()> {
    let version = version::current_version(Utc::now());
    let stable = StableTokenConfig::default();

    banner::log_banner();
    banner::log_chain_description(
        config.chain.chain_id,
        &version,
        &ValueTokenConfig::default(),
        &stable,
    );

    let boot = genesis::bootstrap(&config, Utc::now().timestamp().max(0) as u64)?;
    let manager = build_manager(&config, &boot, stable)?;

    // Report every applied adjustment until the manager closes the feed
    let mut adjustments = manager.subscribe_adjustments();
    let reporter = tokio::spawn(async move {
        while let Some(applied) = adjustments.recv().await {
            info!(
                index = applied.record.index,
                kind = %applied.record.kind,
                new_supply = %applied.record.resulting_supply,
                treasury_balance = %applied.treasury_balance_after,
                "UltraStable supply adjusted"
            );
        }
    });

    manager.start().await?;
    info!(
        interval_secs = config.ultrastable.update_interval_secs,
        "Node running, press Ctrl-C to stop"
    );

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    manager.stop().await;
    if let Err(e) = reporter.await {
        error!("Adjustment reporter failed: {}", e);
    }

    Ok(())
}
