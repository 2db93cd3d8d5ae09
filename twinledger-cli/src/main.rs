mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twinledger_contracts::{ContractError, Devnet};
use twinledger_core::types::Network;
use twinledger_core::LedgerError;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "twinledger")]
#[command(about = "Two-ledger devnet sandbox - contracts, bridging, receipts")]
#[command(version)]
struct Cli {
    /// Data directory for devnet storage
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Network name (devnet, testnet, or a custom name)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(commands::AccountCommands),

    /// Contract deployment commands
    #[command(subcommand)]
    Deploy(commands::DeployCommands),

    /// Counter contract commands
    #[command(subcommand)]
    Counter(commands::CounterCommands),

    /// NFT bridge commands
    #[command(subcommand)]
    Bridge(commands::BridgeCommands),

    /// Devnet inspection and maintenance commands
    #[command(subcommand)]
    Devnet(commands::DevnetCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = CliConfig::resolve(cli.data_dir, cli.network, cli.verbose);

    // Initialize logging
    let log_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "twinledger_cli={},twinledger_core={},twinledger_contracts={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Ensure data directory exists
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let network = Network::from_str(&config.default_network)?;
    let mut devnet = Devnet::open(&config.data_dir, network).await?;

    // Execute command
    let result = match cli.command {
        Commands::Account(cmd) => commands::handle_account_command(cmd, &devnet).await,
        Commands::Deploy(cmd) => commands::handle_deploy_command(cmd, &mut devnet).await,
        Commands::Counter(cmd) => commands::handle_counter_command(cmd, &mut devnet).await,
        Commands::Bridge(cmd) => commands::handle_bridge_command(cmd, &mut devnet).await,
        Commands::Devnet(cmd) => commands::handle_devnet_command(cmd, &mut devnet).await,
    };

    if let Err(e) = result {
        match e {
            ContractError::Ledger(LedgerError::AccountNotFound { name }) => {
                eprintln!("Error: Account '{}' not found", name);
                eprintln!("Use 'twinledger account list' to see available accounts");
            }
            ContractError::NotDeployed(name) => {
                eprintln!("Error: Contract '{}' is not deployed", name);
                eprintln!("Use 'twinledger deploy' to deploy it first");
            }
            ContractError::Ledger(LedgerError::InvalidAddress(addr)) => {
                eprintln!("Error: Invalid address: {}", addr);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
