mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twinledger_contracts::Devnet;
use twinledger_core::types::{GameId, Network};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Commit-reveal rock-paper-scissors on the twinledger devnet")]
#[command(version)]
struct Cli {
    /// Data directory for devnet storage
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Network name
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
    /// Commit a hashed move to a game
    Play {
        /// Account name to play as
        account: String,
        /// Game ID (any number; first committer becomes player1)
        game_id: GameId,
        /// Move: rock, paper, or scissors
        r#move: String,
    },
    /// Reveal a previously committed move
    Reveal {
        /// Account name
        account: String,
        /// Game ID
        game_id: GameId,
        /// Move: rock, paper, or scissors
        r#move: String,
        /// Salt (hex); defaults to the one saved at commit time
        #[arg(short, long)]
        salt: Option<String>,
    },
    /// Settle a game once both moves are revealed
    Finish {
        /// Game ID
        game_id: GameId,
    },
    /// Show one game's state
    Status {
        /// Game ID
        game_id: GameId,
    },
    /// List all games on the network
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "twinledger_core={},twinledger_contracts={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("twinledger")
    });

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    let network = Network::from_str(cli.network.as_deref().unwrap_or("devnet"))?;
    let mut devnet = Devnet::open(&data_dir, network).await?;

    // Execute command
    let result = match cli.command {
        Commands::Play {
            account,
            game_id,
            r#move,
        } => commands::play(&mut devnet, &data_dir, &account, game_id, &r#move).await,
        Commands::Reveal {
            account,
            game_id,
            r#move,
            salt,
        } => commands::reveal(&mut devnet, &data_dir, &account, game_id, &r#move, salt).await,
        Commands::Finish { game_id } => commands::finish(&mut devnet, game_id).await,
        Commands::Status { game_id } => commands::status(&devnet, game_id).await,
        Commands::List => commands::list(&devnet).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
