use clap::Subcommand;
use twinledger_contracts::{Devnet, Result};

use crate::commands::resolve_address;

#[derive(Subcommand)]
pub enum DeployCommands {
    /// Deploy the capped counter contract
    Counter {
        /// Initial counter value
        #[arg(long, default_value_t = 0)]
        initial: u64,
        /// Maximum counter value
        #[arg(long, default_value_t = 100)]
        max: u64,
    },
    /// Deploy the rock-paper-scissors contract
    Rps,
    /// Deploy the L1<>L2 NFT bridge pair
    Bridge {
        /// Collection name
        #[arg(long, default_value = "Bootcamp")]
        name: String,
        /// Collection symbol
        #[arg(long, default_value = "BOOT")]
        symbol: String,
        /// Account allowed to mint (name or hex address)
        #[arg(long)]
        minter: String,
    },
}

pub async fn handle_deploy_command(cmd: DeployCommands, devnet: &mut Devnet) -> Result<()> {
    match cmd {
        DeployCommands::Counter { initial, max } => {
            let address = devnet.deploy_counter(initial, max).await?;

            println!("Counter deployed!");
            println!("  Address: {}", address);
            println!("  Initial: {}", initial);
            println!("  Max: {}", max);
        }

        DeployCommands::Rps => {
            let address = devnet.deploy_rps().await?;

            println!("Rock-paper-scissors deployed!");
            println!("  Address: {}", address);
            println!("Play with the 'rps' binary.");
        }

        DeployCommands::Bridge {
            name,
            symbol,
            minter,
        } => {
            let minter = resolve_address(devnet, &minter).await?;
            let (l2_address, l1_address) = devnet.deploy_bridge(&name, &symbol, minter).await?;

            println!("NFT bridge deployed!");
            println!("  L2 contract: {}", l2_address);
            println!("  L1 contract: {}", l1_address);
            println!("  Minter: {}", minter.short());
        }
    }

    Ok(())
}
