use clap::Subcommand;
use twinledger_contracts::{ContractError, Devnet, Result};
use twinledger_core::types::TokenId;

use crate::commands::{finalize, resolve_address};

#[derive(Subcommand)]
pub enum BridgeCommands {
    /// Mint a token on L2
    Mint {
        /// Minter account (name or hex address)
        #[arg(long)]
        minter: String,
        /// Recipient account (name or hex address)
        #[arg(long)]
        to: String,
    },
    /// Show a token's owner on both ledgers
    Owner {
        /// Token id
        token_id: TokenId,
    },
    /// Escrow an L2 token and message L1
    ToL1 {
        /// Current owner (name or hex address)
        #[arg(long)]
        from: String,
        /// L1 recipient (name or hex address)
        #[arg(long)]
        to: String,
        /// Token id
        token_id: TokenId,
    },
    /// Claim a flushed message on L1 and mint the token there
    FromL2 {
        /// L1 recipient (name or hex address)
        #[arg(long)]
        to: String,
        /// Token id
        token_id: TokenId,
    },
    /// Burn an L1 token and message it back to L2
    ToL2 {
        /// Current L1 owner (name or hex address)
        #[arg(long)]
        from: String,
        /// L2 recipient (name or hex address)
        #[arg(long)]
        to: String,
        /// Token id
        token_id: TokenId,
    },
}

pub async fn handle_bridge_command(cmd: BridgeCommands, devnet: &mut Devnet) -> Result<()> {
    match cmd {
        BridgeCommands::Mint { minter, to } => {
            let minter = resolve_address(devnet, &minter).await?;
            let to = resolve_address(devnet, &to).await?;

            let (receipt, token_id) = devnet.nft_mint(minter, to).await?;
            finalize(devnet, &receipt).await?;

            println!();
            println!("Minted token {} to {}", token_id, to.short());
        }

        BridgeCommands::Owner { token_id } => {
            match devnet.nft_owner_of(token_id) {
                Ok(owner) => println!("L2: {}", owner),
                Err(ContractError::TokenNotFound(_)) => println!("L2: -"),
                Err(e) => return Err(e),
            }
            match devnet.l1_owner_of(token_id) {
                Ok(owner) => println!("L1: {}", owner),
                Err(ContractError::TokenNotFound(_)) => println!("L1: -"),
                Err(e) => return Err(e),
            }
        }

        BridgeCommands::ToL1 { from, to, token_id } => {
            let from = resolve_address(devnet, &from).await?;
            let to = resolve_address(devnet, &to).await?;

            let receipt = devnet.bridge_to_l1(from, to, token_id).await?;
            finalize(devnet, &receipt).await?;

            println!();
            println!("Token {} escrowed for bridging.", token_id);
            println!("Run 'twinledger devnet flush' to relay the message.");
        }

        BridgeCommands::FromL2 { to, token_id } => {
            let to = resolve_address(devnet, &to).await?;

            let receipt = devnet.bridge_from_l2(to, token_id).await?;
            finalize(devnet, &receipt).await?;

            println!();
            println!("Token {} minted on L1 to {}", token_id, to.short());
        }

        BridgeCommands::ToL2 { from, to, token_id } => {
            let from = resolve_address(devnet, &from).await?;
            let to = resolve_address(devnet, &to).await?;

            let receipt = devnet.bridge_to_l2(from, to, token_id).await?;
            finalize(devnet, &receipt).await?;

            println!();
            println!("Token {} burned on L1.", token_id);
            println!("Run 'twinledger devnet flush' to deliver it back to L2.");
        }
    }

    Ok(())
}
