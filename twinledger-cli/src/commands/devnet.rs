use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use twinledger_contracts::{Devnet, Result};
use twinledger_core::types::TxStatus;
use twinledger_core::LedgerError;

#[derive(Subcommand)]
pub enum DevnetCommands {
    /// Show network status: block height and queued messages
    Status,
    /// Relay all queued cross-layer messages and produce a block
    Flush,
    /// List recent transaction receipts
    Receipts {
        /// How many receipts to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// List deployed contract addresses
    Addresses,
    /// Wipe all state for the current network
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_devnet_command(cmd: DevnetCommands, devnet: &mut Devnet) -> Result<()> {
    match cmd {
        DevnetCommands::Status => {
            let (to_l1, to_l2) = devnet.pending_messages();

            println!("Network: {}", devnet.network());
            println!("Block height: {}", devnet.block_height());
            println!();
            println!("Message queue:");
            println!("  Pending L2->L1: {}", to_l1);
            println!("  Pending L1->L2: {}", to_l2);
            println!("  Consumable on L1: {}", devnet.consumable_messages());
        }

        DevnetCommands::Flush => {
            let report = devnet.flush().await?;

            if report.is_empty() {
                println!("Nothing to flush.");
                return Ok(());
            }

            println!("Flushed {} L2->L1 message(s):", report.from_l2.len());
            for message in &report.from_l2 {
                println!("  {} -> {} (now consumable)", message.from.short(), message.to.short());
            }
            println!("Flushed {} L1->L2 message(s):", report.from_l1.len());
            for message in &report.from_l1 {
                println!("  {} -> {} (delivered)", message.from.short(), message.to.short());
            }
            println!();
            println!("Block height: {}", devnet.block_height());
        }

        DevnetCommands::Receipts { limit } => {
            let receipts = devnet.recent_receipts(limit).await?;

            if receipts.is_empty() {
                println!("No transactions on network '{}'.", devnet.network());
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Hash", "Layer", "Status", "Block", "Reason"]);

            for receipt in receipts {
                let block = receipt
                    .block
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let reason = match receipt.status {
                    TxStatus::Rejected => receipt.reason.unwrap_or_default(),
                    _ => String::new(),
                };
                table.add_row(vec![
                    receipt.hash.short(),
                    receipt.layer.to_string(),
                    receipt.status.to_string(),
                    block,
                    reason,
                ]);
            }

            println!("{}", table);
        }

        DevnetCommands::Addresses => {
            let contracts = devnet.contracts().await?;

            if contracts.is_empty() {
                println!("No contracts deployed on network '{}'.", devnet.network());
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Kind", "Address"]);

            for (name, address, kind) in contracts {
                table.add_row(vec![name, kind, address.to_hex()]);
            }

            println!("{}", table);
        }

        DevnetCommands::Reset { force } => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Wipe all state for network '{}'? This action cannot be undone.",
                        devnet.network()
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| LedgerError::config(e.to_string()))?;

                if !confirm {
                    println!("Reset cancelled.");
                    return Ok(());
                }
            }

            devnet.reset().await?;
            println!("Network '{}' reset.", devnet.network());
        }
    }

    Ok(())
}
