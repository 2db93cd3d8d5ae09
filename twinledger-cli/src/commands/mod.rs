pub mod account;
pub mod bridge;
pub mod counter;
pub mod deploy;
pub mod devnet;

pub use account::{handle_account_command, AccountCommands};
pub use bridge::{handle_bridge_command, BridgeCommands};
pub use counter::{handle_counter_command, CounterCommands};
pub use deploy::{handle_deploy_command, DeployCommands};
pub use devnet::{handle_devnet_command, DevnetCommands};

use twinledger_contracts::{Devnet, Result};
use twinledger_core::types::{Address, TxReceipt, TxStatus};
use twinledger_core::TxTracker;

/// Resolve an account argument: either a stored account name or a raw hex
/// address.
pub async fn resolve_address(devnet: &Devnet, account: &str) -> Result<Address> {
    if account.starts_with("0x") {
        return Ok(Address::from_hex(account)?);
    }
    Ok(devnet.account(account).await?)
}

/// Produce a block and poll the receipt to finality, the way a frontend
/// would before re-rendering.
pub async fn finalize(devnet: &mut Devnet, receipt: &TxReceipt) -> Result<TxReceipt> {
    devnet.produce_block().await?;

    tracing::debug!("Waiting for {} to finalize", receipt.hash.short());
    let tracker = TxTracker::new(devnet.storage(), devnet.network().clone());
    let finalized = tracker.wait_for_finality(&receipt.hash).await?;
    print_receipt(&finalized);
    Ok(finalized)
}

pub fn print_receipt(receipt: &TxReceipt) {
    println!();
    println!("Transaction: {}", receipt.hash);
    println!("  Layer: {}", receipt.layer);
    println!("  Status: {}", receipt.status);
    if let Some(block) = receipt.block {
        println!("  Block: {}", block);
    }
    if receipt.status == TxStatus::Rejected {
        if let Some(reason) = &receipt.reason {
            println!("  Reason: {}", reason);
        }
    }
}
