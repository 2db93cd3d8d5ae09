use clap::Subcommand;
use twinledger_contracts::{Devnet, Result};

use crate::commands::finalize;

#[derive(Subcommand)]
pub enum CounterCommands {
    /// Read the current counter value
    Read,
    /// Increment the counter
    Increment {
        /// Amount to add
        #[arg(default_value_t = 1)]
        amount: u64,
    },
}

pub async fn handle_counter_command(cmd: CounterCommands, devnet: &mut Devnet) -> Result<()> {
    match cmd {
        CounterCommands::Read => {
            println!("{}", devnet.counter_read()?);
        }

        CounterCommands::Increment { amount } => {
            let receipt = devnet.counter_increment(amount).await?;
            finalize(devnet, &receipt).await?;

            println!();
            println!("Counter is now {}", devnet.counter_read()?);
        }
    }

    Ok(())
}
