use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use twinledger_contracts::{Devnet, Result};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new named account
    New {
        /// Account name
        name: String,
    },
    /// List all accounts on the current network
    List,
    /// Show an account's address
    Show {
        /// Account name
        name: String,
    },
}

pub async fn handle_account_command(cmd: AccountCommands, devnet: &Devnet) -> Result<()> {
    match cmd {
        AccountCommands::New { name } => {
            let address = devnet.create_account(&name).await?;

            println!("Account created!");
            println!("  Name: {}", name);
            println!("  Address: {}", address);
            println!("  Network: {}", devnet.network());
        }

        AccountCommands::List => {
            let accounts = devnet.list_accounts().await?;

            if accounts.is_empty() {
                println!("No accounts on network '{}'.", devnet.network());
                println!("Create one with: twinledger account new <name>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Name", "Address", "Created"]);

            for account in accounts {
                table.add_row(vec![
                    account.name.clone(),
                    account.address.short(),
                    account.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                ]);
            }

            println!("{}", table);
        }

        AccountCommands::Show { name } => {
            let address = devnet.account(&name).await?;
            println!("{}", address);
        }
    }

    Ok(())
}
