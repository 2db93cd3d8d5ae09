pub mod account_store;
pub mod contract_store;
pub mod message_store;
pub mod receipt_store;

pub use account_store::{AccountRecord, AccountStore};
pub use contract_store::ContractStore;
pub use message_store::MessageStore;
pub use receipt_store::ReceiptStore;

use crate::error::{LedgerError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// SQLite-backed devnet state. A single database file holds every network's
/// accounts, contract state, message queue, and receipts, so separate CLI
/// processes observe the same devnet.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LedgerError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        // Named accounts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                network TEXT NOT NULL,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (network, name)
            )",
            [],
        )?;

        // Contract state, serialized as JSON
        conn.execute(
            "CREATE TABLE IF NOT EXISTS contracts (
                network TEXT NOT NULL,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                kind TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (network, name)
            )",
            [],
        )?;

        // Cross-layer message queue plus consumed history
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                network TEXT NOT NULL,
                direction TEXT NOT NULL,
                status TEXT NOT NULL,
                from_addr TEXT NOT NULL,
                to_addr TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // Tx receipts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS receipts (
                network TEXT NOT NULL,
                hash TEXT NOT NULL,
                layer TEXT NOT NULL,
                status TEXT NOT NULL,
                block INTEGER,
                reason TEXT,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (network, hash)
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
