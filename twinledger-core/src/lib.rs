//! twinledger core - primitives for a local two-ledger devnet
//!
//! This crate provides the pieces the devnet harness is built from:
//! addresses and payload words, the cross-layer message queue with flush
//! semantics, transaction receipts with a polling finality tracker, and
//! SQLite persistence so separate processes share one devnet.

pub mod deployments;
pub mod error;
pub mod messaging;
pub mod storage;
pub mod tracker;
pub mod types;

pub use deployments::Deployments;
pub use error::{LedgerError, Result};
pub use messaging::{Direction, FlushReport, MessageQueue, QueuedMessage};
pub use storage::{AccountRecord, AccountStore, ContractStore, MessageStore, ReceiptStore, Storage};
pub use tracker::{poll_until, TxTracker};
pub use types::{
    Address, GameId, Layer, Network, TokenId, TxHash, TxReceipt, TxStatus, Word,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn storage_opens_and_accounts_persist() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("twinledger.db");

        let address = {
            let storage = Storage::new(&db_path).await.unwrap();
            let store = AccountStore::new(&storage);
            store.create(&Network::Devnet, "alice").await.unwrap().address
        };

        // a second open sees the same account
        let storage = Storage::new(&db_path).await.unwrap();
        let store = AccountStore::new(&storage);
        let loaded = store.get(&Network::Devnet, "alice").await.unwrap().unwrap();
        assert_eq!(loaded.address, address);
    }
}
