use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::storage::Storage;
use crate::types::{Address, Network};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

pub struct AccountStore<'a> {
    storage: &'a Storage,
}

impl<'a> AccountStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a named account with a fresh random address.
    pub async fn create(&self, network: &Network, name: &str) -> Result<AccountRecord> {
        if self.get(network, name).await?.is_some() {
            return Err(LedgerError::AccountExists {
                name: name.to_string(),
            });
        }

        let record = AccountRecord {
            name: name.to_string(),
            address: Address::random(),
            created_at: Utc::now(),
        };

        let conn = self.storage.get_connection().await;
        conn.execute(
            "INSERT INTO accounts (network, name, address, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                network.as_str(),
                record.name,
                record.address.to_hex(),
                record.created_at.timestamp(),
            ],
        )?;

        tracing::info!("Created account '{}' at {}", record.name, record.address);
        Ok(record)
    }

    pub async fn get(&self, network: &Network, name: &str) -> Result<Option<AccountRecord>> {
        let conn = self.storage.get_connection().await;

        let result = conn.query_row(
            "SELECT address, created_at FROM accounts WHERE network = ?1 AND name = ?2",
            params![network.as_str(), name],
            |row| {
                let address: String = row.get(0)?;
                let created_at: i64 = row.get(1)?;
                Ok((address, created_at))
            },
        );

        match result {
            Ok((address, created_at)) => Ok(Some(AccountRecord {
                name: name.to_string(),
                address: Address::from_hex(&address)?,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::Storage(e)),
        }
    }

    pub async fn list(&self, network: &Network) -> Result<Vec<AccountRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT name, address, created_at FROM accounts
             WHERE network = ?1 ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![network.as_str()], |row| {
            let name: String = row.get(0)?;
            let address: String = row.get(1)?;
            let created_at: i64 = row.get(2)?;
            Ok((name, address, created_at))
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            let (name, address, created_at) = row?;
            accounts.push(AccountRecord {
                name,
                address: Address::from_hex(&address)?,
                created_at: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
            });
        }

        Ok(accounts)
    }

    pub async fn clear(&self, network: &Network) -> Result<usize> {
        let conn = self.storage.get_connection().await;
        let removed = conn.execute(
            "DELETE FROM accounts WHERE network = ?1",
            params![network.as_str()],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_and_look_up_accounts() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = AccountStore::new(&storage);
        let network = Network::Devnet;

        let alice = store.create(&network, "alice").await.unwrap();
        assert!(!alice.address.is_zero());

        let loaded = store.get(&network, "alice").await.unwrap().unwrap();
        assert_eq!(loaded.address, alice.address);

        assert!(store.get(&network, "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = AccountStore::new(&storage);

        store.create(&Network::Devnet, "alice").await.unwrap();
        let err = store.create(&Network::Devnet, "alice").await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountExists { .. }));

        // the same name on another network is a different account
        store.create(&Network::Testnet, "alice").await.unwrap();
    }

    #[tokio::test]
    async fn list_is_scoped_by_network() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = AccountStore::new(&storage);

        store.create(&Network::Devnet, "alice").await.unwrap();
        store.create(&Network::Devnet, "bob").await.unwrap();
        store.create(&Network::Testnet, "carol").await.unwrap();

        let devnet = store.list(&Network::Devnet).await.unwrap();
        assert_eq!(devnet.len(), 2);

        store.clear(&Network::Devnet).await.unwrap();
        assert!(store.list(&Network::Devnet).await.unwrap().is_empty());
        assert_eq!(store.list(&Network::Testnet).await.unwrap().len(), 1);
    }
}
