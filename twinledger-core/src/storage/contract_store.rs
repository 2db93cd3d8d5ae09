use chrono::Utc;
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LedgerError, Result};
use crate::storage::Storage;
use crate::types::{Address, Network};

/// Persists deployed contract state as JSON, one row per contract name.
pub struct ContractStore<'a> {
    storage: &'a Storage,
}

impl<'a> ContractStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save<T: Serialize>(
        &self,
        network: &Network,
        name: &str,
        address: Address,
        kind: &str,
        state: &T,
    ) -> Result<()> {
        let state_json = serde_json::to_string(state)?;

        let conn = self.storage.get_connection().await;
        conn.execute(
            "INSERT OR REPLACE INTO contracts (network, name, address, kind, state, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                network.as_str(),
                name,
                address.to_hex(),
                kind,
                state_json,
                Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        network: &Network,
        name: &str,
    ) -> Result<Option<(Address, T)>> {
        let conn = self.storage.get_connection().await;

        let result = conn.query_row(
            "SELECT address, state FROM contracts WHERE network = ?1 AND name = ?2",
            params![network.as_str(), name],
            |row| {
                let address: String = row.get(0)?;
                let state: String = row.get(1)?;
                Ok((address, state))
            },
        );

        match result {
            Ok((address, state)) => {
                let address = Address::from_hex(&address)?;
                let state = serde_json::from_str(&state)?;
                Ok(Some((address, state)))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::Storage(e)),
        }
    }

    /// (name, address, kind) for every contract deployed on the network.
    pub async fn list(&self, network: &Network) -> Result<Vec<(String, Address, String)>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT name, address, kind FROM contracts WHERE network = ?1 ORDER BY name ASC",
        )?;

        let rows = stmt.query_map(params![network.as_str()], |row| {
            let name: String = row.get(0)?;
            let address: String = row.get(1)?;
            let kind: String = row.get(2)?;
            Ok((name, address, kind))
        })?;

        let mut contracts = Vec::new();
        for row in rows {
            let (name, address, kind) = row?;
            contracts.push((name, Address::from_hex(&address)?, kind));
        }

        Ok(contracts)
    }

    pub async fn clear(&self, network: &Network) -> Result<usize> {
        let conn = self.storage.get_connection().await;
        let removed = conn.execute(
            "DELETE FROM contracts WHERE network = ?1",
            params![network.as_str()],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct DummyState {
        value: u64,
    }

    #[tokio::test]
    async fn save_and_load_contract_state() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = ContractStore::new(&storage);
        let network = Network::Devnet;

        let address = Address::random();
        let state = DummyState { value: 7 };
        store
            .save(&network, "counter", address, "counter", &state)
            .await
            .unwrap();

        let (loaded_addr, loaded): (Address, DummyState) =
            store.load(&network, "counter").await.unwrap().unwrap();
        assert_eq!(loaded_addr, address);
        assert_eq!(loaded, state);

        // overwrite on re-save
        store
            .save(&network, "counter", address, "counter", &DummyState { value: 8 })
            .await
            .unwrap();
        let (_, reloaded): (Address, DummyState) =
            store.load(&network, "counter").await.unwrap().unwrap();
        assert_eq!(reloaded.value, 8);

        let missing: Option<(Address, DummyState)> =
            store.load(&network, "rps").await.unwrap();
        assert!(missing.is_none());
    }
}
