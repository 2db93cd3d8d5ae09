use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::error::{LedgerError, Result};
use crate::storage::Storage;
use crate::types::{Layer, Network, TxHash, TxReceipt, TxStatus};

// (layer, status, block, reason, created_at) straight off a row
type ReceiptParts = (String, String, Option<i64>, Option<String>, i64);

pub struct ReceiptStore<'a> {
    storage: &'a Storage,
}

impl<'a> ReceiptStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save(&self, network: &Network, receipt: &TxReceipt) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO receipts (network, hash, layer, status, block, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                network.as_str(),
                receipt.hash.to_hex(),
                receipt.layer.as_str(),
                receipt.status.as_str(),
                receipt.block.map(|b| b as i64),
                receipt.reason,
                receipt.timestamp.timestamp(),
            ],
        )?;

        Ok(())
    }

    pub async fn get(&self, network: &Network, hash: &TxHash) -> Result<Option<TxReceipt>> {
        let conn = self.storage.get_connection().await;

        let result = conn.query_row(
            "SELECT layer, status, block, reason, created_at FROM receipts
             WHERE network = ?1 AND hash = ?2",
            params![network.as_str(), hash.to_hex()],
            Self::row_to_parts,
        );

        match result {
            Ok(parts) => Ok(Some(Self::parts_to_receipt(*hash, parts)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LedgerError::Storage(e)),
        }
    }

    pub async fn list_recent(&self, network: &Network, limit: usize) -> Result<Vec<TxReceipt>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT hash, layer, status, block, reason, created_at FROM receipts
             WHERE network = ?1 ORDER BY created_at DESC, hash DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![network.as_str(), limit as i64], |row| {
            let hash: String = row.get(0)?;
            let layer: String = row.get(1)?;
            let status: String = row.get(2)?;
            let block: Option<i64> = row.get(3)?;
            let reason: Option<String> = row.get(4)?;
            let created_at: i64 = row.get(5)?;
            Ok((hash, (layer, status, block, reason, created_at)))
        })?;

        let mut receipts = Vec::new();
        for row in rows {
            let (hash, parts) = row?;
            receipts.push(Self::parts_to_receipt(TxHash::from_hex(&hash)?, parts)?);
        }

        Ok(receipts)
    }

    /// Mark every pending receipt accepted at the given block, on the layer
    /// it executed on. Returns how many receipts were finalized.
    pub async fn finalize_pending(&self, network: &Network, block: u64) -> Result<usize> {
        let conn = self.storage.get_connection().await;

        let mut finalized = 0;
        for (layer, accepted) in [
            (Layer::L1, TxStatus::AcceptedOnL1),
            (Layer::L2, TxStatus::AcceptedOnL2),
        ] {
            finalized += conn.execute(
                "UPDATE receipts SET status = ?1, block = ?2
                 WHERE network = ?3 AND layer = ?4 AND status = ?5",
                params![
                    accepted.as_str(),
                    block as i64,
                    network.as_str(),
                    layer.as_str(),
                    TxStatus::Pending.as_str(),
                ],
            )?;
        }

        Ok(finalized)
    }

    pub async fn clear(&self, network: &Network) -> Result<usize> {
        let conn = self.storage.get_connection().await;
        let removed = conn.execute(
            "DELETE FROM receipts WHERE network = ?1",
            params![network.as_str()],
        )?;
        Ok(removed)
    }

    fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReceiptParts> {
        let layer: String = row.get(0)?;
        let status: String = row.get(1)?;
        let block: Option<i64> = row.get(2)?;
        let reason: Option<String> = row.get(3)?;
        let created_at: i64 = row.get(4)?;
        Ok((layer, status, block, reason, created_at))
    }

    fn parts_to_receipt(hash: TxHash, parts: ReceiptParts) -> Result<TxReceipt> {
        let (layer, status, block, reason, created_at) = parts;
        Ok(TxReceipt {
            hash,
            layer: Layer::parse(&layer)?,
            status: TxStatus::parse(&status)?,
            block: block.map(|b| b as u64),
            reason,
            timestamp: DateTime::from_timestamp(created_at, 0).unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn pending_receipts_finalize_by_layer() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = ReceiptStore::new(&storage);
        let network = Network::Devnet;

        let l2_tx = TxHash::digest(&[b"l2 tx"]);
        let l1_tx = TxHash::digest(&[b"l1 tx"]);
        store
            .save(&network, &TxReceipt::pending(l2_tx, Layer::L2))
            .await
            .unwrap();
        store
            .save(&network, &TxReceipt::pending(l1_tx, Layer::L1))
            .await
            .unwrap();

        let finalized = store.finalize_pending(&network, 5).await.unwrap();
        assert_eq!(finalized, 2);

        let l2 = store.get(&network, &l2_tx).await.unwrap().unwrap();
        assert_eq!(l2.status, TxStatus::AcceptedOnL2);
        assert_eq!(l2.block, Some(5));

        let l1 = store.get(&network, &l1_tx).await.unwrap().unwrap();
        assert_eq!(l1.status, TxStatus::AcceptedOnL1);
    }

    #[tokio::test]
    async fn rejected_receipts_keep_their_reason() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = ReceiptStore::new(&storage);
        let network = Network::Devnet;

        let hash = TxHash::digest(&[b"rejected tx"]);
        store
            .save(
                &network,
                &TxReceipt::rejected(hash, Layer::L2, "cap exceeded"),
            )
            .await
            .unwrap();

        // finalize must not touch rejected receipts
        store.finalize_pending(&network, 1).await.unwrap();

        let receipt = store.get(&network, &hash).await.unwrap().unwrap();
        assert_eq!(receipt.status, TxStatus::Rejected);
        assert_eq!(receipt.reason.as_deref(), Some("cap exceeded"));
        assert_eq!(receipt.block, None);
    }
}
