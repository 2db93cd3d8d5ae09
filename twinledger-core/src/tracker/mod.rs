//! Polling helpers for gating on chain state.
//!
//! The devnet has no push notifications; anything waiting on a transaction
//! or a contract read polls persisted state on an interval, the same way
//! the original frontend gated rendering on transaction finality.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LedgerError, Result};
use crate::storage::{ReceiptStore, Storage};
use crate::types::{Network, TxHash, TxReceipt, TxStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll a fallible read until it yields a value or the timeout passes.
pub async fn poll_until<T, F, Fut>(interval: Duration, timeout: Duration, mut read: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        if let Some(value) = read().await? {
            return Ok(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(LedgerError::timeout(format!(
                "condition not met within {:?}",
                timeout
            )));
        }
    }
}

/// Watches receipts until they reach a terminal status.
pub struct TxTracker {
    storage: Arc<Storage>,
    network: Network,
    interval: Duration,
    timeout: Duration,
}

impl TxTracker {
    pub fn new(storage: Arc<Storage>, network: Network) -> Self {
        Self {
            storage,
            network,
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.interval = interval;
        self.timeout = timeout;
        self
    }

    pub async fn status(&self, hash: &TxHash) -> Result<Option<TxStatus>> {
        let store = ReceiptStore::new(&self.storage);
        Ok(store.get(&self.network, hash).await?.map(|r| r.status))
    }

    /// Block until the receipt is accepted or rejected. A rejected receipt
    /// is returned, not an error; the revert reason rides along in it.
    pub async fn wait_for_finality(&self, hash: &TxHash) -> Result<TxReceipt> {
        let hash = *hash;
        poll_until(self.interval, self.timeout, || {
            let storage = self.storage.clone();
            let network = self.network.clone();
            async move {
                let store = ReceiptStore::new(&storage);
                match store.get(&network, &hash).await? {
                    Some(receipt) if receipt.status.is_final() => Ok(Some(receipt)),
                    _ => Ok(None),
                }
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layer;
    use tempfile::tempdir;

    #[tokio::test]
    async fn waits_for_a_receipt_to_finalize() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&dir.path().join("test.db")).await.unwrap());
        let network = Network::Devnet;

        let hash = TxHash::digest(&[b"tracked tx"]);
        {
            let store = ReceiptStore::new(&storage);
            store
                .save(&network, &crate::types::TxReceipt::pending(hash, Layer::L2))
                .await
                .unwrap();
        }

        let finalizer = {
            let storage = storage.clone();
            let network = network.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let store = ReceiptStore::new(&storage);
                store.finalize_pending(&network, 1).await.unwrap();
            })
        };

        let tracker = TxTracker::new(storage, network)
            .with_timing(Duration::from_millis(10), Duration::from_secs(5));
        let receipt = tracker.wait_for_finality(&hash).await.unwrap();
        assert_eq!(receipt.status, TxStatus::AcceptedOnL2);
        assert_eq!(receipt.block, Some(1));

        finalizer.await.unwrap();
    }

    #[tokio::test]
    async fn times_out_when_nothing_finalizes() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&dir.path().join("test.db")).await.unwrap());

        let tracker = TxTracker::new(storage, Network::Devnet)
            .with_timing(Duration::from_millis(10), Duration::from_millis(50));
        let err = tracker
            .wait_for_finality(&TxHash::digest(&[b"missing tx"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Timeout(_)));
    }
}
