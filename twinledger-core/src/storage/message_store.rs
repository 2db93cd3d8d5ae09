use chrono::Utc;
use rusqlite::params;

use crate::error::Result;
use crate::messaging::{Direction, MessageQueue, QueuedMessage};
use crate::storage::Storage;
use crate::types::{Address, Network};

const STATUS_PENDING: &str = "pending";
const STATUS_CONSUMABLE: &str = "consumable";
const STATUS_CONSUMED: &str = "consumed";

/// Persists the live message queue plus a history of consumed messages.
/// The queue rows are replaced wholesale on every save; consumed rows are
/// append-only.
pub struct MessageStore<'a> {
    storage: &'a Storage,
}

impl<'a> MessageStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_queue(&self, network: &Network, queue: &MessageQueue) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "DELETE FROM messages WHERE network = ?1 AND status != ?2",
            params![network.as_str(), STATUS_CONSUMED],
        )?;

        for message in queue.pending_to_l1() {
            Self::insert(&conn, network, Direction::ToL1, STATUS_PENDING, message)?;
        }
        for message in queue.pending_to_l2() {
            Self::insert(&conn, network, Direction::ToL2, STATUS_PENDING, message)?;
        }
        for message in queue.consumable_on_l1() {
            Self::insert(&conn, network, Direction::ToL1, STATUS_CONSUMABLE, message)?;
        }

        Ok(())
    }

    pub async fn load_queue(&self, network: &Network) -> Result<MessageQueue> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT direction, status, from_addr, to_addr, payload FROM messages
             WHERE network = ?1 AND status != ?2 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![network.as_str(), STATUS_CONSUMED], |row| {
            let direction: String = row.get(0)?;
            let status: String = row.get(1)?;
            let from: String = row.get(2)?;
            let to: String = row.get(3)?;
            let payload: String = row.get(4)?;
            Ok((direction, status, from, to, payload))
        })?;

        let mut pending_to_l1 = Vec::new();
        let mut pending_to_l2 = Vec::new();
        let mut consumable_on_l1 = Vec::new();
        for row in rows {
            let (direction, status, from, to, payload) = row?;
            let message = QueuedMessage {
                from: Address::from_hex(&from)?,
                to: Address::from_hex(&to)?,
                payload: serde_json::from_str(&payload)?,
            };

            match (Direction::parse(&direction)?, status.as_str()) {
                (Direction::ToL1, STATUS_CONSUMABLE) => consumable_on_l1.push(message),
                (Direction::ToL1, _) => pending_to_l1.push(message),
                (Direction::ToL2, _) => pending_to_l2.push(message),
            }
        }

        Ok(MessageQueue::restore(
            pending_to_l1,
            pending_to_l2,
            consumable_on_l1,
        ))
    }

    pub async fn record_consumed(
        &self,
        network: &Network,
        direction: Direction,
        message: &QueuedMessage,
    ) -> Result<()> {
        let conn = self.storage.get_connection().await;
        Self::insert(&conn, network, direction, STATUS_CONSUMED, message)?;
        Ok(())
    }

    pub async fn consumed_count(&self, network: &Network) -> Result<u64> {
        let conn = self.storage.get_connection().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE network = ?1 AND status = ?2",
            params![network.as_str(), STATUS_CONSUMED],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub async fn clear(&self, network: &Network) -> Result<usize> {
        let conn = self.storage.get_connection().await;
        let removed = conn.execute(
            "DELETE FROM messages WHERE network = ?1",
            params![network.as_str()],
        )?;
        Ok(removed)
    }

    fn insert(
        conn: &rusqlite::Connection,
        network: &Network,
        direction: Direction,
        status: &str,
        message: &QueuedMessage,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO messages (network, direction, status, from_addr, to_addr, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                network.as_str(),
                direction.as_str(),
                status,
                message.from.to_hex(),
                message.to.to_hex(),
                serde_json::to_string(&message.payload)?,
                Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Word;
    use tempfile::tempdir;

    #[tokio::test]
    async fn queue_survives_a_save_load_cycle() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = MessageStore::new(&storage);
        let network = Network::Devnet;

        let a = Address::random();
        let b = Address::random();

        let mut queue = MessageQueue::new();
        queue.send_to_l1(QueuedMessage {
            from: a,
            to: b,
            payload: vec![Word::from(a), Word::from(0u64)],
        });
        queue.flush();
        queue.send_to_l2(QueuedMessage {
            from: b,
            to: a,
            payload: vec![Word::from(1u64)],
        });

        store.save_queue(&network, &queue).await.unwrap();
        let mut loaded = store.load_queue(&network).await.unwrap();

        assert_eq!(loaded.pending_to_l2().len(), 1);
        assert_eq!(loaded.consumable_on_l1().len(), 1);
        assert!(loaded.pending_to_l1().is_empty());

        // the restored consumable message is still claimable
        loaded
            .consume_on_l1(a, b, &[Word::from(a), Word::from(0u64)])
            .unwrap();
    }

    #[tokio::test]
    async fn consumed_history_is_append_only() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(&dir.path().join("test.db")).await.unwrap();
        let store = MessageStore::new(&storage);
        let network = Network::Devnet;

        let message = QueuedMessage {
            from: Address::random(),
            to: Address::random(),
            payload: vec![],
        };
        store
            .record_consumed(&network, Direction::ToL1, &message)
            .await
            .unwrap();

        // saving an empty queue must not erase history
        store
            .save_queue(&network, &MessageQueue::new())
            .await
            .unwrap();
        assert_eq!(store.consumed_count(&network).await.unwrap(), 1);
    }
}
