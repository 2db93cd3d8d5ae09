//! Cross-layer message relay.
//!
//! Contracts emit queued messages rather than calling the other ledger
//! directly. `flush` drains the pending queues the way a devnet relayer
//! would: L1->L2 messages are handed to the harness for delivery, while
//! L2->L1 messages become consumable and must be claimed explicitly by the
//! receiving L1 contract.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::types::{Address, Word};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub from: Address,
    pub to: Address,
    pub payload: Vec<Word>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    ToL1,
    ToL2,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToL1 => "to_l1",
            Direction::ToL2 => "to_l2",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "to_l1" => Ok(Direction::ToL1),
            "to_l2" => Ok(Direction::ToL2),
            other => Err(LedgerError::internal(format!(
                "unknown message direction: {}",
                other
            ))),
        }
    }
}

/// Everything a single `flush` relayed, grouped by the sending layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlushReport {
    /// Messages sent by L1 contracts, delivered to L2 during the flush.
    pub from_l1: Vec<QueuedMessage>,
    /// Messages sent by L2 contracts, now consumable on L1.
    pub from_l2: Vec<QueuedMessage>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.from_l1.is_empty() && self.from_l2.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageQueue {
    pending_to_l1: Vec<QueuedMessage>,
    pending_to_l2: Vec<QueuedMessage>,
    consumable_on_l1: Vec<QueuedMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue from persisted rows.
    pub fn restore(
        pending_to_l1: Vec<QueuedMessage>,
        pending_to_l2: Vec<QueuedMessage>,
        consumable_on_l1: Vec<QueuedMessage>,
    ) -> Self {
        Self {
            pending_to_l1,
            pending_to_l2,
            consumable_on_l1,
        }
    }

    pub fn send_to_l1(&mut self, message: QueuedMessage) {
        tracing::debug!(
            "Queued L2->L1 message {} -> {}",
            message.from.short(),
            message.to.short()
        );
        self.pending_to_l1.push(message);
    }

    pub fn send_to_l2(&mut self, message: QueuedMessage) {
        tracing::debug!(
            "Queued L1->L2 message {} -> {}",
            message.from.short(),
            message.to.short()
        );
        self.pending_to_l2.push(message);
    }

    pub fn pending_to_l1(&self) -> &[QueuedMessage] {
        &self.pending_to_l1
    }

    pub fn pending_to_l2(&self) -> &[QueuedMessage] {
        &self.pending_to_l2
    }

    pub fn consumable_on_l1(&self) -> &[QueuedMessage] {
        &self.consumable_on_l1
    }

    /// Drain both pending queues. L2->L1 messages move to the consumable
    /// set; L1->L2 messages are returned for delivery by the harness.
    pub fn flush(&mut self) -> FlushReport {
        let from_l2 = std::mem::take(&mut self.pending_to_l1);
        let from_l1 = std::mem::take(&mut self.pending_to_l2);
        self.consumable_on_l1.extend(from_l2.iter().cloned());

        if !from_l1.is_empty() || !from_l2.is_empty() {
            tracing::info!(
                "Flushed {} L1->L2 and {} L2->L1 message(s)",
                from_l1.len(),
                from_l2.len()
            );
        }

        FlushReport { from_l1, from_l2 }
    }

    /// Claim exactly one flushed L2->L1 message matching (from, to, payload).
    /// This is how an L1 contract proves the message exists; claiming twice
    /// fails because the message is removed.
    pub fn consume_on_l1(
        &mut self,
        from: Address,
        to: Address,
        payload: &[Word],
    ) -> Result<QueuedMessage> {
        let position = self
            .consumable_on_l1
            .iter()
            .position(|m| m.from == from && m.to == to && m.payload == payload)
            .ok_or(LedgerError::MessageNotFound { from, to })?;

        Ok(self.consumable_on_l1.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(from: Address, to: Address, tag: u64) -> QueuedMessage {
        QueuedMessage {
            from,
            to,
            payload: vec![Word::from(tag)],
        }
    }

    #[test]
    fn flush_drains_both_queues() {
        let a = Address::random();
        let b = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(message(a, b, 1));
        queue.send_to_l2(message(b, a, 2));

        let report = queue.flush();
        assert_eq!(report.from_l2.len(), 1);
        assert_eq!(report.from_l1.len(), 1);
        assert!(queue.pending_to_l1().is_empty());
        assert!(queue.pending_to_l2().is_empty());

        // a second flush relays nothing
        assert!(queue.flush().is_empty());
    }

    #[test]
    fn consume_requires_flush_first() {
        let a = Address::random();
        let b = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(message(a, b, 7));

        // not consumable until flushed
        assert!(queue.consume_on_l1(a, b, &[Word::from(7u64)]).is_err());

        queue.flush();
        assert!(queue.consume_on_l1(a, b, &[Word::from(7u64)]).is_ok());

        // consumed at most once
        assert!(queue.consume_on_l1(a, b, &[Word::from(7u64)]).is_err());
    }

    #[test]
    fn consume_matches_payload_exactly() {
        let a = Address::random();
        let b = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(message(a, b, 7));
        queue.flush();

        assert!(queue.consume_on_l1(a, b, &[Word::from(8u64)]).is_err());
        assert!(queue.consume_on_l1(b, a, &[Word::from(7u64)]).is_err());
        assert_eq!(queue.consumable_on_l1().len(), 1);
    }
}
