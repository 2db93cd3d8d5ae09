use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use twinledger_core::messaging::{MessageQueue, QueuedMessage};
use twinledger_core::types::{Address, TokenId, Word};

use crate::error::{ContractError, Result};

/// L1 side of the bridged NFT. Tokens only exist here while bridged out of
/// L2: claiming a flushed message mints, bridging back burns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgedNft {
    name: String,
    symbol: String,
    address: Address,
    l2_contract: Address,
    owners: BTreeMap<TokenId, Address>,
}

impl BridgedNft {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            address,
            l2_contract: Address::ZERO,
            owners: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn l2_contract(&self) -> Address {
        self.l2_contract
    }

    /// One-shot wiring to the L2 counterpart, done after both sides exist.
    pub fn initialize(&mut self, l2_contract: Address) -> Result<()> {
        if !self.l2_contract.is_zero() {
            return Err(ContractError::AlreadyInitialized);
        }
        self.l2_contract = l2_contract;
        Ok(())
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(ContractError::TokenNotFound(token_id))
    }

    /// Claim a flushed L2->L1 message and mint the token to `to`. The
    /// message must match (l2_contract, this contract, [to, token_id])
    /// exactly; a claimed message cannot be claimed again. Returns the
    /// claimed message.
    pub fn bridge_from_l2(
        &mut self,
        queue: &mut MessageQueue,
        to: Address,
        token_id: TokenId,
    ) -> Result<QueuedMessage> {
        if self.l2_contract.is_zero() {
            return Err(ContractError::NotInitialized);
        }

        let payload = [Word::from(to), Word::from(token_id)];
        let message = queue
            .consume_on_l1(self.l2_contract, self.address, &payload)
            .map_err(|_| ContractError::NoMatchingMessage(token_id))?;

        self.owners.insert(token_id, to);
        tracing::info!("Token {} minted on L1 to {}", token_id, to.short());
        Ok(message)
    }

    /// Burn the caller's token and emit the L1->L2 message carrying
    /// `[l2_user, token_id]`.
    pub fn bridge_to_l2(
        &mut self,
        caller: Address,
        l2_user: Address,
        token_id: TokenId,
    ) -> Result<QueuedMessage> {
        if self.l2_contract.is_zero() {
            return Err(ContractError::NotInitialized);
        }

        let owner = self.owner_of(token_id)?;
        if owner != caller {
            return Err(ContractError::NotOwner { caller, token_id });
        }

        self.owners.remove(&token_id);

        tracing::info!(
            "Token {} burned on L1, returning to {} on L2",
            token_id,
            l2_user.short()
        );
        Ok(QueuedMessage {
            from: self.address,
            to: self.l2_contract,
            payload: vec![Word::from(l2_user), Word::from(token_id)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired() -> (BridgedNft, Address) {
        let l2_contract = Address::random();
        let mut l1 = BridgedNft::new("NFT-L1", "NFT-L1", Address::random());
        l1.initialize(l2_contract).unwrap();
        (l1, l2_contract)
    }

    fn l2_exit(l2_contract: Address, l1: &BridgedNft, to: Address, token_id: TokenId) -> QueuedMessage {
        QueuedMessage {
            from: l2_contract,
            to: l1.address(),
            payload: vec![Word::from(to), Word::from(token_id)],
        }
    }

    #[test]
    fn initialize_is_one_shot() {
        let (mut l1, _) = wired();
        assert!(matches!(
            l1.initialize(Address::random()),
            Err(ContractError::AlreadyInitialized)
        ));
    }

    #[test]
    fn claiming_a_flushed_message_mints() {
        let (mut l1, l2_contract) = wired();
        let to = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(l2_exit(l2_contract, &l1, to, 0));
        queue.flush();

        l1.bridge_from_l2(&mut queue, to, 0).unwrap();
        assert_eq!(l1.owner_of(0).unwrap(), to);

        // the message is spent
        assert!(matches!(
            l1.bridge_from_l2(&mut queue, to, 0),
            Err(ContractError::NoMatchingMessage(0))
        ));
    }

    #[test]
    fn claims_fail_without_a_matching_message() {
        let (mut l1, l2_contract) = wired();
        let to = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(l2_exit(l2_contract, &l1, to, 0));
        queue.flush();

        // wrong recipient and wrong token never mint
        assert!(l1.bridge_from_l2(&mut queue, Address::random(), 0).is_err());
        assert!(l1.bridge_from_l2(&mut queue, to, 1).is_err());
        assert!(l1.owner_of(0).is_err());
    }

    #[test]
    fn bridging_back_burns_and_addresses_the_l2_contract() {
        let (mut l1, l2_contract) = wired();
        let holder = Address::random();
        let l2_user = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(l2_exit(l2_contract, &l1, holder, 3));
        queue.flush();
        l1.bridge_from_l2(&mut queue, holder, 3).unwrap();

        let message = l1.bridge_to_l2(holder, l2_user, 3).unwrap();

        assert!(matches!(
            l1.owner_of(3),
            Err(ContractError::TokenNotFound(3))
        ));
        assert_eq!(message.from, l1.address());
        assert_eq!(message.to, l2_contract);
        assert_eq!(message.payload, vec![Word::from(l2_user), Word::from(3u64)]);
    }

    #[test]
    fn only_the_l1_owner_can_bridge_back() {
        let (mut l1, l2_contract) = wired();
        let holder = Address::random();
        let mut queue = MessageQueue::new();
        queue.send_to_l1(l2_exit(l2_contract, &l1, holder, 0));
        queue.flush();
        l1.bridge_from_l2(&mut queue, holder, 0).unwrap();

        assert!(matches!(
            l1.bridge_to_l2(Address::random(), holder, 0),
            Err(ContractError::NotOwner { .. })
        ));
        assert_eq!(l1.owner_of(0).unwrap(), holder);
    }

    #[test]
    fn uninitialized_bridges_reject_everything() {
        let mut l1 = BridgedNft::new("NFT-L1", "NFT-L1", Address::random());
        let mut queue = MessageQueue::new();
        assert!(matches!(
            l1.bridge_from_l2(&mut queue, Address::random(), 0),
            Err(ContractError::NotInitialized)
        ));
        assert!(matches!(
            l1.bridge_to_l2(Address::random(), Address::random(), 0),
            Err(ContractError::NotInitialized)
        ));
    }
}
