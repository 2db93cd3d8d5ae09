use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use twinledger_core::messaging::QueuedMessage;
use twinledger_core::types::{Address, TokenId, Word};

use crate::error::{ContractError, Result};

/// L2 side of the bridged NFT. Minting happens here; bridging a token out
/// escrows it under the contract's own address and emits an L2->L1 message
/// for the counterpart contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftContract {
    name: String,
    symbol: String,
    address: Address,
    minter: Address,
    l1_contract: Address,
    owners: BTreeMap<TokenId, Address>,
    next_token_id: TokenId,
}

impl NftContract {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        address: Address,
        minter: Address,
        l1_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            address,
            minter,
            l1_contract,
            owners: BTreeMap::new(),
            next_token_id: 0,
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

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn l1_contract(&self) -> Address {
        self.l1_contract
    }

    pub fn mint(&mut self, caller: Address, user: Address) -> Result<TokenId> {
        if caller != self.minter {
            return Err(ContractError::NotMinter(caller));
        }

        let token_id = self.next_token_id;
        self.next_token_id += 1;
        self.owners.insert(token_id, user);

        tracing::info!("Minted token {} to {}", token_id, user.short());
        Ok(token_id)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(ContractError::TokenNotFound(token_id))
    }

    /// Escrow the caller's token under the contract address and emit the
    /// L2->L1 message carrying `[l1_user, token_id]`.
    pub fn bridge_to_l1(
        &mut self,
        caller: Address,
        l1_user: Address,
        token_id: TokenId,
    ) -> Result<QueuedMessage> {
        let owner = self.owner_of(token_id)?;
        if owner != caller {
            return Err(ContractError::NotOwner { caller, token_id });
        }

        self.owners.insert(token_id, self.address);

        tracing::info!(
            "Token {} escrowed for bridging, recipient {} on L1",
            token_id,
            l1_user.short()
        );
        Ok(QueuedMessage {
            from: self.address,
            to: self.l1_contract,
            payload: vec![Word::from(l1_user), Word::from(token_id)],
        })
    }

    /// Handle a bridged-back deposit: `[user, token_id]` from the L1
    /// contract releases the escrowed token to `user`.
    pub fn on_l1_message(&mut self, message: &QueuedMessage) -> Result<()> {
        if message.from != self.l1_contract {
            return Err(ContractError::UnknownSender(message.from));
        }

        let (user, token_id) = match message.payload.as_slice() {
            [user, token] => {
                let token_id = token.as_u64().ok_or(ContractError::MalformedPayload)?;
                (user.as_address(), token_id)
            }
            _ => return Err(ContractError::MalformedPayload),
        };

        if self.owner_of(token_id)? != self.address {
            return Err(ContractError::TokenNotEscrowed(token_id));
        }

        self.owners.insert(token_id, user);
        tracing::info!("Token {} released from escrow to {}", token_id, user.short());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployed() -> (NftContract, Address, Address) {
        let minter = Address::random();
        let l1 = Address::random();
        let nft = NftContract::new("NFT-L2", "NFT-L2", Address::random(), minter, l1);
        (nft, minter, l1)
    }

    #[test]
    fn only_the_minter_can_mint() {
        let (mut nft, minter, _) = deployed();
        let user = Address::random();

        assert!(matches!(
            nft.mint(user, user),
            Err(ContractError::NotMinter(_))
        ));

        let token_id = nft.mint(minter, user).unwrap();
        assert_eq!(token_id, 0);
        assert_eq!(nft.owner_of(0).unwrap(), user);

        // ids are sequential
        assert_eq!(nft.mint(minter, user).unwrap(), 1);
    }

    #[test]
    fn owner_of_fails_for_unknown_tokens() {
        let (nft, _, _) = deployed();
        assert!(matches!(
            nft.owner_of(5),
            Err(ContractError::TokenNotFound(5))
        ));
    }

    #[test]
    fn bridging_escrows_the_token_and_addresses_the_l1_contract() {
        let (mut nft, minter, l1) = deployed();
        let user = Address::random();
        let l1_user = Address::random();
        let token_id = nft.mint(minter, user).unwrap();

        let message = nft.bridge_to_l1(user, l1_user, token_id).unwrap();

        assert_eq!(nft.owner_of(token_id).unwrap(), nft.address());
        assert_eq!(message.from, nft.address());
        assert_eq!(message.to, l1);
        assert_eq!(
            message.payload,
            vec![Word::from(l1_user), Word::from(token_id)]
        );
    }

    #[test]
    fn only_the_owner_can_bridge_out() {
        let (mut nft, minter, _) = deployed();
        let user = Address::random();
        let token_id = nft.mint(minter, user).unwrap();

        let stranger = Address::random();
        assert!(matches!(
            nft.bridge_to_l1(stranger, stranger, token_id),
            Err(ContractError::NotOwner { .. })
        ));
        assert_eq!(nft.owner_of(token_id).unwrap(), user);
    }

    #[test]
    fn deposits_are_rejected_unless_escrowed_and_from_the_l1_contract() {
        let (mut nft, minter, l1) = deployed();
        let user = Address::random();
        let token_id = nft.mint(minter, user).unwrap();

        let nft_address = nft.address();
        let deposit = |from: Address| QueuedMessage {
            from,
            to: nft_address,
            payload: vec![Word::from(user), Word::from(token_id)],
        };

        // not escrowed yet
        assert!(matches!(
            nft.clone().on_l1_message(&deposit(l1)),
            Err(ContractError::TokenNotEscrowed(_))
        ));

        nft.bridge_to_l1(user, Address::random(), token_id).unwrap();

        // wrong sender
        assert!(matches!(
            nft.clone().on_l1_message(&deposit(Address::random())),
            Err(ContractError::UnknownSender(_))
        ));

        nft.on_l1_message(&deposit(l1)).unwrap();
        assert_eq!(nft.owner_of(token_id).unwrap(), user);
    }
}
