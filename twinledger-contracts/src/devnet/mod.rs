//! The devnet harness.
//!
//! `Devnet` wires the example contracts, named accounts, the cross-layer
//! message queue, and transaction receipts into a single local two-ledger
//! sandbox. Everything persists through `twinledger-core` storage, so the
//! CLIs and any embedding process observe the same devnet between runs.
//!
//! Execution model: invocations apply synchronously (every contract
//! validates before it writes, so a revert leaves state untouched), but
//! their receipts stay pending until the next block. `flush` relays
//! queued cross-layer messages the way the original devnet relayer did
//! and produces a block as a side effect.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use twinledger_core::deployments::Deployments;
use twinledger_core::messaging::{Direction, FlushReport, MessageQueue};
use twinledger_core::storage::{
    AccountRecord, AccountStore, ContractStore, MessageStore, ReceiptStore, Storage,
};
use twinledger_core::types::{
    Address, GameId, Layer, Network, TokenId, TxHash, TxReceipt,
};
use twinledger_core::LedgerError;

use crate::counter::Counter;
use crate::error::{ContractError, Result};
use crate::nft::{BridgedNft, NftContract};
use crate::rps::{Game, Move, MoveCommitment, RpsContract, Salt, Winner};

const DB_FILE: &str = "twinledger.db";

const COUNTER: &str = "counter";
const RPS: &str = "rps";
const NFT: &str = "nft";
const L1_NFT: &str = "l1-nft";
const CHAIN_META: &str = "chain";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChainMeta {
    block_height: u64,
    nonce: u64,
}

pub struct Devnet {
    data_dir: PathBuf,
    network: Network,
    storage: Arc<Storage>,
    queue: MessageQueue,
    counter: Option<(Address, Counter)>,
    rps: Option<(Address, RpsContract)>,
    nft: Option<NftContract>,
    l1_nft: Option<BridgedNft>,
    // name -> address cache over the account store
    accounts: Arc<RwLock<HashMap<String, Address>>>,
    meta: ChainMeta,
}

impl Devnet {
    /// Load (or initialize) the devnet persisted under `data_dir` for the
    /// given network.
    pub async fn open(data_dir: impl Into<PathBuf>, network: Network) -> Result<Self> {
        let data_dir = data_dir.into();
        let storage = Arc::new(Storage::new(&data_dir.join(DB_FILE)).await?);

        let contract_store = ContractStore::new(&storage);
        let counter = contract_store.load::<Counter>(&network, COUNTER).await?;
        let rps = contract_store.load::<RpsContract>(&network, RPS).await?;
        let nft = contract_store
            .load::<NftContract>(&network, NFT)
            .await?
            .map(|(_, contract)| contract);
        let l1_nft = contract_store
            .load::<BridgedNft>(&network, L1_NFT)
            .await?
            .map(|(_, contract)| contract);
        let meta = contract_store
            .load::<ChainMeta>(&network, CHAIN_META)
            .await?
            .map(|(_, meta)| meta)
            .unwrap_or_default();

        let queue = MessageStore::new(&storage).load_queue(&network).await?;

        tracing::debug!(
            "Opened devnet '{}' at block {}",
            network,
            meta.block_height
        );
        Ok(Self {
            data_dir,
            network,
            storage,
            queue,
            counter,
            rps,
            nft,
            l1_nft,
            accounts: Arc::new(RwLock::new(HashMap::new())),
            meta,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Shared storage handle, for wiring up a `TxTracker`.
    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    pub fn block_height(&self) -> u64 {
        self.meta.block_height
    }

    // ---- accounts ----

    pub async fn create_account(&self, name: &str) -> Result<Address> {
        let record = AccountStore::new(&self.storage)
            .create(&self.network, name)
            .await?;
        self.accounts
            .write()
            .insert(name.to_string(), record.address);
        Ok(record.address)
    }

    pub async fn account(&self, name: &str) -> Result<Address> {
        if let Some(address) = self.accounts.read().get(name) {
            return Ok(*address);
        }

        let record = AccountStore::new(&self.storage)
            .get(&self.network, name)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                name: name.to_string(),
            })?;
        self.accounts
            .write()
            .insert(name.to_string(), record.address);
        Ok(record.address)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        Ok(AccountStore::new(&self.storage)
            .list(&self.network)
            .await?)
    }

    // ---- deployment ----

    pub async fn deploy_counter(&mut self, initial: u64, max: u64) -> Result<Address> {
        let counter = Counter::new(initial, max)?;
        let address = Address::random();
        self.counter = Some((address, counter));
        self.persist_counter().await?;
        self.record_deployments(&[(COUNTER, address)]).await?;

        tracing::info!("Deployed counter at {}", address);
        Ok(address)
    }

    pub async fn deploy_rps(&mut self) -> Result<Address> {
        let address = Address::random();
        self.rps = Some((address, RpsContract::new()));
        self.persist_rps().await?;
        self.record_deployments(&[(RPS, address)]).await?;

        tracing::info!("Deployed rock-paper-scissors at {}", address);
        Ok(address)
    }

    /// Deploy both halves of the NFT bridge and wire them together.
    /// Returns (L2 address, L1 address).
    pub async fn deploy_bridge(
        &mut self,
        name: &str,
        symbol: &str,
        minter: Address,
    ) -> Result<(Address, Address)> {
        let mut l1_nft = BridgedNft::new(
            format!("{}-L1", name),
            format!("{}-L1", symbol),
            Address::random(),
        );
        let nft = NftContract::new(
            format!("{}-L2", name),
            format!("{}-L2", symbol),
            Address::random(),
            minter,
            l1_nft.address(),
        );
        l1_nft.initialize(nft.address())?;

        let addresses = (nft.address(), l1_nft.address());
        self.nft = Some(nft);
        self.l1_nft = Some(l1_nft);
        self.persist_nft().await?;
        self.persist_l1_nft().await?;
        self.record_deployments(&[(NFT, addresses.0), (L1_NFT, addresses.1)])
            .await?;

        tracing::info!(
            "Deployed NFT bridge: L2 {} <-> L1 {}",
            addresses.0,
            addresses.1
        );
        Ok(addresses)
    }

    pub async fn deployments(&self) -> Result<Deployments> {
        Ok(Deployments::load(&self.data_dir, &self.network).await?)
    }

    pub async fn contracts(&self) -> Result<Vec<(String, Address, String)>> {
        let listed = ContractStore::new(&self.storage).list(&self.network).await?;
        Ok(listed
            .into_iter()
            .filter(|(name, _, _)| name != CHAIN_META)
            .collect())
    }

    // ---- counter ----

    pub fn counter_read(&self) -> Result<u64> {
        self.counter
            .as_ref()
            .map(|(_, counter)| counter.read())
            .ok_or(ContractError::NotDeployed(COUNTER))
    }

    pub async fn counter_increment(&mut self, inc: u64) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("counter.increment");
        let outcome = match self.counter.as_mut() {
            None => Err(ContractError::NotDeployed(COUNTER)),
            Some((_, counter)) => counter.increment(inc).map(|_| ()),
        };
        if outcome.is_ok() {
            self.persist_counter().await?;
        }
        self.persist_meta().await?;
        Ok(self.settle(Layer::L2, hash, outcome).await?.0)
    }

    // ---- rock-paper-scissors ----

    pub fn rps_game(&self, game_id: GameId) -> Result<Game> {
        self.rps
            .as_ref()
            .map(|(_, rps)| rps.game(game_id))
            .ok_or(ContractError::NotDeployed(RPS))
    }

    pub fn rps_games(&self) -> Result<Vec<(GameId, Game)>> {
        self.rps
            .as_ref()
            .map(|(_, rps)| {
                rps.games()
                    .map(|(id, game)| (id, game.clone()))
                    .collect()
            })
            .ok_or(ContractError::NotDeployed(RPS))
    }

    pub async fn rps_play(
        &mut self,
        caller: Address,
        game_id: GameId,
        hashed_move: MoveCommitment,
    ) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("rps.play");
        let outcome = match self.rps.as_mut() {
            None => Err(ContractError::NotDeployed(RPS)),
            Some((_, rps)) => rps.play(caller, game_id, hashed_move),
        };
        if outcome.is_ok() {
            self.persist_rps().await?;
        }
        self.persist_meta().await?;
        Ok(self.settle(Layer::L2, hash, outcome).await?.0)
    }

    pub async fn rps_reveal(
        &mut self,
        caller: Address,
        game_id: GameId,
        mv: Move,
        salt: &Salt,
    ) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("rps.reveal");
        let outcome = match self.rps.as_mut() {
            None => Err(ContractError::NotDeployed(RPS)),
            Some((_, rps)) => rps.reveal(caller, game_id, mv, salt),
        };
        if outcome.is_ok() {
            self.persist_rps().await?;
        }
        self.persist_meta().await?;
        Ok(self.settle(Layer::L2, hash, outcome).await?.0)
    }

    pub async fn rps_finish(&mut self, game_id: GameId) -> Result<(TxReceipt, Winner)> {
        let hash = self.next_tx_hash("rps.finish");
        let outcome = match self.rps.as_mut() {
            None => Err(ContractError::NotDeployed(RPS)),
            Some((_, rps)) => rps.finish(game_id),
        };
        if outcome.is_ok() {
            self.persist_rps().await?;
        }
        self.persist_meta().await?;
        self.settle(Layer::L2, hash, outcome).await
    }

    // ---- nft bridge ----

    pub fn nft_owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.nft
            .as_ref()
            .ok_or(ContractError::NotDeployed(NFT))?
            .owner_of(token_id)
    }

    pub fn l1_owner_of(&self, token_id: TokenId) -> Result<Address> {
        self.l1_nft
            .as_ref()
            .ok_or(ContractError::NotDeployed(L1_NFT))?
            .owner_of(token_id)
    }

    pub async fn nft_mint(
        &mut self,
        caller: Address,
        user: Address,
    ) -> Result<(TxReceipt, TokenId)> {
        let hash = self.next_tx_hash("nft.mint");
        let outcome = match self.nft.as_mut() {
            None => Err(ContractError::NotDeployed(NFT)),
            Some(nft) => nft.mint(caller, user),
        };
        if outcome.is_ok() {
            self.persist_nft().await?;
        }
        self.persist_meta().await?;
        self.settle(Layer::L2, hash, outcome).await
    }

    pub async fn bridge_to_l1(
        &mut self,
        caller: Address,
        l1_user: Address,
        token_id: TokenId,
    ) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("nft.bridge_to_l1");
        let outcome = match self.nft.as_mut() {
            None => Err(ContractError::NotDeployed(NFT)),
            Some(nft) => nft.bridge_to_l1(caller, l1_user, token_id),
        }
        .map(|message| self.queue.send_to_l1(message));
        if outcome.is_ok() {
            self.persist_nft().await?;
            self.persist_queue().await?;
        }
        self.persist_meta().await?;
        Ok(self.settle(Layer::L2, hash, outcome).await?.0)
    }

    pub async fn bridge_from_l2(&mut self, to: Address, token_id: TokenId) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("l1_nft.bridge_from_l2");
        let outcome = match self.l1_nft.as_mut() {
            None => Err(ContractError::NotDeployed(L1_NFT)),
            Some(l1_nft) => l1_nft.bridge_from_l2(&mut self.queue, to, token_id),
        };
        let outcome = match outcome {
            Ok(message) => {
                MessageStore::new(&self.storage)
                    .record_consumed(&self.network, Direction::ToL1, &message)
                    .await?;
                self.persist_l1_nft().await?;
                self.persist_queue().await?;
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.persist_meta().await?;
        Ok(self.settle(Layer::L1, hash, outcome).await?.0)
    }

    pub async fn bridge_to_l2(
        &mut self,
        caller: Address,
        l2_user: Address,
        token_id: TokenId,
    ) -> Result<TxReceipt> {
        let hash = self.next_tx_hash("l1_nft.bridge_to_l2");
        let outcome = match self.l1_nft.as_mut() {
            None => Err(ContractError::NotDeployed(L1_NFT)),
            Some(l1_nft) => l1_nft.bridge_to_l2(caller, l2_user, token_id),
        }
        .map(|message| self.queue.send_to_l2(message));
        if outcome.is_ok() {
            self.persist_l1_nft().await?;
            self.persist_queue().await?;
        }
        self.persist_meta().await?;
        Ok(self.settle(Layer::L1, hash, outcome).await?.0)
    }

    // ---- relaying and blocks ----

    /// Counts of messages awaiting a flush: (L2->L1, L1->L2).
    pub fn pending_messages(&self) -> (usize, usize) {
        (
            self.queue.pending_to_l1().len(),
            self.queue.pending_to_l2().len(),
        )
    }

    /// Flushed L2->L1 messages not yet claimed by the L1 contract.
    pub fn consumable_messages(&self) -> usize {
        self.queue.consumable_on_l1().len()
    }

    /// Drain the queue. L1->L2 messages are delivered to the L2 NFT
    /// contract here; L2->L1 messages become claimable via
    /// `bridge_from_l2`. Produces a block.
    pub async fn flush(&mut self) -> Result<FlushReport> {
        let report = self.queue.flush();

        let mut delivered_any = false;
        for message in &report.from_l1 {
            match self.nft.as_mut() {
                Some(nft) if message.to == nft.address() => {
                    nft.on_l1_message(message)?;
                    delivered_any = true;
                }
                _ => {
                    tracing::warn!(
                        "No L2 contract at {} for flushed message",
                        message.to.short()
                    );
                }
            }
        }

        // every relayed L1->L2 message lands in the consumed history,
        // deliverable or not, so nothing leaves the queue unaccounted for
        let message_store = MessageStore::new(&self.storage);
        for message in &report.from_l1 {
            message_store
                .record_consumed(&self.network, Direction::ToL2, message)
                .await?;
        }

        if delivered_any {
            self.persist_nft().await?;
        }
        self.persist_queue().await?;
        self.produce_block().await?;
        Ok(report)
    }

    /// Finalize every pending receipt at the next block height.
    pub async fn produce_block(&mut self) -> Result<u64> {
        self.meta.block_height += 1;
        let block = self.meta.block_height;
        ReceiptStore::new(&self.storage)
            .finalize_pending(&self.network, block)
            .await?;
        self.persist_meta().await?;

        tracing::debug!("Produced block {}", block);
        Ok(block)
    }

    // ---- receipts ----

    pub async fn receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>> {
        Ok(ReceiptStore::new(&self.storage)
            .get(&self.network, hash)
            .await?)
    }

    pub async fn recent_receipts(&self, limit: usize) -> Result<Vec<TxReceipt>> {
        Ok(ReceiptStore::new(&self.storage)
            .list_recent(&self.network, limit)
            .await?)
    }

    // ---- maintenance ----

    /// Wipe this network: accounts, contracts, messages, receipts, and the
    /// deployment artifact. Other networks in the same data dir survive.
    pub async fn reset(&mut self) -> Result<()> {
        AccountStore::new(&self.storage).clear(&self.network).await?;
        ContractStore::new(&self.storage).clear(&self.network).await?;
        MessageStore::new(&self.storage).clear(&self.network).await?;
        ReceiptStore::new(&self.storage).clear(&self.network).await?;

        self.queue = MessageQueue::new();
        self.counter = None;
        self.rps = None;
        self.nft = None;
        self.l1_nft = None;
        self.meta = ChainMeta::default();
        self.accounts.write().clear();

        let artifact = Deployments::artifact_path(&self.data_dir, &self.network);
        if artifact.exists() {
            tokio::fs::remove_file(artifact)
                .await
                .map_err(LedgerError::Io)?;
        }

        tracing::info!("Reset network '{}'", self.network);
        Ok(())
    }

    // ---- internals ----

    async fn record_deployments(&self, entries: &[(&str, Address)]) -> Result<()> {
        let mut deployments = Deployments::load(&self.data_dir, &self.network).await?;
        for (name, address) in entries {
            deployments.set(*name, *address);
        }
        deployments.save(&self.data_dir, &self.network).await?;
        Ok(())
    }

    fn next_tx_hash(&mut self, label: &str) -> TxHash {
        self.meta.nonce += 1;
        TxHash::digest(&[
            self.network.as_str().as_bytes(),
            label.as_bytes(),
            &self.meta.nonce.to_be_bytes(),
        ])
    }

    /// Record the receipt for an invocation. Reverts keep their reason and
    /// bubble the error to the caller.
    async fn settle<T>(
        &self,
        layer: Layer,
        hash: TxHash,
        outcome: Result<T>,
    ) -> Result<(TxReceipt, T)> {
        let store = ReceiptStore::new(&self.storage);
        match outcome {
            Ok(value) => {
                let receipt = TxReceipt::pending(hash, layer);
                store.save(&self.network, &receipt).await?;
                Ok((receipt, value))
            }
            Err(e) => {
                let receipt = TxReceipt::rejected(hash, layer, e.to_string());
                store.save(&self.network, &receipt).await?;
                tracing::warn!("Tx {} rejected: {}", hash.short(), e);
                Err(e)
            }
        }
    }

    async fn persist_counter(&self) -> Result<()> {
        if let Some((address, counter)) = &self.counter {
            ContractStore::new(&self.storage)
                .save(&self.network, COUNTER, *address, "counter", counter)
                .await?;
        }
        Ok(())
    }

    async fn persist_rps(&self) -> Result<()> {
        if let Some((address, rps)) = &self.rps {
            ContractStore::new(&self.storage)
                .save(&self.network, RPS, *address, "rps", rps)
                .await?;
        }
        Ok(())
    }

    async fn persist_nft(&self) -> Result<()> {
        if let Some(nft) = &self.nft {
            ContractStore::new(&self.storage)
                .save(&self.network, NFT, nft.address(), "nft-l2", nft)
                .await?;
        }
        Ok(())
    }

    async fn persist_l1_nft(&self) -> Result<()> {
        if let Some(l1_nft) = &self.l1_nft {
            ContractStore::new(&self.storage)
                .save(&self.network, L1_NFT, l1_nft.address(), "nft-l1", l1_nft)
                .await?;
        }
        Ok(())
    }

    async fn persist_queue(&self) -> Result<()> {
        MessageStore::new(&self.storage)
            .save_queue(&self.network, &self.queue)
            .await?;
        Ok(())
    }

    async fn persist_meta(&self) -> Result<()> {
        ContractStore::new(&self.storage)
            .save(&self.network, CHAIN_META, Address::ZERO, "meta", &self.meta)
            .await?;
        Ok(())
    }
}
