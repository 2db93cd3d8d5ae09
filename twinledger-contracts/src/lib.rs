//! Example contracts and the devnet harness for twinledger.
//!
//! Three contracts cover the usual l2 patterns: a capped [`Counter`], a
//! commit-reveal [`RpsContract`], and an NFT pair bridged across the two
//! ledgers. [`Devnet`] runs them against `twinledger-core` storage with
//! queued cross-layer messaging and block-gated receipts.

pub mod counter;
pub mod devnet;
pub mod error;
pub mod nft;
pub mod rps;

pub use counter::Counter;
pub use devnet::Devnet;
pub use error::{ContractError, Result};
pub use nft::{BridgedNft, NftContract};
pub use rps::{compute_winner, Game, Move, MoveCommitment, RpsContract, Salt, Winner};
