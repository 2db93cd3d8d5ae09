//! L1<>L2 bridged NFT pair.
//!
//! A token lives on exactly one ledger at a time. L2 escrows it under the
//! contract address and messages L1, which mints on claim; bridging back
//! burns on L1 and messages L2, which releases the escrow. Both payloads
//! are `[recipient, token_id]`.

pub mod l1;
pub mod l2;

pub use l1::BridgedNft;
pub use l2::NftContract;
