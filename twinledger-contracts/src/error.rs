use thiserror::Error;
use twinledger_core::types::{Address, GameId, TokenId};

pub type Result<T> = std::result::Result<T, ContractError>;

/// Revert reasons. Every variant renders into the receipt's reason string.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error(transparent)]
    Ledger(#[from] twinledger_core::LedgerError),

    #[error("Contract not deployed: {0}")]
    NotDeployed(&'static str),

    #[error("Invalid move value: {0}")]
    InvalidMove(u8),

    #[error("Hashed move must not be zero")]
    EmptyCommitment,

    #[error("Player {0} already committed in game {1}")]
    AlreadyPlayed(Address, GameId),

    #[error("Commitment duplicates player1's in game {0}")]
    DuplicateCommitment(GameId),

    #[error("Game {0} already has two players")]
    GameFull(GameId),

    #[error("Caller {0} is not part of game {1}")]
    NotInGame(Address, GameId),

    #[error("Reveal does not match the stored commitment in game {0}")]
    CommitmentMismatch(GameId),

    #[error("Game {0} still has unrevealed moves")]
    MovesNotRevealed(GameId),

    #[error("Increment of {inc} is out of range: value {value}, cap {max}")]
    CapExceeded { inc: u64, value: u64, max: u64 },

    #[error("Counter value would overflow")]
    Overflow,

    #[error("Initial value {initial} exceeds cap {max}")]
    InitialPastCap { initial: u64, max: u64 },

    #[error("Caller {0} is not the minter")]
    NotMinter(Address),

    #[error("Caller {caller} does not own token {token_id}")]
    NotOwner { caller: Address, token_id: TokenId },

    #[error("Token {0} does not exist")]
    TokenNotFound(TokenId),

    #[error("Token {0} is not held in bridge escrow")]
    TokenNotEscrowed(TokenId),

    #[error("Message from unknown sender {0}")]
    UnknownSender(Address),

    #[error("No matching bridge message for token {0}")]
    NoMatchingMessage(TokenId),

    #[error("Malformed bridge payload")]
    MalformedPayload,

    #[error("Bridge already initialized")]
    AlreadyInitialized,

    #[error("Bridge not initialized")]
    NotInitialized,
}
