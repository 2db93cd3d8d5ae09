//! Commit-reveal rock-paper-scissors.
//!
//! Two-phase protocol: each player first publishes a one-way digest of
//! their move, then discloses the move and salt. Committing first makes
//! retroactive move choice impossible; hashing the player address into the
//! digest stops a player from replaying the opponent's commitment.

pub mod commitment;
pub mod game;

pub use commitment::{compute_winner, Move, MoveCommitment, Salt, Winner, ALL_MOVES};
pub use game::{Game, RpsContract};
