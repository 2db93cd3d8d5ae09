use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use twinledger_core::types::{parse_hex32, Address};

use crate::error::{ContractError, Result};

/// One of the three moves, encoded 1/2/3 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

pub const ALL_MOVES: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

impl Move {
    pub fn as_u8(&self) -> u8 {
        match self {
            Move::Rock => 1,
            Move::Paper => 2,
            Move::Scissors => 3,
        }
    }

    /// The fixed cycle: Rock beats Scissors, Scissors beats Paper,
    /// Paper beats Rock.
    pub fn beats(&self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Scissors, Move::Paper)
                | (Move::Paper, Move::Rock)
        )
    }
}

impl TryFrom<u8> for Move {
    type Error = ContractError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            other => Err(ContractError::InvalidMove(other)),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Game outcome, encoded 0..3 to match the contract read shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Undecided,
    Player1,
    Player2,
    Tie,
}

impl Winner {
    pub fn as_u8(&self) -> u8 {
        match self {
            Winner::Undecided => 0,
            Winner::Player1 => 1,
            Winner::Player2 => 2,
            Winner::Tie => 3,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Winner::Undecided => "undecided",
            Winner::Player1 => "player1",
            Winner::Player2 => "player2",
            Winner::Tie => "tie",
        };
        f.write_str(name)
    }
}

/// Pure outcome rule: tie on the diagonal, otherwise the cycle decides.
pub fn compute_winner(move1: Move, move2: Move) -> Winner {
    if move1 == move2 {
        Winner::Tie
    } else if move1.beats(move2) {
        Winner::Player1
    } else {
        Winner::Player2
    }
}

/// Random value a player mixes into their commitment so the digest cannot
/// be brute-forced over the three possible moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt(pub [u8; 32]);

impl Salt {
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Salt(bytes)
    }

    /// Low-entropy salt for tests and demos.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Salt(bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(Salt(parse_hex32(s).map_err(ContractError::Ledger)?))
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Salt {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Salt::from_hex(s)
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Salt::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// One-way digest of (move, salt, player). The player address is hashed in
/// so two players picking the same move and salt still produce distinct
/// commitments; the zero digest doubles as "unset" in game storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommitment(pub [u8; 32]);

impl MoveCommitment {
    pub const ZERO: MoveCommitment = MoveCommitment([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Inner hash binds (move, salt); the outer hash binds the player.
    pub fn compute(mv: Move, salt: &Salt, player: Address) -> Self {
        let mut inner = Sha256::new();
        inner.update([mv.as_u8()]);
        inner.update(salt.0);

        let mut outer = Sha256::new();
        outer.update(inner.finalize());
        outer.update(player.as_bytes());
        MoveCommitment(outer.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Ok(MoveCommitment(parse_hex32(s).map_err(ContractError::Ledger)?))
    }

    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}..{}", &full[..6], &full[full.len() - 6..])
    }
}

impl fmt::Display for MoveCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for MoveCommitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MoveCommitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MoveCommitment::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_binds_move_salt_and_player() {
        let player = Address::random();
        let salt = Salt::random();
        let commitment = MoveCommitment::compute(Move::Paper, &salt, player);

        assert_eq!(MoveCommitment::compute(Move::Paper, &salt, player), commitment);
        assert_ne!(MoveCommitment::compute(Move::Rock, &salt, player), commitment);
        assert_ne!(
            MoveCommitment::compute(Move::Paper, &Salt::random(), player),
            commitment
        );
        assert_ne!(
            MoveCommitment::compute(Move::Paper, &salt, Address::random()),
            commitment
        );
    }

    #[test]
    fn computes_all_scores_correctly() {
        use Move::*;
        use Winner::*;

        assert_eq!(compute_winner(Rock, Rock), Tie);
        assert_eq!(compute_winner(Paper, Paper), Tie);
        assert_eq!(compute_winner(Scissors, Scissors), Tie);
        assert_eq!(compute_winner(Rock, Paper), Player2);
        assert_eq!(compute_winner(Rock, Scissors), Player1);
        assert_eq!(compute_winner(Paper, Rock), Player1);
        assert_eq!(compute_winner(Paper, Scissors), Player2);
        assert_eq!(compute_winner(Scissors, Rock), Player2);
        assert_eq!(compute_winner(Scissors, Paper), Player1);
    }

    #[test]
    fn winner_is_antisymmetric_off_the_diagonal() {
        for m1 in ALL_MOVES {
            for m2 in ALL_MOVES {
                let forward = compute_winner(m1, m2);
                let backward = compute_winner(m2, m1);
                if m1 == m2 {
                    assert_eq!(forward, Winner::Tie);
                    assert_eq!(backward, Winner::Tie);
                } else {
                    let flipped = match backward {
                        Winner::Player1 => Winner::Player2,
                        Winner::Player2 => Winner::Player1,
                        other => other,
                    };
                    assert_eq!(forward, flipped);
                }
            }
        }
    }

    #[test]
    fn move_wire_encoding_round_trips() {
        for mv in ALL_MOVES {
            assert_eq!(Move::try_from(mv.as_u8()).unwrap(), mv);
        }
        assert!(matches!(Move::try_from(0), Err(ContractError::InvalidMove(0))));
        assert!(matches!(Move::try_from(4), Err(ContractError::InvalidMove(4))));
    }

    #[test]
    fn salt_hex_round_trips() {
        let salt = Salt::random();
        assert_eq!(Salt::from_hex(&salt.to_hex()).unwrap(), salt);
        assert!(Salt::from_hex("0xbeef").is_err());
    }
}
