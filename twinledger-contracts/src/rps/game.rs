use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use twinledger_core::types::{Address, GameId};

use crate::error::{ContractError, Result};
use crate::rps::commitment::{compute_winner, Move, MoveCommitment, Salt, Winner};

/// One game's storage slots. Zero addresses and zero commitments mean
/// "unset", unrevealed moves are `None`, mirroring the contract's
/// zero-initialized storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub player1: Address,
    pub player2: Address,
    pub hashed_move1: MoveCommitment,
    pub hashed_move2: MoveCommitment,
    pub move1: Option<Move>,
    pub move2: Option<Move>,
    pub winner: Winner,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            player1: Address::ZERO,
            player2: Address::ZERO,
            hashed_move1: MoveCommitment::ZERO,
            hashed_move2: MoveCommitment::ZERO,
            move1: None,
            move2: None,
            winner: Winner::Undecided,
        }
    }
}

/// The commit-reveal rock-paper-scissors contract. Games spring into
/// existence on first touch; ids carry no meaning beyond keying storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpsContract {
    games: BTreeMap<GameId, Game>,
}

impl RpsContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read endpoint. Unknown ids return the default (all-zero) record,
    /// matching contract storage semantics.
    pub fn game(&self, game_id: GameId) -> Game {
        self.games.get(&game_id).cloned().unwrap_or_default()
    }

    pub fn games(&self) -> impl Iterator<Item = (GameId, &Game)> {
        self.games.iter().map(|(id, game)| (*id, game))
    }

    /// Commit a hashed move. The first caller becomes player1, the second
    /// a distinct player2; every failure leaves the game untouched.
    pub fn play(
        &mut self,
        caller: Address,
        game_id: GameId,
        hashed_move: MoveCommitment,
    ) -> Result<()> {
        if hashed_move.is_zero() {
            return Err(ContractError::EmptyCommitment);
        }

        let game = self.games.entry(game_id).or_default();

        if game.player1.is_zero() {
            game.player1 = caller;
            game.hashed_move1 = hashed_move;
            tracing::info!("Game {}: player1 committed ({})", game_id, caller.short());
            return Ok(());
        }

        if caller == game.player1 {
            return Err(ContractError::AlreadyPlayed(caller, game_id));
        }
        if hashed_move == game.hashed_move1 {
            return Err(ContractError::DuplicateCommitment(game_id));
        }

        if game.player2.is_zero() {
            game.player2 = caller;
            game.hashed_move2 = hashed_move;
            tracing::info!("Game {}: player2 committed ({})", game_id, caller.short());
            return Ok(());
        }

        if caller == game.player2 {
            return Err(ContractError::AlreadyPlayed(caller, game_id));
        }
        Err(ContractError::GameFull(game_id))
    }

    /// Disclose a move. The digest of (move, salt, caller) must equal the
    /// stored commitment; on mismatch the stored move stays unset.
    pub fn reveal(
        &mut self,
        caller: Address,
        game_id: GameId,
        mv: Move,
        salt: &Salt,
    ) -> Result<()> {
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(ContractError::NotInGame(caller, game_id))?;

        let expected = MoveCommitment::compute(mv, salt, caller);
        if caller == game.player1 {
            if expected != game.hashed_move1 {
                return Err(ContractError::CommitmentMismatch(game_id));
            }
            game.move1 = Some(mv);
        } else if caller == game.player2 {
            if expected != game.hashed_move2 {
                return Err(ContractError::CommitmentMismatch(game_id));
            }
            game.move2 = Some(mv);
        } else {
            return Err(ContractError::NotInGame(caller, game_id));
        }

        tracing::info!("Game {}: {} revealed {}", game_id, caller.short(), mv);
        Ok(())
    }

    /// Settle the game once both moves are on the table. Idempotent: a
    /// finished game returns its stored winner.
    pub fn finish(&mut self, game_id: GameId) -> Result<Winner> {
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(ContractError::MovesNotRevealed(game_id))?;

        if game.winner != Winner::Undecided {
            return Ok(game.winner);
        }

        let (move1, move2) = match (game.move1, game.move2) {
            (Some(m1), Some(m2)) => (m1, m2),
            _ => return Err(ContractError::MovesNotRevealed(game_id)),
        };

        game.winner = compute_winner(move1, move2);
        tracing::info!("Game {}: settled, winner = {}", game_id, game.winner);
        Ok(game.winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(mv: Move, salt_tag: u64, player: Address) -> (MoveCommitment, Salt) {
        let salt = Salt::from_u64(salt_tag);
        (MoveCommitment::compute(mv, &salt, player), salt)
    }

    #[test]
    fn sets_player1_after_the_first_move() {
        let p1 = Address::random();
        let mut rps = RpsContract::new();
        let (hash, _) = committed(Move::Rock, 1, p1);

        rps.play(p1, 1, hash).unwrap();

        let game = rps.game(1);
        assert_eq!(game.player1, p1);
        assert!(game.player2.is_zero());
        assert_eq!(game.hashed_move1, hash);
    }

    #[test]
    fn sets_player2_and_preserves_player1() {
        let p1 = Address::random();
        let p2 = Address::random();
        let mut rps = RpsContract::new();
        let (hash1, _) = committed(Move::Rock, 1, p1);
        let (hash2, _) = committed(Move::Paper, 2, p2);

        rps.play(p1, 1, hash1).unwrap();
        rps.play(p2, 1, hash2).unwrap();

        let game = rps.game(1);
        assert_eq!(game.player1, p1);
        assert_eq!(game.player2, p2);
        assert_eq!(game.hashed_move2, hash2);
    }

    #[test]
    fn fails_if_the_hashed_move_is_zero() {
        let mut rps = RpsContract::new();
        let err = rps
            .play(Address::random(), 1, MoveCommitment::ZERO)
            .unwrap_err();
        assert!(matches!(err, ContractError::EmptyCommitment));
        assert!(rps.game(1).player1.is_zero());
    }

    #[test]
    fn fails_if_player2_reuses_player1s_commitment() {
        let p1 = Address::random();
        let p2 = Address::random();
        let mut rps = RpsContract::new();
        let (hash, _) = committed(Move::Rock, 1, p1);

        rps.play(p1, 1, hash).unwrap();
        let err = rps.play(p2, 1, hash).unwrap_err();
        assert!(matches!(err, ContractError::DuplicateCommitment(1)));
        assert!(rps.game(1).player2.is_zero());
    }

    #[test]
    fn fails_if_player1_plays_twice() {
        let p1 = Address::random();
        let mut rps = RpsContract::new();
        let (first, _) = committed(Move::Rock, 1, p1);
        let (second, _) = committed(Move::Paper, 2, p1);

        rps.play(p1, 1, first).unwrap();
        let err = rps.play(p1, 1, second).unwrap_err();
        assert!(matches!(err, ContractError::AlreadyPlayed(_, 1)));
    }

    #[test]
    fn fails_when_the_game_is_full() {
        let mut rps = RpsContract::new();
        for (i, player) in [Address::random(), Address::random()].into_iter().enumerate() {
            let (hash, _) = committed(Move::Rock, i as u64 + 1, player);
            rps.play(player, 1, hash).unwrap();
        }

        let third = Address::random();
        let (hash, _) = committed(Move::Scissors, 9, third);
        assert!(matches!(
            rps.play(third, 1, hash),
            Err(ContractError::GameFull(1))
        ));
    }

    #[test]
    fn reveals_a_move_when_the_digest_matches() {
        let p1 = Address::random();
        let p2 = Address::random();
        let mut rps = RpsContract::new();
        let (hash1, salt1) = committed(Move::Paper, 1, p1);
        let (hash2, _) = committed(Move::Scissors, 2, p2);

        rps.play(p1, 1, hash1).unwrap();
        rps.play(p2, 1, hash2).unwrap();
        rps.reveal(p1, 1, Move::Paper, &salt1).unwrap();

        assert_eq!(rps.game(1).move1, Some(Move::Paper));
        assert_eq!(rps.game(1).move2, None);
    }

    #[test]
    fn a_mismatched_reveal_never_mutates_the_stored_move() {
        let p1 = Address::random();
        let p2 = Address::random();
        let mut rps = RpsContract::new();
        let (hash1, _) = committed(Move::Paper, 1, p1);
        let (hash2, _) = committed(Move::Scissors, 2, p2);

        rps.play(p1, 1, hash1).unwrap();
        rps.play(p2, 1, hash2).unwrap();

        // wrong salt
        let err = rps
            .reveal(p1, 1, Move::Paper, &Salt::from_u64(3))
            .unwrap_err();
        assert!(matches!(err, ContractError::CommitmentMismatch(1)));
        assert_eq!(rps.game(1).move1, None);

        // right salt, wrong move
        let err = rps
            .reveal(p1, 1, Move::Rock, &Salt::from_u64(1))
            .unwrap_err();
        assert!(matches!(err, ContractError::CommitmentMismatch(1)));
        assert_eq!(rps.game(1).move1, None);
    }

    #[test]
    fn strangers_cannot_reveal() {
        let p1 = Address::random();
        let mut rps = RpsContract::new();
        let (hash1, salt1) = committed(Move::Paper, 1, p1);
        rps.play(p1, 1, hash1).unwrap();

        let stranger = Address::random();
        assert!(matches!(
            rps.reveal(stranger, 1, Move::Paper, &salt1),
            Err(ContractError::NotInGame(_, 1))
        ));
    }

    #[test]
    fn finish_requires_both_reveals() {
        let p1 = Address::random();
        let p2 = Address::random();
        let mut rps = RpsContract::new();
        let (hash1, salt1) = committed(Move::Paper, 1, p1);
        let (hash2, salt2) = committed(Move::Scissors, 2, p2);

        rps.play(p1, 1, hash1).unwrap();
        rps.play(p2, 1, hash2).unwrap();
        assert!(matches!(
            rps.finish(1),
            Err(ContractError::MovesNotRevealed(1))
        ));

        rps.reveal(p1, 1, Move::Paper, &salt1).unwrap();
        assert!(rps.finish(1).is_err());

        rps.reveal(p2, 1, Move::Scissors, &salt2).unwrap();
        assert_eq!(rps.finish(1).unwrap(), Winner::Player2);
        assert_eq!(rps.game(1).winner, Winner::Player2);

        // settled games stay settled
        assert_eq!(rps.finish(1).unwrap(), Winner::Player2);
    }
}
