use anyhow::{anyhow, bail, Context};
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use twinledger_contracts::{Devnet, Game, Move, MoveCommitment, Salt, Winner};
use twinledger_core::types::{Address, GameId};

/// Salts saved at commit time so reveal works from another invocation.
/// Keyed "network:game_id:address".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SaltBook {
    salts: HashMap<String, Salt>,
}

fn salt_book_path(data_dir: &Path) -> PathBuf {
    data_dir.join("rps_salts.json")
}

fn salt_key(devnet: &Devnet, game_id: GameId, player: Address) -> String {
    format!("{}:{}:{}", devnet.network(), game_id, player.to_hex())
}

fn load_salt_book(data_dir: &Path) -> SaltBook {
    let path = salt_book_path(data_dir);
    if path.exists() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            if let Ok(book) = serde_json::from_str(&content) {
                return book;
            }
        }
    }
    SaltBook::default()
}

fn save_salt_book(data_dir: &Path, book: &SaltBook) -> anyhow::Result<()> {
    let path = salt_book_path(data_dir);
    let content = serde_json::to_string_pretty(book)?;
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn parse_move(s: &str) -> anyhow::Result<Move> {
    match s.to_lowercase().as_str() {
        "rock" | "r" | "1" => Ok(Move::Rock),
        "paper" | "p" | "2" => Ok(Move::Paper),
        "scissors" | "s" | "3" => Ok(Move::Scissors),
        other => bail!("Invalid move '{}'. Use rock, paper, or scissors", other),
    }
}

pub async fn play(
    devnet: &mut Devnet,
    data_dir: &Path,
    account: &str,
    game_id: GameId,
    mv: &str,
) -> anyhow::Result<()> {
    let mv = parse_move(mv)?;
    let player = devnet.account(account).await?;

    let mut book = load_salt_book(data_dir);
    let key = salt_key(devnet, game_id, player);
    if book.salts.contains_key(&key) {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "A salt for game {} already exists; committing again will replace it. Continue?",
                game_id
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let salt = Salt::random();
    let commitment = MoveCommitment::compute(mv, &salt, player);

    let receipt = devnet.rps_play(player, game_id, commitment).await?;
    devnet.produce_block().await?;

    book.salts.insert(key, salt);
    save_salt_book(data_dir, &book)?;

    println!("Committed {} to game {} as '{}'", mv, game_id, account);
    println!("  Commitment: {}", commitment.short());
    println!("  Transaction: {}", receipt.hash);
    println!();
    println!("Your salt is saved locally. Reveal with:");
    println!("rps reveal {} {} {}", account, game_id, mv);

    Ok(())
}

pub async fn reveal(
    devnet: &mut Devnet,
    data_dir: &Path,
    account: &str,
    game_id: GameId,
    mv: &str,
    salt: Option<String>,
) -> anyhow::Result<()> {
    let mv = parse_move(mv)?;
    let player = devnet.account(account).await?;

    let book = load_salt_book(data_dir);
    let salt = match salt {
        Some(s) => Salt::from_hex(&s)?,
        None => {
            let key = salt_key(devnet, game_id, player);
            *book.salts.get(&key).ok_or_else(|| {
                anyhow!(
                    "No saved salt for game {}; pass one with --salt",
                    game_id
                )
            })?
        }
    };

    let receipt = devnet.rps_reveal(player, game_id, mv, &salt).await?;
    devnet.produce_block().await?;

    println!("Revealed {} in game {}", mv, game_id);
    println!("  Transaction: {}", receipt.hash);

    let game = devnet.rps_game(game_id)?;
    if game.move1.is_some() && game.move2.is_some() {
        println!();
        println!("Both moves are in. Settle with: rps finish {}", game_id);
    }

    Ok(())
}

pub async fn finish(devnet: &mut Devnet, game_id: GameId) -> anyhow::Result<()> {
    let (receipt, winner) = devnet.rps_finish(game_id).await?;
    devnet.produce_block().await?;

    println!("Game {} settled!", game_id);
    println!("  Transaction: {}", receipt.hash);
    println!();

    let game = devnet.rps_game(game_id)?;
    match winner {
        Winner::Tie => println!("It's a tie."),
        Winner::Player1 => println!("Winner: player1 ({})", game.player1.short()),
        Winner::Player2 => println!("Winner: player2 ({})", game.player2.short()),
        Winner::Undecided => println!("Still undecided."),
    }

    Ok(())
}

pub async fn status(devnet: &Devnet, game_id: GameId) -> anyhow::Result<()> {
    let game = devnet.rps_game(game_id)?;

    println!("Game {} on network '{}':", game_id, devnet.network());
    print_player("Player 1", game.player1, &game.hashed_move1, game.move1);
    print_player("Player 2", game.player2, &game.hashed_move2, game.move2);
    println!("  Winner: {}", game.winner);

    Ok(())
}

pub async fn list(devnet: &Devnet) -> anyhow::Result<()> {
    let games = devnet.rps_games()?;

    if games.is_empty() {
        println!("No games on network '{}'.", devnet.network());
        println!("Start one with: rps play <account> <game-id> <move>");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Game", "Player 1", "Player 2", "Revealed", "Winner"]);

    for (id, game) in games {
        let revealed = format!(
            "{}/{}",
            game.move1.is_some() as u8 + game.move2.is_some() as u8,
            players_in(&game)
        );
        table.add_row(vec![
            id.to_string(),
            short_or_dash(game.player1),
            short_or_dash(game.player2),
            revealed,
            game.winner.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn players_in(game: &Game) -> u8 {
    !game.player1.is_zero() as u8 + !game.player2.is_zero() as u8
}

fn short_or_dash(address: Address) -> String {
    if address.is_zero() {
        "-".to_string()
    } else {
        address.short()
    }
}

fn print_player(label: &str, address: Address, commitment: &MoveCommitment, mv: Option<Move>) {
    if address.is_zero() {
        println!("  {}: (open seat)", label);
        return;
    }
    println!("  {}: {}", label, address.short());
    println!("    Commitment: {}", commitment.short());
    match mv {
        Some(mv) => println!("    Revealed: {}", mv),
        None => println!("    Revealed: not yet"),
    }
}
