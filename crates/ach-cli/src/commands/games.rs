//! Games command for managing the installed game catalog.

use std::io::Write;

use ach_core::{Game, Shop};
use ach_db::Database;
use anyhow::{Result, bail};

pub fn add<W: Write>(writer: &mut W, db: &Database, id: &str, title: &str, shop: Shop) -> Result<()> {
    db.upsert_game(&Game::new(id, shop, title))?;
    writeln!(writer, "Added {title} ({shop} {id})")?;
    Ok(())
}

/// Marks a game deleted. Its stored achievements are kept.
pub fn remove<W: Write>(writer: &mut W, db: &Database, id: &str) -> Result<()> {
    if !db.set_game_deleted(id, true)? {
        bail!("unknown game: {id}");
    }
    writeln!(writer, "Removed {id}")?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let games = db.list_games()?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&games)?)?;
        return Ok(());
    }

    if games.is_empty() {
        writeln!(writer, "No games. Run 'ach games add <id> --title <title>' to add one.")?;
        return Ok(());
    }

    writeln!(writer, "{:<12} {:<6} {:<8} TITLE", "ID", "SHOP", "STATUS")?;
    for game in &games {
        let status = if game.deleted { "deleted" } else { "active" };
        writeln!(
            writer,
            "{:<12} {:<6} {:<8} {}",
            game.object_id, game.shop, status, game.title
        )?;
    }
    Ok(())
}
