//! Show command for printing a game's stored achievements.

use std::io::Write;

use ach_core::Achievement;
use ach_core::achievement::decode_list;
use ach_db::Database;
use anyhow::{Context, Result};

pub fn run<W: Write>(writer: &mut W, db: &Database, game_id: &str, json: bool) -> Result<()> {
    let Some(record) = db.get_achievement_record(game_id)? else {
        writeln!(
            writer,
            "No achievements stored for {game_id}. Run 'ach sync {game_id}' first."
        )?;
        return Ok(());
    };
    let achievements = decode_list(&record.achievements)
        .with_context(|| format!("stored achievements for {game_id} are corrupt"))?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&achievements)?)?;
        return Ok(());
    }

    let title = db
        .get_game(game_id)?
        .map_or_else(|| game_id.to_string(), |game| format!("{} ({game_id})", game.title));
    write_list(writer, &title, &achievements)
}

fn write_list<W: Write>(writer: &mut W, title: &str, achievements: &[Achievement]) -> Result<()> {
    let unlocked = achievements.iter().filter(|a| a.achieved).count();
    writeln!(writer, "{title}: {unlocked}/{} unlocked", achievements.len())?;

    for achievement in achievements {
        let mark = if achievement.achieved { "x" } else { " " };
        write!(writer, "[{mark}] {:<16} {}", achievement.id, achievement.title)?;
        if achievement.achieved && achievement.unlock_time_epoch_ms > 0 {
            write!(writer, " (unlocked at {})", achievement.unlock_time_epoch_ms)?;
        }
        if achievement.max_progress > 0 {
            write!(
                writer,
                " [{}/{}]",
                achievement.current_progress, achievement.max_progress
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ach_core::achievement::encode_list;
    use ach_core::{Game, Shop};
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn show_lists_unlock_state() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_game(&Game::new("440", Shop::Steam, "Team Fortress 2"))
            .unwrap();

        let mut first = Achievement::locked("A1", "First Blood");
        first.achieved = true;
        first.unlock_time_epoch_ms = 1_700_000_000;
        let mut marathon = Achievement::locked("A2", "Marathon");
        marathon.current_progress = 3;
        marathon.max_progress = 10;
        db.put_achievement_record("440", &encode_list(&[first, marathon]).unwrap())
            .unwrap();

        let mut out = Vec::new();
        run(&mut out, &db, "440", false).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Team Fortress 2 (440): 1/2 unlocked
        [x] A1               First Blood (unlocked at 1700000000)
        [ ] A2               Marathon [3/10]
        ");
    }

    #[test]
    fn show_without_record_hints_at_sync() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        run(&mut out, &db, "440", false).unwrap();
        assert_snapshot!(
            String::from_utf8(out).unwrap(),
            @"No achievements stored for 440. Run 'ach sync 440' first."
        );
    }

    #[test]
    fn show_rejects_corrupt_record() {
        let db = Database::open_in_memory().unwrap();
        db.put_achievement_record("440", "not json").unwrap();
        let err = run(&mut Vec::new(), &db, "440", false).unwrap_err();
        assert_eq!(err.to_string(), "stored achievements for 440 are corrupt");
    }
}
