//! Reset command for forgetting a game's stored achievements.

use std::io::Write;

use ach_db::Database;
use anyhow::Result;

/// Deletes the stored list, so the next sync or import starts again from
/// metadata and re-reads every unlock file.
pub fn run<W: Write>(writer: &mut W, db: &Database, game_id: &str) -> Result<()> {
    if db.delete_achievement_record(game_id)? {
        writeln!(writer, "Cleared stored achievements for {game_id}")?;
    } else {
        writeln!(writer, "No achievements stored for {game_id}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn render(db: &Database, game_id: &str) -> String {
        let mut out = Vec::new();
        run(&mut out, db, game_id).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn reset_deletes_stored_record() {
        let db = Database::open_in_memory().unwrap();
        db.put_achievement_record("440", "[]").unwrap();

        assert_snapshot!(render(&db, "440"), @"Cleared stored achievements for 440");
        assert!(db.get_achievement_record("440").unwrap().is_none());
    }

    #[test]
    fn reset_without_record_is_noop() {
        let db = Database::open_in_memory().unwrap();
        assert_snapshot!(render(&db, "440"), @"No achievements stored for 440");
    }
}
