//! Sync command for a one-shot merge pass over a game's unlock files.

use std::io::Write;

use ach_watch::AchievementObserver;
use anyhow::Result;

pub async fn run<W: Write>(writer: &mut W, observer: &AchievementObserver, game_id: &str) -> Result<()> {
    let Some(set) = observer.sync_game(game_id).await? else {
        writeln!(
            writer,
            "Nothing to sync for {game_id}: game not installed or no achievement metadata."
        )?;
        return Ok(());
    };

    writeln!(
        writer,
        "{game_id}: {}/{} unlocked, {} new",
        set.unlocked_count(),
        set.all.len(),
        set.newly_unlocked.len()
    )?;
    for achievement in &set.newly_unlocked {
        writeln!(writer, "  + {} {}", achievement.id, achievement.title)?;
    }
    Ok(())
}
