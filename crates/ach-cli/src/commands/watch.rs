//! Watch command: observe unlock files until interrupted.

use std::io::Write;

use ach_watch::AchievementObserver;
use anyhow::{Context, Result};

/// Starts observers for `games` (every installed game when empty) and
/// stops them all on Ctrl-C.
pub async fn run<W: Write>(writer: &mut W, observer: &AchievementObserver, games: &[String]) -> Result<()> {
    let started = if games.is_empty() {
        observer.watch_all_installed_games().await?
    } else {
        let mut started = 0;
        for game_id in games {
            if observer.start_observing(game_id).await? {
                started += 1;
            }
        }
        started
    };

    for game_id in observer.active_games() {
        let files = observer.watched_file_count(&game_id).unwrap_or_default();
        writeln!(writer, "{game_id}: watching {files} file(s)")?;
    }
    writeln!(writer, "Watching {started} game(s). Press Ctrl-C to stop.")?;
    writer.flush()?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::debug!("interrupted");

    let stopped = observer.stop_all().await;
    writeln!(writer, "Stopped {stopped} observer(s).")?;
    Ok(())
}
