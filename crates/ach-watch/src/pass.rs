//! One parse, merge and persist pass.

use ach_core::store::{load_achievements, save_achievements};
use ach_core::{Achievement, AchievementFile, AchievementSet, AchievementStore, merge_files};
use tokio_util::sync::CancellationToken;

use crate::error::ObserverError;

/// Runs blocking file or store work off the async workers.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ObserverError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await?)
}

/// Merges `files` into the game's stored list and persists any new unlocks.
///
/// The stored record is re-read first so unlocks written by another file's
/// task are kept; `fallback` is used only when nothing is stored. Nothing is
/// written once `token` is cancelled.
pub(crate) fn merge_pass(
    store: &dyn AchievementStore,
    game_id: &str,
    fallback: &[Achievement],
    files: &[AchievementFile],
    token: &CancellationToken,
) -> Result<AchievementSet, ObserverError> {
    let baseline = match load_achievements(store, game_id)? {
        Some(stored) if !stored.is_empty() => stored,
        _ => fallback.to_vec(),
    };

    let set = merge_files(&baseline, files);
    if !set.has_new_unlocks() {
        tracing::debug!(game_id, files = files.len(), "no new unlocks");
        return Ok(set);
    }
    if token.is_cancelled() {
        tracing::debug!(game_id, "observer stopped, discarding pass");
        return Ok(set);
    }

    save_achievements(store, game_id, &set.all)?;
    log_unlocks(game_id, &set.newly_unlocked);
    Ok(set)
}

pub(crate) fn log_unlocks(game_id: &str, unlocked: &[Achievement]) {
    for achievement in unlocked {
        tracing::info!(
            game_id,
            achievement = %achievement.id,
            title = %achievement.title,
            unlock_time = achievement.unlock_time_epoch_ms,
            "achievement unlocked"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;

    use ach_core::{Cracker, StoreError};

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, String>>,
        writes: Mutex<usize>,
    }

    impl AchievementStore for MemoryStore {
        fn get_achievement_record(&self, game_id: &str) -> Result<Option<String>, StoreError> {
            Ok(self.records.lock().unwrap().get(game_id).cloned())
        }

        fn put_achievement_record(&self, game_id: &str, record: &str) -> Result<(), StoreError> {
            *self.writes.lock().unwrap() += 1;
            self.records
                .lock()
                .unwrap()
                .insert(game_id.to_string(), record.to_string());
            Ok(())
        }
    }

    fn codex_file(dir: &std::path::Path, body: &str) -> AchievementFile {
        let path = dir.join("achievements.ini");
        fs::write(&path, body).unwrap();
        AchievementFile::new(Cracker::Codex, path)
    }

    #[test]
    fn test_new_unlocks_are_persisted() {
        let temp = tempfile::tempdir().unwrap();
        let file = codex_file(temp.path(), "[A1]\nAchieved=1\nUnlockTime=1700000000\n");
        let store = MemoryStore::default();
        let canonical = vec![Achievement::locked("A1", "First"), Achievement::locked("A2", "Second")];

        let set = merge_pass(&store, "10", &canonical, &[file], &CancellationToken::new()).unwrap();

        assert_eq!(set.newly_unlocked.len(), 1);
        let stored = load_achievements(&store, "10").unwrap().unwrap();
        assert!(stored[0].achieved);
        assert!(!stored[1].achieved);
    }

    #[test]
    fn test_stored_unlocks_are_not_regressed() {
        let temp = tempfile::tempdir().unwrap();
        let file = codex_file(temp.path(), "[A2]\nAchieved=1\n");
        let store = MemoryStore::default();
        let mut stored = vec![Achievement::locked("A1", "First"), Achievement::locked("A2", "Second")];
        stored[0].achieved = true;
        save_achievements(&store, "10", &stored).unwrap();

        let fallback = vec![Achievement::locked("A1", "First"), Achievement::locked("A2", "Second")];
        merge_pass(&store, "10", &fallback, &[file], &CancellationToken::new()).unwrap();

        let after = load_achievements(&store, "10").unwrap().unwrap();
        assert!(after.iter().all(|a| a.achieved));
    }

    #[test]
    fn test_nothing_written_without_new_unlocks() {
        let temp = tempfile::tempdir().unwrap();
        let file = codex_file(temp.path(), "[A1]\nAchieved=0\n");
        let store = MemoryStore::default();

        merge_pass(
            &store,
            "10",
            &[Achievement::locked("A1", "First")],
            &[file],
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[test]
    fn test_cancelled_pass_does_not_write() {
        let temp = tempfile::tempdir().unwrap();
        let file = codex_file(temp.path(), "[A1]\nAchieved=1\n");
        let store = MemoryStore::default();
        let token = CancellationToken::new();
        token.cancel();

        let set = merge_pass(&store, "10", &[Achievement::locked("A1", "First")], &[file], &token).unwrap();

        assert!(set.has_new_unlocks());
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }
}
