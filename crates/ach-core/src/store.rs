//! Persistence collaborators: stored achievement records and the game catalog.

use thiserror::Error;

use crate::achievement::{self, Achievement};
use crate::game::Game;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored record for a game could not be decoded or encoded.
    #[error("invalid achievement record for game {game_id}: {source}")]
    InvalidRecord {
        game_id: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Per-game serialized achievement lists.
///
/// Records are the text produced by [`achievement::encode_list`].
pub trait AchievementStore: Send + Sync {
    fn get_achievement_record(&self, game_id: &str) -> Result<Option<String>, StoreError>;

    fn put_achievement_record(&self, game_id: &str, record: &str) -> Result<(), StoreError>;
}

/// Games installed through the application.
pub trait GameCatalog: Send + Sync {
    /// Looks up a game that has not been deleted.
    fn installed_game(&self, game_id: &str) -> Result<Option<Game>, StoreError>;

    /// Every game that has not been deleted.
    fn installed_games(&self) -> Result<Vec<Game>, StoreError>;
}

/// Loads and decodes a game's stored list.
pub fn load_achievements(
    store: &dyn AchievementStore,
    game_id: &str,
) -> Result<Option<Vec<Achievement>>, StoreError> {
    let Some(record) = store.get_achievement_record(game_id)? else {
        return Ok(None);
    };
    achievement::decode_list(&record)
        .map(Some)
        .map_err(|source| StoreError::InvalidRecord {
            game_id: game_id.to_string(),
            source,
        })
}

/// Encodes and stores a game's list.
pub fn save_achievements(
    store: &dyn AchievementStore,
    game_id: &str,
    achievements: &[Achievement],
) -> Result<(), StoreError> {
    let record = achievement::encode_list(achievements).map_err(|source| StoreError::InvalidRecord {
        game_id: game_id.to_string(),
        source,
    })?;
    store.put_achievement_record(game_id, &record)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, String>>);

    impl AchievementStore for MemoryStore {
        fn get_achievement_record(&self, game_id: &str) -> Result<Option<String>, StoreError> {
            Ok(self.0.lock().unwrap().get(game_id).cloned())
        }

        fn put_achievement_record(&self, game_id: &str, record: &str) -> Result<(), StoreError> {
            self.0
                .lock()
                .unwrap()
                .insert(game_id.to_string(), record.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::default();
        let list = vec![Achievement::locked("A1", "One")];
        save_achievements(&store, "10", &list).unwrap();
        assert_eq!(load_achievements(&store, "10").unwrap(), Some(list));
    }

    #[test]
    fn test_missing_record_loads_as_none() {
        let store = MemoryStore::default();
        assert_eq!(load_achievements(&store, "10").unwrap(), None);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let store = MemoryStore::default();
        store.put_achievement_record("10", "not json").unwrap();
        let err = load_achievements(&store, "10").unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { ref game_id, .. } if game_id == "10"));
    }
}
