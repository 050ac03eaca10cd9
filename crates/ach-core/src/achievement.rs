//! Canonical achievement records and merge-pass output.

use serde::{Deserialize, Serialize};

/// A canonical achievement with its current unlock state.
///
/// Created locked by a metadata provider. Only the adapter flips `achieved`,
/// and only from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub global_unlock_percent: f64,
    #[serde(default)]
    pub achieved: bool,
    /// Unlock time as reported by the cracker.
    #[serde(default)]
    pub unlock_time_epoch_ms: i64,
    #[serde(default)]
    pub current_progress: i64,
    #[serde(default)]
    pub max_progress: i64,
}

impl Achievement {
    /// A locked achievement with only an id and display title.
    pub fn locked(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            image_url: String::new(),
            global_unlock_percent: 0.0,
            achieved: false,
            unlock_time_epoch_ms: 0,
            current_progress: 0,
            max_progress: 0,
        }
    }
}

/// Output of one merge pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementSet {
    /// The full updated list, same order as the input list.
    pub all: Vec<Achievement>,
    /// Achievements that went from locked to unlocked in this pass only.
    pub newly_unlocked: Vec<Achievement>,
}

impl AchievementSet {
    pub const fn unchanged(all: Vec<Achievement>) -> Self {
        Self {
            all,
            newly_unlocked: Vec::new(),
        }
    }

    pub fn has_new_unlocks(&self) -> bool {
        !self.newly_unlocked.is_empty()
    }

    pub fn unlocked_count(&self) -> usize {
        self.all.iter().filter(|a| a.achieved).count()
    }
}

/// Serializes an achievement list into its stored text form.
pub fn encode_list(achievements: &[Achievement]) -> Result<String, serde_json::Error> {
    serde_json::to_string(achievements)
}

/// Parses a stored achievement list.
pub fn decode_list(record: &str) -> Result<Vec<Achievement>, serde_json::Error> {
    serde_json::from_str(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_list_uses_camel_case_keys() {
        let mut achievement = Achievement::locked("A1", "First Blood");
        achievement.global_unlock_percent = 12.5;
        achievement.achieved = true;
        achievement.unlock_time_epoch_ms = 1_700_000_000;

        let encoded = encode_list(&[achievement]).unwrap();
        insta::assert_snapshot!(encoded, @r#"[{"id":"A1","title":"First Blood","description":"","imageUrl":"","globalUnlockPercent":12.5,"achieved":true,"unlockTimeEpochMs":1700000000,"currentProgress":0,"maxProgress":0}]"#);
    }

    #[test]
    fn test_decode_fills_missing_fields_with_defaults() {
        let decoded = decode_list(r#"[{"id":"A1","title":"First Blood"}]"#).unwrap();
        assert_eq!(decoded, vec![Achievement::locked("A1", "First Blood")]);
    }

    #[test]
    fn test_decode_rejects_non_list() {
        assert!(decode_list(r#"{"id":"A1"}"#).is_err());
    }

    #[test]
    fn test_unlocked_count() {
        let mut unlocked = Achievement::locked("A1", "");
        unlocked.achieved = true;
        let set = AchievementSet::unchanged(vec![unlocked, Achievement::locked("A2", "")]);
        assert_eq!(set.unlocked_count(), 1);
        assert!(!set.has_new_unlocks());
    }
}
