//! Folding a cracker's unlock record into the canonical achievement list.

use crate::achievement::{Achievement, AchievementSet};
use crate::parse::{GoldbergEntry, OnlineFixEntry, SteamEmuEntry, UnlockRecord, entry_key};

/// Applies one unlock record to a copy of the canonical list.
///
/// Already-achieved entries are never touched, so applying the same record a
/// second time yields the same `all` and an empty `newly_unlocked`.
pub fn extract_unlocks(record: &UnlockRecord, canonical: &[Achievement]) -> AchievementSet {
    let mut all = canonical.to_vec();
    let newly_unlocked = apply_unlocks(record, &mut all);
    AchievementSet {
        all,
        newly_unlocked,
    }
}

/// In-place variant used by the merge engine. Returns the entries that were
/// flipped to achieved.
pub(crate) fn apply_unlocks(
    record: &UnlockRecord,
    achievements: &mut [Achievement],
) -> Vec<Achievement> {
    let mut newly_unlocked = Vec::new();

    for achievement in achievements.iter_mut().filter(|a| !a.achieved) {
        let key = entry_key(&achievement.id);
        let unlocked = match record {
            UnlockRecord::Codex(entries) | UnlockRecord::Rune(entries) => entries
                .get(&key)
                .is_some_and(|entry| apply_steam_emu(achievement, entry)),
            UnlockRecord::OnlineFix(entries) => entries
                .get(&key)
                .is_some_and(|entry| apply_online_fix(achievement, entry)),
            UnlockRecord::Goldberg(entries) => entries
                .get(&key)
                .is_some_and(|entry| apply_goldberg(achievement, entry)),
        };

        if unlocked {
            newly_unlocked.push(achievement.clone());
        }
    }

    newly_unlocked
}

fn apply_steam_emu(achievement: &mut Achievement, entry: &SteamEmuEntry) -> bool {
    if !entry.achieved {
        return false;
    }
    achievement.achieved = true;
    if let Some(time) = entry.unlock_time {
        achievement.unlock_time_epoch_ms = time;
    }
    if let Some(current) = entry.cur_progress {
        achievement.current_progress = current;
    }
    if let Some(max) = entry.max_progress {
        achievement.max_progress = max;
    }
    true
}

fn apply_online_fix(achievement: &mut Achievement, entry: &OnlineFixEntry) -> bool {
    if !entry.achieved {
        return false;
    }
    achievement.achieved = true;
    if let Some(time) = entry.timestamp {
        achievement.unlock_time_epoch_ms = time;
    }
    true
}

fn apply_goldberg(achievement: &mut Achievement, entry: &GoldbergEntry) -> bool {
    if !entry.earned {
        return false;
    }
    achievement.achieved = true;
    if let Some(time) = entry.earned_time {
        achievement.unlock_time_epoch_ms = time;
    }
    true
}
