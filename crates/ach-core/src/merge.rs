//! Merging several unlock files for the same game into one pass result.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::achievement::{Achievement, AchievementSet};
use crate::adapter::apply_unlocks;
use crate::cracker::AchievementFile;
use crate::parse::{UnlockRecord, read_unlock_file};

/// Folds records into the canonical list in the order given.
///
/// `newly_unlocked` accumulates across records and holds each achievement id
/// at most once.
pub fn merge_records<'a>(
    canonical: &[Achievement],
    records: impl IntoIterator<Item = &'a UnlockRecord>,
) -> AchievementSet {
    let mut all = canonical.to_vec();
    let mut seen = HashSet::new();
    let mut newly_unlocked = Vec::new();

    for record in records {
        for achievement in apply_unlocks(record, &mut all) {
            if seen.insert(achievement.id.clone()) {
                newly_unlocked.push(achievement);
            }
        }
    }

    AchievementSet {
        all,
        newly_unlocked,
    }
}

/// Reads every file and merges the results in `(cracker, path)` order.
///
/// Files are parsed in parallel; missing or malformed files contribute
/// nothing to the pass.
pub fn merge_files(canonical: &[Achievement], files: &[AchievementFile]) -> AchievementSet {
    let mut files = files.to_vec();
    files.sort();
    files.dedup();

    let records: Vec<Option<UnlockRecord>> = files.par_iter().map(read_unlock_file).collect();
    merge_records(canonical, records.iter().flatten())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cracker::Cracker;
    use crate::parse::parse_unlock_text;

    fn canonical(ids: &[&str]) -> Vec<Achievement> {
        ids.iter().map(|id| Achievement::locked(*id, *id)).collect()
    }

    #[test]
    fn test_same_unlock_in_two_files_is_counted_once() {
        let codex = parse_unlock_text(Cracker::Codex, "[A1]\nAchieved=1\nUnlockTime=10\n").unwrap();
        let goldberg = parse_unlock_text(
            Cracker::Goldberg,
            r#"{"A1": {"earned": true, "earned_time": 20}}"#,
        )
        .unwrap();

        let set = merge_records(&canonical(&["A1", "A2"]), [&codex, &goldberg]);

        assert_eq!(set.newly_unlocked.len(), 1);
        assert_eq!(set.newly_unlocked[0].id, "A1");
        // First file in fold order wins the unlock time.
        assert_eq!(set.all[0].unlock_time_epoch_ms, 10);
    }

    #[test]
    fn test_unlocks_from_different_files_accumulate() {
        let codex = parse_unlock_text(Cracker::Codex, "[A1]\nAchieved=1\n").unwrap();
        let onlinefix = parse_unlock_text(Cracker::OnlineFix, "[A2]\nachieved=1\n").unwrap();

        let set = merge_records(&canonical(&["A1", "A2", "A3"]), [&codex, &onlinefix]);

        let ids: Vec<_> = set.newly_unlocked.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2"]);
        assert_eq!(set.unlocked_count(), 2);
    }

    #[test]
    fn test_order_of_all_is_preserved() {
        let record = parse_unlock_text(Cracker::Codex, "[B]\nAchieved=1\n").unwrap();
        let set = merge_records(&canonical(&["C", "B", "A"]), [&record]);
        let ids: Vec<_> = set.all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_repeated_passes_never_regress() {
        let unlocked = parse_unlock_text(Cracker::Codex, "[A1]\nAchieved=1\n").unwrap();
        let relocked = parse_unlock_text(Cracker::Codex, "[A1]\nAchieved=0\n").unwrap();

        let mut list = canonical(&["A1"]);
        for record in [&unlocked, &relocked, &relocked, &unlocked] {
            list = merge_records(&list, [record]).all;
            assert!(list[0].achieved);
        }
    }

    #[test]
    fn test_merge_files_skips_missing_and_malformed() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("good.json");
        let bad = temp.path().join("bad.ini");
        fs::write(&good, r#"{"A1": {"earned": true, "earned_time": 1700000000}}"#).unwrap();
        fs::write(&bad, "Achieved=1\n").unwrap();

        let files = vec![
            AchievementFile::new(Cracker::Goldberg, &good),
            AchievementFile::new(Cracker::Codex, &bad),
            AchievementFile::new(Cracker::Rune, temp.path().join("missing.ini")),
        ];
        let set = merge_files(&canonical(&["A1"]), &files);

        assert_eq!(set.newly_unlocked.len(), 1);
        assert_eq!(set.all[0].unlock_time_epoch_ms, 1_700_000_000);
    }

    #[test]
    fn test_merge_files_folds_in_cracker_order() {
        let temp = tempfile::tempdir().unwrap();
        let json = temp.path().join("achievements.json");
        let ini = temp.path().join("achievements.ini");
        fs::write(&json, r#"{"A1": {"earned": true, "earned_time": 2}}"#).unwrap();
        fs::write(&ini, "[A1]\nAchieved=1\nUnlockTime=1\n").unwrap();

        // Goldberg listed first, but Codex sorts ahead of it.
        let files = vec![
            AchievementFile::new(Cracker::Goldberg, &json),
            AchievementFile::new(Cracker::Codex, &ini),
        ];
        let set = merge_files(&canonical(&["A1"]), &files);
        assert_eq!(set.all[0].unlock_time_epoch_ms, 1);
    }
}
