//! Locating cracker unlock files from per-cracker path conventions.
//!
//! Every cracker keeps one directory per game under a fixed base directory,
//! with the unlock file at one of a few fixed paths below it:
//!
//! ```text
//! <base>/<game id>/<relative file>
//! ```
//!
//! Paths are built whether or not the file exists yet; a player may not have
//! unlocked anything so far. Existence is the caller's concern.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cracker::{AchievementFile, Cracker};

/// Store ids whose games also write unlock files under sibling ids.
const ALTERNATIVE_GAME_IDS: &[(&str, &[&str])] = &[
    // Dishonored
    ("205100", &["205100", "217980", "31292"]),
];

/// Platform directories that cracker base directories hang off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Shared public documents (`C:\Users\Public\Documents` on Windows).
    pub public_documents: PathBuf,
    /// Roaming application data.
    pub app_data: PathBuf,
}

impl Roots {
    pub fn new(public_documents: impl Into<PathBuf>, app_data: impl Into<PathBuf>) -> Self {
        Self {
            public_documents: public_documents.into(),
            app_data: app_data.into(),
        }
    }

    /// Native Windows locations.
    #[cfg(windows)]
    pub fn platform_default() -> Self {
        let app_data = dirs::config_dir().unwrap_or_else(|| PathBuf::from(r"C:\Users\Default\AppData\Roaming"));
        Self::new(r"C:\Users\Public\Documents", app_data)
    }

    /// Locations inside the default Wine prefix (`~/.wine`).
    #[cfg(not(windows))]
    pub fn platform_default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let user = home
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let users = home.join(".wine").join("drive_c").join("users");
        Self::new(
            users.join("Public").join("Documents"),
            users.join(user).join("AppData").join("Roaming"),
        )
    }
}

impl Default for Roots {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// All store ids whose unlock directories belong to `game_id`.
pub fn alternative_game_ids(game_id: &str) -> Vec<&str> {
    ALTERNATIVE_GAME_IDS
        .iter()
        .find(|(id, _)| *id == game_id)
        .map_or_else(|| vec![game_id], |(_, ids)| ids.to_vec())
}

/// Candidate unlock file paths below a game's directory.
pub const fn relative_files(cracker: Cracker) -> &'static [&'static [&'static str]] {
    match cracker {
        Cracker::Codex | Cracker::Rune => &[&["achievements.ini"]],
        Cracker::OnlineFix => &[&["Stats", "Achievements.ini"], &["Achievements.ini"]],
        Cracker::Goldberg => &[&["achievements.json"]],
    }
}

/// Resolves unlock file locations for every cracker.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    roots: Roots,
}

impl Locator {
    pub const fn new(roots: Roots) -> Self {
        Self { roots }
    }

    pub const fn roots(&self) -> &Roots {
        &self.roots
    }

    /// Base directories that hold one subdirectory per game.
    pub fn base_dirs(&self, cracker: Cracker) -> Vec<PathBuf> {
        let public = &self.roots.public_documents;
        let app_data = &self.roots.app_data;
        match cracker {
            Cracker::Codex => vec![
                public.join("Steam").join("CODEX"),
                app_data.join("Steam").join("CODEX"),
            ],
            Cracker::Rune => vec![public.join("Steam").join("RUNE")],
            Cracker::OnlineFix => vec![public.join("OnlineFix")],
            Cracker::Goldberg => vec![
                app_data.join("Goldberg SteamEmu Saves"),
                app_data.join("GSE Saves"),
            ],
        }
    }

    /// Candidate unlock file paths for a game under one base directory.
    pub fn file_paths(cracker: Cracker, base: &Path, game_id: &str) -> Vec<PathBuf> {
        relative_files(cracker)
            .iter()
            .map(|parts| {
                let mut path = base.join(game_id);
                for part in *parts {
                    path.push(part);
                }
                path
            })
            .collect()
    }

    /// Unlock files for one cracker, keyed by game id.
    ///
    /// Only game directories that exist under a base directory are reported;
    /// a missing base directory contributes nothing. When `game_id` is given,
    /// its alternative ids are matched too and reported under `game_id`.
    pub fn locate(
        &self,
        cracker: Cracker,
        game_id: Option<&str>,
    ) -> BTreeMap<String, Vec<AchievementFile>> {
        let mut found: BTreeMap<String, Vec<AchievementFile>> = BTreeMap::new();
        let wanted = game_id.map(alternative_game_ids);

        for base in self.base_dirs(cracker) {
            let entries = match fs::read_dir(&base) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::debug!(cracker = %cracker, base = ?base, error = %err, "skipping base directory");
                    continue;
                }
            };

            for entry in entries.filter_map(std::result::Result::ok) {
                if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                    continue;
                }
                let Some(dir_name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };

                let key = match (&wanted, game_id) {
                    (Some(ids), Some(requested)) => {
                        if !ids.contains(&dir_name.as_str()) {
                            continue;
                        }
                        requested.to_string()
                    }
                    _ => dir_name.clone(),
                };

                found.entry(key).or_default().extend(
                    Self::file_paths(cracker, &base, &dir_name)
                        .into_iter()
                        .map(|path| AchievementFile::new(cracker, path)),
                );
            }
        }

        for files in found.values_mut() {
            files.sort();
            files.dedup();
        }
        found
    }

    /// Unlock files for every cracker, keyed by game id.
    pub fn locate_all(&self, game_id: Option<&str>) -> BTreeMap<String, Vec<AchievementFile>> {
        let mut found: BTreeMap<String, Vec<AchievementFile>> = BTreeMap::new();
        for cracker in Cracker::ALL {
            for (id, files) in self.locate(cracker, game_id) {
                found.entry(id).or_default().extend(files);
            }
        }
        for files in found.values_mut() {
            files.sort();
        }
        found
    }

    /// Unlock files for one game across every cracker.
    pub fn locate_game(&self, game_id: &str) -> Vec<AchievementFile> {
        self.locate_all(Some(game_id))
            .remove(game_id)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(temp: &Path) -> Locator {
        Locator::new(Roots::new(temp.join("public"), temp.join("appdata")))
    }

    fn mkdir(path: &Path) {
        fs::create_dir_all(path).unwrap();
    }

    #[test]
    fn test_missing_base_directory_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let locator = locator(temp.path());
        for cracker in Cracker::ALL {
            assert!(locator.locate(cracker, None).is_empty());
        }
    }

    #[test]
    fn test_paths_are_built_without_the_file_existing() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("public/OnlineFix/440"));
        let found = locator(temp.path()).locate(Cracker::OnlineFix, None);

        let files = &found["440"];
        assert_eq!(files.len(), 2);
        assert_eq!(
            files[1].path,
            temp.path().join("public/OnlineFix/440/Stats/Achievements.ini")
        );
        assert!(files.iter().all(|f| !f.exists()));
    }

    #[test]
    fn test_onlinefix_flat_layout_is_located() {
        let temp = tempfile::tempdir().unwrap();
        let game_dir = temp.path().join("public/OnlineFix/440");
        mkdir(&game_dir);
        fs::write(game_dir.join("Achievements.ini"), "[A1]\nachieved=true\n").unwrap();

        let files = locator(temp.path()).locate_game("440");
        let existing: Vec<_> = files.iter().filter(|f| f.exists()).collect();

        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].cracker, Cracker::OnlineFix);
        assert_eq!(existing[0].path, game_dir.join("Achievements.ini"));
    }

    #[test]
    fn test_all_games_are_enumerated() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("appdata/Goldberg SteamEmu Saves/10"));
        mkdir(&temp.path().join("appdata/GSE Saves/20"));
        fs::write(temp.path().join("appdata/GSE Saves/settings.txt"), "").unwrap();

        let found = locator(temp.path()).locate(Cracker::Goldberg, None);
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["10", "20"]);
        assert_eq!(
            found["20"][0].path,
            temp.path().join("appdata/GSE Saves/20/achievements.json")
        );
    }

    #[test]
    fn test_requested_game_filters_results() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("public/Steam/CODEX/10"));
        mkdir(&temp.path().join("public/Steam/CODEX/20"));
        mkdir(&temp.path().join("appdata/Steam/CODEX/20"));

        let found = locator(temp.path()).locate(Cracker::Codex, Some("20"));
        assert_eq!(found.len(), 1);
        assert_eq!(found["20"].len(), 2);
    }

    #[test]
    fn test_alternative_ids_report_under_requested_id() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("public/Steam/RUNE/217980"));

        let found = locator(temp.path()).locate(Cracker::Rune, Some("205100"));
        assert_eq!(
            found["205100"][0].path,
            temp.path().join("public/Steam/RUNE/217980/achievements.ini")
        );
    }

    #[test]
    fn test_locate_game_spans_crackers_in_stable_order() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("appdata/GSE Saves/7"));
        mkdir(&temp.path().join("public/OnlineFix/7"));
        mkdir(&temp.path().join("public/Steam/CODEX/7"));

        let files = locator(temp.path()).locate_game("7");
        let crackers: Vec<_> = files.iter().map(|f| f.cracker).collect();
        assert_eq!(
            crackers,
            vec![Cracker::Codex, Cracker::OnlineFix, Cracker::OnlineFix, Cracker::Goldberg]
        );
    }

    #[test]
    fn test_unrequested_game_returns_empty() {
        let temp = tempfile::tempdir().unwrap();
        mkdir(&temp.path().join("public/Steam/CODEX/10"));
        assert!(locator(temp.path()).locate_game("99").is_empty());
    }

    #[test]
    fn test_alternative_ids_default_to_self() {
        assert_eq!(alternative_game_ids("440"), vec!["440"]);
        assert_eq!(alternative_game_ids("205100").len(), 3);
    }
}
