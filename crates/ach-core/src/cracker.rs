//! Cracker identifiers and the unlock files they maintain.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unlock-file convention in use for a game install.
///
/// Ordering is significant: merge passes fold files in `(cracker, path)`
/// order, so the declaration order here is the tie-breaker across crackers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cracker {
    Codex,
    Rune,
    OnlineFix,
    Goldberg,
}

/// On-disk encoding of an unlock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `[section]` headers followed by `key=value` lines.
    Sectioned,
    /// A single JSON object.
    Structured,
}

impl Cracker {
    pub const ALL: [Self; 4] = [Self::Codex, Self::Rune, Self::OnlineFix, Self::Goldberg];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Rune => "rune",
            Self::OnlineFix => "onlinefix",
            Self::Goldberg => "goldberg",
        }
    }

    #[must_use]
    pub const fn encoding(self) -> Encoding {
        match self {
            Self::Codex | Self::Rune | Self::OnlineFix => Encoding::Sectioned,
            Self::Goldberg => Encoding::Structured,
        }
    }
}

impl fmt::Display for Cracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Cracker {
    type Err = UnknownCracker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "codex" => Ok(Self::Codex),
            "rune" => Ok(Self::Rune),
            "onlinefix" | "online-fix" | "online_fix" => Ok(Self::OnlineFix),
            "goldberg" => Ok(Self::Goldberg),
            _ => Err(UnknownCracker(s.to_string())),
        }
    }
}

impl Serialize for Cracker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Cracker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown cracker strings.
#[derive(Debug, Clone)]
pub struct UnknownCracker(String);

impl fmt::Display for UnknownCracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown cracker: {}", self.0)
    }
}

impl std::error::Error for UnknownCracker {}

/// One concrete unlock file to watch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AchievementFile {
    pub cracker: Cracker,
    pub path: PathBuf,
}

impl AchievementFile {
    pub fn new(cracker: Cracker, path: impl Into<PathBuf>) -> Self {
        Self {
            cracker,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}
