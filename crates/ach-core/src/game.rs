//! Installed games known to the application.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storefront a game was acquired from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Shop {
    #[default]
    Steam,
    Epic,
}

impl Shop {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::Epic => "epic",
        }
    }
}

impl fmt::Display for Shop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Shop {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "steam" => Ok(Self::Steam),
            "epic" => Ok(Self::Epic),
            _ => Err(format!("invalid shop: {s}")),
        }
    }
}

/// An installed game.
///
/// `object_id` is the storefront id, which is also the directory name
/// crackers use for the game's unlock files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub object_id: String,
    pub shop: Shop,
    pub title: String,
    #[serde(default)]
    pub deleted: bool,
}

impl Game {
    pub fn new(object_id: impl Into<String>, shop: Shop, title: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            shop,
            title: title.into(),
            deleted: false,
        }
    }
}
