//! Canonical achievement metadata lookup.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::achievement::Achievement;
use crate::game::Shop;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metadata in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("metadata provider error: {0}")]
    Provider(String),
}

/// Supplies the canonical, storefront-sourced achievement list for a game.
///
/// Returned achievements are all locked; unlock state is layered on top by
/// merge passes. `Ok(None)` means the game has no known achievements.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn canonical_achievements(
        &self,
        shop: Shop,
        store_game_id: &str,
    ) -> Result<Option<Vec<Achievement>>, MetadataError>;
}
