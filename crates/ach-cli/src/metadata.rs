//! File-backed achievement metadata.

use std::io;
use std::path::{Path, PathBuf};

use ach_core::{Achievement, MetadataError, MetadataProvider, Shop};
use async_trait::async_trait;
use serde::Deserialize;

/// One entry of a metadata file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    global_unlock_percent: f64,
}

impl From<MetadataEntry> for Achievement {
    fn from(entry: MetadataEntry) -> Self {
        Self {
            description: entry.description,
            image_url: entry.image_url,
            global_unlock_percent: entry.global_unlock_percent,
            ..Self::locked(entry.id, entry.title)
        }
    }
}

/// Reads canonical lists from `<root>/<shop>/<store id>.json`.
#[derive(Debug, Clone)]
pub struct MetadataDir {
    root: PathBuf,
}

impl MetadataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, shop: Shop, store_game_id: &str) -> PathBuf {
        self.root
            .join(shop.as_str())
            .join(format!("{store_game_id}.json"))
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

#[async_trait]
impl MetadataProvider for MetadataDir {
    async fn canonical_achievements(
        &self,
        shop: Shop,
        store_game_id: &str,
    ) -> Result<Option<Vec<Achievement>>, MetadataError> {
        if !is_plain_id(store_game_id) {
            return Err(MetadataError::Provider(format!(
                "invalid store id: {store_game_id:?}"
            )));
        }

        let path = self.path_for(shop, store_game_id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = ?path, "no metadata file");
                return Ok(None);
            }
            Err(source) => return Err(MetadataError::Io { path, source }),
        };

        let entries: Vec<MetadataEntry> = serde_json::from_str(&text)
            .map_err(|source| MetadataError::Invalid {
                path: path.clone(),
                source,
            })?;
        Ok(Some(entries.into_iter().map(Achievement::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_metadata(root: &Path, shop: &str, id: &str, body: &str) {
        let dir = root.join(shop);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{id}.json")), body).unwrap();
    }

    #[tokio::test]
    async fn test_reads_locked_achievements() {
        let temp = tempfile::tempdir().unwrap();
        write_metadata(
            temp.path(),
            "steam",
            "440",
            r#"[{"id": "A1", "title": "First Blood", "description": "Win a round",
                 "imageUrl": "https://cdn.example/a1.jpg", "globalUnlockPercent": 41.5}]"#,
        );

        let list = MetadataDir::new(temp.path())
            .canonical_achievements(Shop::Steam, "440")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "First Blood");
        assert_eq!(list[0].image_url, "https://cdn.example/a1.jpg");
        assert!((list[0].global_unlock_percent - 41.5).abs() < f64::EPSILON);
        assert!(!list[0].achieved);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let temp = tempfile::tempdir().unwrap();
        let result = MetadataDir::new(temp.path())
            .canonical_achievements(Shop::Epic, "440")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        write_metadata(temp.path(), "steam", "440", "{not json");

        let err = MetadataDir::new(temp.path())
            .canonical_achievements(Shop::Steam, "440")
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let err = MetadataDir::new(temp.path())
            .canonical_achievements(Shop::Steam, "../secrets")
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Provider(_)));
    }
}
