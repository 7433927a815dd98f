//! JSON snapshots of collections, one file per collection

use std::path::PathBuf;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::collection::Collection;
use crate::errors::Result;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    directory: PathBuf,
}

impl SnapshotStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.json"))
    }

    /// Load every `*.json` snapshot. Unreadable files are skipped with a warning.
    pub async fn load_all(&self) -> Result<Vec<Collection>> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let mut collections = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Collection>(&bytes) {
                Ok(mut collection) => {
                    collection.reindex();
                    debug!(
                        "Loaded collection {} ({} documents) from {}",
                        collection.name,
                        collection.len(),
                        path.display()
                    );
                    collections.push(collection);
                }
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }

        info!(
            "Loaded {} collection snapshot(s) from {}",
            collections.len(),
            self.directory.display()
        );
        Ok(collections)
    }

    /// Write a snapshot via temp file and rename
    pub async fn save(&self, collection: &Collection) -> Result<()> {
        let bytes = serde_json::to_vec(collection)?;
        let path = self.path_for(&collection.name);
        let partial = self.directory.join(format!("{}.json.part", collection.name));

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, &path).await?;
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let mut collection = Collection::new("card_check", Metadata::new());
        collection
            .upsert(
                vec!["card_0".to_string()],
                vec![vec![0.6, 0.8]],
                vec!["word: 사과 meaning: apple".to_string()],
                vec![Metadata::new()],
            )
            .unwrap();
        store.save(&collection).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "card_check");
        assert_eq!(loaded[0].dimension, Some(2));
        assert_eq!(loaded[0].get("card_0").unwrap().embedding, vec![0.6, 0.8]);
        assert!(!dir.path().join("card_check.json.part").exists());
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.remove("nothing").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
