use crate::errors::StoreError;
use crate::history::HistoryEntry;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio::fs;
use tracing::error;

/// Key under which the history list is kept.
pub const HISTORY_KEY: &str = "calculationHistory";

/// Durable string key-value storage, the local-storage of this app.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key` in one step.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The history list stored as one JSON array under [`HISTORY_KEY`].
#[derive(Clone)]
pub struct HistoryRepository {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Missing, unreadable or malformed history all load as an empty list.
    pub async fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!("failed to read history: {err}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(err) => {
                error!("failed to parse history: {err}");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored list.
    pub async fn save(&self, history: &[HistoryEntry]) -> Result<(), StoreError> {
        let payload = serde_json::to_string_pretty(history)?;
        self.store.set(HISTORY_KEY, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::calculate;
    use crate::form::{FormField, GatheringForm};
    use chrono::Utc;
    use tempfile::tempdir;

    fn entry() -> HistoryEntry {
        let mut form = GatheringForm::default();
        form.set_field(FormField::Title, "Picnic");
        form.set_field(FormField::Date, "2026-05-02");
        form.set_field(FormField::ParticipantCount, "10");
        form.set_field(FormField::FeePerPerson, "5000");
        form.set_field(FormField::PlatformFeePercent, "2.5");
        HistoryEntry::new(calculate(&form).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn missing_history_loads_empty() {
        let repository = HistoryRepository::new(Arc::new(MemoryStore::default()));
        assert!(repository.load().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_history_loads_empty() {
        let store = Arc::new(MemoryStore::default());
        store.set(HISTORY_KEY, "{not json").await.unwrap();
        let repository = HistoryRepository::new(store.clone());
        assert!(repository.load().await.is_empty());

        store.set(HISTORY_KEY, r#"{"title":"not a list"}"#).await.unwrap();
        assert!(repository.load().await.is_empty());
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let repository = HistoryRepository::new(Arc::new(store.clone()));
        let history = vec![entry()];

        repository.save(&history).await.unwrap();
        assert!(store.path_for(HISTORY_KEY).exists());
        assert!(!store.path_for(HISTORY_KEY).with_extension("json.tmp").exists());
        assert_eq!(repository.load().await, history);

        repository.save(&[]).await.unwrap();
        assert!(repository.load().await.is_empty());
    }

    #[tokio::test]
    async fn file_store_tolerates_corrupt_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path_for(HISTORY_KEY), b"\xff\xfe garbage").unwrap();
        let repository = HistoryRepository::new(Arc::new(store));
        assert!(repository.load().await.is_empty());
    }
}
