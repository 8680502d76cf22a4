//! Reconciliation state store
//!
//! The store holds every managed entry for one reconciliation pass and
//! round-trips applied state through a [`StateBackend`]. Only entries that
//! are both desired and materialized are persisted: a crash mid-creation
//! simply retries creation next pass instead of recording a half-applied
//! entry.

use crate::entry::ManagedEntry;
use async_trait::async_trait;
use lockstep_types::{ConfigurationId, EntryRecord};
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// State store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no managed entry for {0}")]
    NotFound(ConfigurationId),

    #[error("state storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("state format failure: {0}")]
    Format(#[from] serde_json::Error),
}

/// Persistence medium for applied state.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Load all persisted records. Absent state (first run) is `None`, not
    /// an error.
    async fn load(&self) -> Result<Option<Vec<EntryRecord>>, StoreError>;

    /// Replace the persisted records with exactly `records`.
    async fn save(&self, records: &[EntryRecord]) -> Result<(), StoreError>;
}

/// In-memory backend for tests and development.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<Option<Vec<EntryRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the currently persisted records.
    pub fn records(&self) -> Option<Vec<EntryRecord>> {
        self.records.read().clone()
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Vec<EntryRecord>>, StoreError> {
        Ok(self.records.read().clone())
    }

    async fn save(&self, records: &[EntryRecord]) -> Result<(), StoreError> {
        *self.records.write() = Some(records.to_vec());
        Ok(())
    }
}

/// File backend persisting records as one JSON document.
///
/// Saves go through a temp file plus rename, so a pass lands either the old
/// state or the new state on disk, never a torn write.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl StateBackend for JsonFileBackend {
    async fn load(&self) -> Result<Option<Vec<EntryRecord>>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, records: &[EntryRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// The collection of managed entries for one reconciliation pass.
///
/// Exclusively owned by that pass: entries are reconciled in order, and the
/// store is saved exactly once at the end.
pub struct StateStore {
    backend: Arc<dyn StateBackend>,
    entries: Vec<ManagedEntry>,
}

impl StateStore {
    /// Load the persisted entries through `backend`.
    pub async fn load(backend: Arc<dyn StateBackend>) -> Result<Self, StoreError> {
        let records = backend.load().await?.unwrap_or_default();
        debug!(entries = records.len(), "loaded reconciliation state");
        let entries = records.into_iter().map(ManagedEntry::from_record).collect();
        Ok(Self { backend, entries })
    }

    /// Persist every entry that is both desired and materialized. Entries
    /// pending deletion or never successfully created are dropped.
    pub async fn save(&self) -> Result<(), StoreError> {
        let records: Vec<EntryRecord> = self
            .entries
            .iter()
            .filter(|entry| entry.is_persistable())
            .filter_map(ManagedEntry::record)
            .collect();
        debug!(entries = records.len(), "saving reconciliation state");
        self.backend.save(&records).await
    }

    pub fn contains(&self, configuration_id: &ConfigurationId) -> bool {
        self.entries
            .iter()
            .any(|entry| &entry.configuration_id == configuration_id)
    }

    /// Look an entry up by its stable configuration id.
    pub fn get_mut(
        &mut self,
        configuration_id: &ConfigurationId,
    ) -> Result<&mut ManagedEntry, StoreError> {
        self.entries
            .iter_mut()
            .find(|entry| &entry.configuration_id == configuration_id)
            .ok_or_else(|| StoreError::NotFound(configuration_id.clone()))
    }

    pub fn push(&mut self, entry: ManagedEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManagedEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> std::slice::IterMut<'_, ManagedEntry> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_types::{AnswerMap, ExternalId};
    use serde_json::json;

    fn record(id: &str, external: &str) -> EntryRecord {
        EntryRecord {
            platform: "p1".into(),
            external_id: ExternalId::new(external),
            configuration_id: ConfigurationId::new(id),
            last_config: Some(vec![AnswerMap::from([(
                "host".to_string(),
                json!("1.2.3.4"),
            )])]),
            last_options: None,
        }
    }

    #[tokio::test]
    async fn test_load_absent_state_is_empty() {
        let store = StateStore::load(Arc::new(MemoryBackend::new())).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_filters_unmaterialized_entries() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store = StateStore::load(backend.clone()).await.unwrap();

        // Desired and materialized: persisted.
        let mut kept = ManagedEntry::from_record(record("a", "e1"));
        kept.desired_config = Some(vec![]);
        store.push(kept);

        // Pending deletion: dropped.
        store.push(ManagedEntry::from_record(record("b", "e2")));

        // Never created: dropped.
        let mut pending = ManagedEntry::new("p1", ConfigurationId::new("c"));
        pending.desired_config = Some(vec![]);
        store.push(pending);

        store.save().await.unwrap();

        let saved = backend.records().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].configuration_id, ConfigurationId::new("a"));
    }

    #[tokio::test]
    async fn test_store_round_trip_preserves_applied_state() {
        let backend = Arc::new(MemoryBackend::new());
        backend.save(&[record("a", "e1")]).await.unwrap();

        let mut store = StateStore::load(backend).await.unwrap();
        assert_eq!(store.len(), 1);

        let entry = store.get_mut(&ConfigurationId::new("a")).unwrap();
        assert_eq!(entry.platform, "p1");
        assert_eq!(entry.external_id, Some(ExternalId::new("e1")));
        assert_eq!(entry.last_config.as_ref().map(Vec::len), Some(1));
        assert!(entry.desired_config.is_none());
        assert!(entry.desired_options.is_none());
    }

    #[tokio::test]
    async fn test_get_mut_miss_is_not_found() {
        let mut store = StateStore::load(Arc::new(MemoryBackend::new())).await.unwrap();
        let err = store.get_mut(&ConfigurationId::new("missing")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("state.json"));

        assert!(backend.load().await.unwrap().is_none());

        backend.save(&[record("a", "e1")]).await.unwrap();
        let loaded = backend.load().await.unwrap().unwrap();
        assert_eq!(loaded, vec![record("a", "e1")]);

        // Overwrite, don't append.
        backend.save(&[record("b", "e2")]).await.unwrap();
        let loaded = backend.load().await.unwrap().unwrap();
        assert_eq!(loaded, vec![record("b", "e2")]);
    }

    #[tokio::test]
    async fn test_file_backend_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested/deeper/state.json"));
        backend.save(&[]).await.unwrap();
        assert_eq!(backend.load().await.unwrap(), Some(vec![]));
    }
}
