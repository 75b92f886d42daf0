//! In-process store backed by an ordered map.

use super::{check_index, select_by_index, KeyValueStore, StoreResult, StoredRecord};
use async_trait::async_trait;
use careguard_uuid::RecordId;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Keeps one collection of records in memory.
pub struct MemoryStore<T> {
    records: RwLock<BTreeMap<RecordId, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: StoredRecord> KeyValueStore<T> for MemoryStore<T> {
    async fn put(&self, record: &T) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(record.record_id(), record.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &RecordId) -> StoreResult<Option<T>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_by_index(&self, index: &str, value: &str) -> StoreResult<Vec<T>> {
        check_index::<T>(index)?;
        let all = self.get_all().await?;
        Ok(select_by_index(all, index, value))
    }

    async fn get_all(&self) -> StoreResult<Vec<T>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<()> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::Note;
    use crate::store::StoreError;

    #[tokio::test]
    async fn test_put_get_and_replace() {
        let store: MemoryStore<Note> = MemoryStore::new();
        let mut note = Note::new("p-1", "first");
        store.put(&note).await.unwrap();

        note.body = "second".into();
        store.put(&note).await.unwrap();

        let fetched = store.get_by_id(&note.id).await.unwrap();
        assert_eq!(fetched, Some(note));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_index_filters_and_rejects_unknown_index() {
        let store: MemoryStore<Note> = MemoryStore::new();
        store.put(&Note::new("p-1", "a")).await.unwrap();
        store.put(&Note::new("p-2", "b")).await.unwrap();
        store.put(&Note::new("p-1", "c")).await.unwrap();

        let p1 = store.get_by_index("patientId", "p-1").await.unwrap();
        assert_eq!(p1.len(), 2);
        assert!(p1.iter().all(|n| n.patient_id == "p-1"));

        let err = store.get_by_index("household", "h-1").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownIndex { .. }));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store: MemoryStore<Note> = MemoryStore::new();
        let keep = Note::new("p-1", "keep");
        let drop = Note::new("p-1", "drop");
        store.put(&keep).await.unwrap();
        store.put(&drop).await.unwrap();

        store.delete_by_id(&drop.id).await.unwrap();
        store.delete_by_id(&drop.id).await.unwrap();
        assert_eq!(store.get_by_id(&drop.id).await.unwrap(), None);
        assert!(store.get_by_id(&keep.id).await.unwrap().is_some());

        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
