//! File-backed store: one pretty-printed JSON file per record.
//!
//! Layout for a collection rooted at `<data_dir>/<collection>`:
//!
//! ```text
//! <data_dir>/
//! └── care_events/
//!     └── 55/
//!         └── 0e/
//!             └── 550e8400e29b41d4a716446655440000.json
//! ```
//!
//! Each write goes to its own sibling `<id>.<nonce>.tmp` file which is then renamed over the
//! target, so a reader never observes a half-written record and concurrent writers to one id
//! resolve last-writer-wins.

use super::{check_index, select_by_index, KeyValueStore, StoreError, StoreResult, StoredRecord};
use async_trait::async_trait;
use careguard_uuid::RecordId;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Stores one collection of records as JSON files under a sharded directory tree.
pub struct JsonFileStore<T> {
    root: PathBuf,
    _records: PhantomData<fn() -> T>,
}

fn io_error<T: StoredRecord>(source: std::io::Error) -> StoreError {
    StoreError::Io {
        collection: T::COLLECTION,
        source,
    }
}

impl<T: StoredRecord> JsonFileStore<T> {
    /// Opens (creating if needed) the collection directory for `T` under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the collection directory cannot be created.
    pub async fn open(data_dir: &Path) -> StoreResult<Self> {
        let root = data_dir.join(T::COLLECTION);
        fs::create_dir_all(&root).await.map_err(io_error::<T>)?;
        tracing::debug!("opened {} store at {}", T::COLLECTION, root.display());

        Ok(Self {
            root,
            _records: PhantomData,
        })
    }

    /// The collection directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_file(&self.root, RECORD_EXTENSION)
    }

    /// A temp path unique to one write of `id`.
    fn temp_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_file(&self.root, &format!("{}.{}", RecordId::new(), TEMP_EXTENSION))
    }

    async fn read_record(&self, path: &Path) -> StoreResult<Option<T>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error::<T>(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Deserialization {
                collection: T::COLLECTION,
                path: path.to_path_buf(),
                source,
            })
    }

    /// Lists sub-directories of `dir`, ignoring plain files.
    async fn subdirs(dir: &Path) -> StoreResult<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        let mut entries = fs::read_dir(dir).await.map_err(io_error::<T>)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error::<T>)? {
            if entry.file_type().await.map_err(io_error::<T>)?.is_dir() {
                dirs.push(entry.path());
            }
        }
        Ok(dirs)
    }
}

fn is_record_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(RecordId::is_canonical)
}

/// An in-flight write from [`JsonFileStore::put`].
fn is_temp_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMP_EXTENSION)
}

#[async_trait]
impl<T: StoredRecord> KeyValueStore<T> for JsonFileStore<T> {
    async fn put(&self, record: &T) -> StoreResult<()> {
        let id = record.record_id();
        let path = self.record_path(&id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error::<T>)?;
        }

        let body = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Serialization {
            collection: T::COLLECTION,
            id,
            source,
        })?;

        let tmp = self.temp_path(&id);
        if let Err(e) = fs::write(&tmp, body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error::<T>(e));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(io_error::<T>(e));
        }

        Ok(())
    }

    async fn get_by_id(&self, id: &RecordId) -> StoreResult<Option<T>> {
        self.read_record(&self.record_path(id)).await
    }

    async fn get_by_index(&self, index: &str, value: &str) -> StoreResult<Vec<T>> {
        check_index::<T>(index)?;
        let all = self.get_all().await?;
        Ok(select_by_index(all, index, value))
    }

    async fn get_all(&self) -> StoreResult<Vec<T>> {
        let mut records = Vec::new();
        if !fs::try_exists(&self.root).await.map_err(io_error::<T>)? {
            return Ok(records);
        }

        for s1 in Self::subdirs(&self.root).await? {
            for s2 in Self::subdirs(&s1).await? {
                let mut entries = fs::read_dir(&s2).await.map_err(io_error::<T>)?;
                while let Some(entry) = entries.next_entry().await.map_err(io_error::<T>)? {
                    let path = entry.path();
                    if is_temp_file(&path) {
                        continue;
                    }
                    if !is_record_file(&path) {
                        tracing::warn!(
                            "skipping stray file in {} store: {}",
                            T::COLLECTION,
                            path.display()
                        );
                        continue;
                    }

                    if let Some(record) = self.read_record(&path).await? {
                        records.push(record);
                    }
                }
            }
        }

        records.sort_by_key(|r| r.record_id());
        Ok(records)
    }

    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<()> {
        match fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error::<T>(e)),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error::<T>(e)),
        }
        fs::create_dir_all(&self.root).await.map_err(io_error::<T>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::Note;
    use tempfile::TempDir;

    async fn open_store(temp: &TempDir) -> JsonFileStore<Note> {
        JsonFileStore::open(temp.path())
            .await
            .expect("JsonFileStore::open should succeed")
    }

    #[tokio::test]
    async fn test_put_writes_sharded_json_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp).await;
        let note = Note::new("p-1", "turned to left side");

        store.put(&note).await.expect("put should succeed");

        let id = note.id.to_string();
        let expected = temp
            .path()
            .join("notes")
            .join(&id[0..2])
            .join(&id[2..4])
            .join(format!("{id}.json"));
        assert!(expected.is_file(), "record file should exist at {}", expected.display());
        let shard = std::fs::read_dir(expected.parent().unwrap()).unwrap();
        assert_eq!(shard.count(), 1, "no temp files should be left behind");
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let note = Note::new("p-1", "night check");
        {
            let store = open_store(&temp).await;
            store.put(&note).await.unwrap();
        }

        let reopened = open_store(&temp).await;
        assert_eq!(reopened.get_by_id(&note.id).await.unwrap(), Some(note.clone()));
        assert_eq!(reopened.get_all().await.unwrap(), vec![note]);
    }

    #[tokio::test]
    async fn test_index_delete_and_clear() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp).await;
        let a = Note::new("p-1", "a");
        let b = Note::new("p-2", "b");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        let p2 = store.get_by_index("patientId", "p-2").await.unwrap();
        assert_eq!(p2, vec![b.clone()]);

        store.delete_by_id(&b.id).await.unwrap();
        store.delete_by_id(&b.id).await.expect("deleting twice is not an error");
        assert_eq!(store.get_by_id(&b.id).await.unwrap(), None);

        store.clear().await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_get_all_skips_stray_files_and_reports_corrupt_records() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(&temp).await;
        let note = Note::new("p-1", "ok");
        store.put(&note).await.unwrap();

        let shard = note.id.shard_dir(store.root());
        std::fs::write(shard.join("README.txt"), "not a record").unwrap();
        assert_eq!(store.get_all().await.unwrap().len(), 1);

        let corrupt = RecordId::new().sharded_file(store.root(), "json");
        std::fs::create_dir_all(corrupt.parent().unwrap()).unwrap();
        std::fs::write(&corrupt, "{ not json").unwrap();

        let err = store.get_all().await.expect_err("corrupt record should surface");
        assert!(matches!(err, StoreError::Deserialization { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_of_one_record_keep_it_readable() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let store = std::sync::Arc::new(open_store(&temp).await);
        let id = RecordId::new();

        for round in 0..20 {
            let mut writers = Vec::new();
            for writer in 0..8 {
                let store = store.clone();
                let note = Note {
                    id,
                    patient_id: "p-1".into(),
                    body: format!("round {round} writer {writer} {}", "x".repeat(writer * 64)),
                };
                writers.push(tokio::spawn(async move { store.put(&note).await }));
            }
            for writer in writers {
                writer
                    .await
                    .expect("writer task should not panic")
                    .expect("concurrent put should succeed");
            }

            let stored = store
                .get_by_id(&id)
                .await
                .expect("record should stay readable")
                .expect("record should exist");
            assert!(stored.body.starts_with(&format!("round {round} ")));
        }

        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
