//! Key-value store interface.
//!
//! The engine never owns persistence. It consumes a narrow, per-collection store offering
//! put/get/get-by-index/get-all/delete/clear keyed by [`RecordId`]. Each operation is atomic per
//! key; the engine adds no locking on top, so concurrent writers to the same record resolve as
//! last-writer-wins.
//!
//! Two implementations ship with the engine:
//! - [`MemoryStore`] keeps records in process (tests, scratch use).
//! - [`JsonFileStore`] writes one JSON file per record under a sharded directory.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use careguard_uuid::RecordId;
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;

/// A record type that can live in a [`KeyValueStore`] collection.
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the collection holding this record type.
    const COLLECTION: &'static str;

    /// Names accepted by [`KeyValueStore::get_by_index`].
    const INDEXES: &'static [&'static str];

    fn record_id(&self) -> RecordId;

    /// The indexed value of this record, or `None` for an index this type does not define.
    fn index_value(&self, index: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error in collection '{collection}': {source}")]
    Io {
        collection: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise record {id} in '{collection}': {source}")]
    Serialization {
        collection: &'static str,
        id: RecordId,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialise record at {path}: {source}", path = path.display())]
    Deserialization {
        collection: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown index '{index}' on collection '{collection}'")]
    UnknownIndex {
        collection: &'static str,
        index: String,
    },

    #[error("store unavailable for collection '{collection}': {reason}")]
    Unavailable {
        collection: &'static str,
        reason: String,
    },
}

impl StoreError {
    pub fn collection(&self) -> &'static str {
        match self {
            StoreError::Io { collection, .. }
            | StoreError::Serialization { collection, .. }
            | StoreError::Deserialization { collection, .. }
            | StoreError::UnknownIndex { collection, .. }
            | StoreError::Unavailable { collection, .. } => collection,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous per-collection key-value store.
#[async_trait]
pub trait KeyValueStore<T: StoredRecord>: Send + Sync {
    /// Inserts or replaces the record stored under its id.
    async fn put(&self, record: &T) -> StoreResult<()>;

    async fn get_by_id(&self, id: &RecordId) -> StoreResult<Option<T>>;

    async fn get_by_index(&self, index: &str, value: &str) -> StoreResult<Vec<T>>;

    async fn get_all(&self) -> StoreResult<Vec<T>>;

    /// Removes the record if present. Removing an absent id is not an error.
    async fn delete_by_id(&self, id: &RecordId) -> StoreResult<()>;

    async fn clear(&self) -> StoreResult<()>;
}

/// Rejects index names the record type does not declare.
pub(crate) fn check_index<T: StoredRecord>(index: &str) -> StoreResult<()> {
    if T::INDEXES.contains(&index) {
        Ok(())
    } else {
        Err(StoreError::UnknownIndex {
            collection: T::COLLECTION,
            index: index.to_string(),
        })
    }
}

/// Keeps the records whose `index` value equals `value`.
pub(crate) fn select_by_index<T: StoredRecord>(records: Vec<T>, index: &str, value: &str) -> Vec<T> {
    records
        .into_iter()
        .filter(|r| r.index_value(index).as_deref() == Some(value))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Record type and failing store shared by store and service tests.

    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Note {
        pub id: RecordId,
        pub patient_id: String,
        pub body: String,
    }

    impl Note {
        pub fn new(patient_id: &str, body: &str) -> Self {
            Self {
                id: RecordId::new(),
                patient_id: patient_id.into(),
                body: body.into(),
            }
        }
    }

    impl StoredRecord for Note {
        const COLLECTION: &'static str = "notes";
        const INDEXES: &'static [&'static str] = &["patientId"];

        fn record_id(&self) -> RecordId {
            self.id
        }

        fn index_value(&self, index: &str) -> Option<String> {
            match index {
                "patientId" => Some(self.patient_id.clone()),
                _ => None,
            }
        }
    }

    /// A store whose every operation fails, for exercising storage-failure paths.
    pub struct UnavailableStore;

    fn down<T: StoredRecord>() -> StoreError {
        StoreError::Unavailable {
            collection: T::COLLECTION,
            reason: "backend offline".into(),
        }
    }

    #[async_trait]
    impl<T: StoredRecord> KeyValueStore<T> for UnavailableStore {
        async fn put(&self, _record: &T) -> StoreResult<()> {
            Err(down::<T>())
        }

        async fn get_by_id(&self, _id: &RecordId) -> StoreResult<Option<T>> {
            Err(down::<T>())
        }

        async fn get_by_index(&self, _index: &str, _value: &str) -> StoreResult<Vec<T>> {
            Err(down::<T>())
        }

        async fn get_all(&self) -> StoreResult<Vec<T>> {
            Err(down::<T>())
        }

        async fn delete_by_id(&self, _id: &RecordId) -> StoreResult<()> {
            Err(down::<T>())
        }

        async fn clear(&self) -> StoreResult<()> {
            Err(down::<T>())
        }
    }
}
