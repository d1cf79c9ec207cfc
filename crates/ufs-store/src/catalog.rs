//! File metadata catalog

use crate::{FileRecord, FileUpdate, Result, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Metadata catalog owned by a store
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Look up a record by file id
    async fn find_by_id(&self, file_id: &str) -> Result<Option<FileRecord>>;

    /// Apply a partial update to an existing record
    async fn update(&self, file_id: &str, update: FileUpdate) -> Result<()>;

    /// Insert a new record
    async fn insert(&self, record: FileRecord) -> Result<()>;
}

/// In-memory catalog
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    records: Arc<DashMap<String, FileRecord>>,
}

impl MemoryCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_by_id(&self, file_id: &str) -> Result<Option<FileRecord>> {
        Ok(self.records.get(file_id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, file_id: &str, update: FileUpdate) -> Result<()> {
        let mut entry = self
            .records
            .get_mut(file_id)
            .ok_or_else(|| StoreError::FileNotFound(file_id.to_string()))?;
        entry.apply(&update);
        Ok(())
    }

    async fn insert(&self, record: FileRecord) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }
}
