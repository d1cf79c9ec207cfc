//! In-memory store for testing and development

use crate::{
    chunked_stream, ByteRange, ByteStream, Catalog, FileRecord, MemoryCatalog, Result,
    Store, StoreError, READ_CHUNK_SIZE,
};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// An in-memory store
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    catalog: MemoryCatalog,
    blobs: Arc<DashMap<String, Bytes>>,
    chunk_size: usize,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog: MemoryCatalog::new(),
            blobs: Arc::new(DashMap::new()),
            chunk_size: READ_CHUNK_SIZE,
        }
    }

    /// Use a different chunk size for read streams
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Insert a record together with its content
    pub async fn put_file(&self, record: FileRecord, data: impl Into<Bytes>) -> Result<()> {
        let id = record.id.clone();
        self.catalog.insert(record.with_store(&self.name)).await?;
        self.blobs.insert(id, data.into());
        Ok(())
    }

    /// Insert a placeholder record without content
    pub async fn put_record(&self, record: FileRecord) -> Result<()> {
        self.catalog.insert(record.with_store(&self.name)).await
    }

    /// Replace the stored content of a file
    pub fn put_content(&self, file_id: &str, data: impl Into<Bytes>) {
        self.blobs.insert(file_id.to_string(), data.into());
    }

    /// Stored content of a file, if any
    pub fn content(&self, file_id: &str) -> Option<Bytes> {
        self.blobs.get(file_id).map(|entry| entry.value().clone())
    }

    /// Get the number of files with content
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if the store holds no content
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn catalog(&self) -> &dyn Catalog {
        &self.catalog
    }

    async fn open_read_stream(
        &self,
        file_id: &str,
        _record: &FileRecord,
        range: Option<ByteRange>,
    ) -> Result<ByteStream> {
        let data = self
            .content(file_id)
            .ok_or_else(|| StoreError::ContentNotFound(file_id.to_string()))?;

        let data = match range {
            Some(range) => {
                let size = data.len() as u64;
                if range.start >= size {
                    return Err(StoreError::RangeOutOfBounds {
                        start: range.start,
                        end: range.end,
                        size,
                    });
                }
                let end = range.end.min(size - 1);
                data.slice(range.start as usize..=end as usize)
            }
            None => data,
        };

        Ok(chunked_stream(data, self.chunk_size))
    }
}
