//! Local-disk store
//!
//! Content lives at `<root>/<file id>`, records as JSON documents under
//! `<root>/.catalog/<file id>.json`.

use crate::{
    ByteRange, ByteStream, Catalog, FileRecord, FileUpdate, Result, Store, StoreError,
    READ_CHUNK_SIZE,
};
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

const CATALOG_DIR: &str = ".catalog";

/// Reject ids that would escape the store directory
fn checked_id(file_id: &str) -> Result<&str> {
    if file_id.is_empty()
        || file_id == "."
        || file_id == ".."
        || file_id.contains(['/', '\\', '\0'])
    {
        return Err(StoreError::FileNotFound(file_id.to_string()));
    }
    Ok(file_id)
}

/// Catalog persisted as one JSON document per record
pub struct DiskCatalog {
    dir: PathBuf,
    // Serializes read-modify-write cycles of `update`
    write_lock: Mutex<()>,
}

impl DiskCatalog {
    /// Open (and create if needed) a catalog directory
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn record_path(&self, file_id: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", checked_id(file_id)?)))
    }

    async fn write_record(&self, path: &Path, record: &FileRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for DiskCatalog {
    async fn find_by_id(&self, file_id: &str) -> Result<Option<FileRecord>> {
        let path = match self.record_path(file_id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, file_id: &str, update: FileUpdate) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(file_id)?;
        let mut record = self
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| StoreError::FileNotFound(file_id.to_string()))?;
        record.apply(&update);
        self.write_record(&path, &record).await
    }

    async fn insert(&self, record: FileRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(&record.id)?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(record.id));
        }
        self.write_record(&path, &record).await
    }
}

/// A store keeping files in a local directory
pub struct DiskStore {
    name: String,
    root: PathBuf,
    catalog: DiskCatalog,
}

impl DiskStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let catalog = DiskCatalog::open(root.join(CATALOG_DIR)).await?;
        info!(store = %name, root = %root.display(), "Opened disk store");
        Ok(Self {
            name,
            root,
            catalog,
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file's content
    pub fn content_path(&self, file_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(checked_id(file_id)?))
    }

    /// Insert a record together with its content
    pub async fn put_file(&self, record: FileRecord, data: &[u8]) -> Result<()> {
        let path = self.content_path(&record.id)?;
        self.catalog.insert(record.with_store(&self.name)).await?;
        let mut file = File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Insert a placeholder record without content
    pub async fn put_record(&self, record: FileRecord) -> Result<()> {
        self.catalog.insert(record.with_store(&self.name)).await
    }

    /// Move a completed temp file into the store and mark the record complete
    pub async fn finalize_upload(&self, file_id: &str, temp_path: &Path) -> Result<()> {
        let target = self.content_path(file_id)?;
        if self.catalog.find_by_id(file_id).await?.is_none() {
            return Err(StoreError::FileNotFound(file_id.to_string()));
        }

        if let Err(e) = fs::rename(temp_path, &target).await {
            // Temp dir may be on another filesystem
            debug!(file_id = %file_id, error = %e, "Rename failed, copying temp file");
            fs::copy(temp_path, &target).await?;
            fs::remove_file(temp_path).await?;
        }

        self.catalog.update(file_id, FileUpdate::finalized()).await?;
        info!(store = %self.name, file_id = %file_id, "Upload finalized");
        Ok(())
    }
}

#[async_trait]
impl Store for DiskStore {
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
        let path = self.content_path(file_id)?;
        let mut file = OpenOptions::new().read(true).open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::ContentNotFound(file_id.to_string())
            } else {
                e.into()
            }
        })?;

        match range {
            Some(range) => {
                let size = file.metadata().await?.len();
                if range.start >= size {
                    return Err(StoreError::RangeOutOfBounds {
                        start: range.start,
                        end: range.end,
                        size,
                    });
                }
                file.seek(SeekFrom::Start(range.start)).await?;
                let reader = file.take(range.len());
                Ok(Box::pin(ReaderStream::with_capacity(reader, READ_CHUNK_SIZE)))
            }
            None => Ok(Box::pin(ReaderStream::with_capacity(file, READ_CHUNK_SIZE))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::TryStreamExt;

    async fn read_all(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[test_log::test(tokio::test)]
    async fn test_disk_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open("disk", dir.path()).await.unwrap();

        let record = FileRecord::new("f1", "text/plain", 10);
        store.put_file(record.clone(), b"0123456789").await.unwrap();

        let stream = store.open_read_stream("f1", &record, None).await.unwrap();
        assert_eq!(read_all(stream).await, b"0123456789");

        let range = ByteRange::new(3, 5, 10);
        let stream = store.open_read_stream("f1", &record, Some(range)).await.unwrap();
        assert_eq!(read_all(stream).await, b"345");
    }

    #[tokio::test]
    async fn test_disk_catalog_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DiskStore::open("disk", dir.path()).await.unwrap();
            store.put_record(FileRecord::new("f1", "image/png", 4)).await.unwrap();
            store
                .catalog()
                .update("f1", FileUpdate::upload_received(Some(0.5)))
                .await
                .unwrap();
        }

        let reopened = DiskStore::open("disk", dir.path()).await.unwrap();
        let record = reopened.catalog().find_by_id("f1").await.unwrap().unwrap();
        assert_eq!(record.content_type, "image/png");
        assert_eq!(record.progress, Some(0.5));
        assert!(!record.uploading);
    }

    #[tokio::test]
    async fn test_disk_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open("disk", dir.path()).await.unwrap();

        assert!(store.catalog().find_by_id("..").await.unwrap().is_none());
        assert!(store.content_path("../etc").is_err());
        let record = FileRecord::new("..", "text/plain", 1);
        assert!(store.put_record(record).await.is_err());
    }

    #[test_log::test(tokio::test)]
    async fn test_finalize_upload() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let store = DiskStore::open("disk", dir.path()).await.unwrap();
        store.put_record(FileRecord::new("f1", "text/plain", 4)).await.unwrap();

        let temp_path = tmp.path().join("f1");
        fs::write(&temp_path, b"ABCD").await.unwrap();

        store.finalize_upload("f1", &temp_path).await.unwrap();
        assert!(!temp_path.exists());

        let record = store.catalog().find_by_id("f1").await.unwrap().unwrap();
        assert!(record.complete);
        let stream = store.open_read_stream("f1", &record, None).await.unwrap();
        assert_eq!(read_all(stream).await, b"ABCD");
    }

    #[tokio::test]
    async fn test_missing_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open("disk", dir.path()).await.unwrap();
        let record = FileRecord::new("f1", "text/plain", 4);
        store.put_record(record.clone()).await.unwrap();

        let result = store.open_read_stream("f1", &record, None).await;
        assert!(matches!(result, Err(StoreError::ContentNotFound(_))));
    }
}
