//! # UFS Store
//!
//! Storage contract consumed by the UFS upload gateway.
//!
//! This crate provides:
//! - **Store trait**: catalog access plus the four read hooks the gateway calls
//! - **Catalog**: file records and partial updates
//! - **Registry**: name → store lookup
//! - **Backends**: in-memory and local-disk reference stores
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              UFS Gateway                │
//! ├─────────────────────────────────────────┤
//! │     StoreRegistry → Store trait         │
//! ├────────────────────┬────────────────────┤
//! │    MemoryStore     │     DiskStore      │
//! ├────────────────────┴────────────────────┤
//! │        Catalog (records, updates)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ufs_store::{FileRecord, MemoryStore, StoreRegistry};
//!
//! let store = MemoryStore::new("photos");
//! store.put_file(FileRecord::new("abc", "image/png", 3), b"png".to_vec()).await?;
//! let registry = StoreRegistry::new().with_store(store);
//! ```

pub mod catalog;
pub mod disk;
pub mod error;
pub mod memory;
pub mod range;
pub mod record;
pub mod registry;

pub use catalog::{Catalog, MemoryCatalog};
pub use disk::{DiskCatalog, DiskStore};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use range::ByteRange;
pub use record::{FileRecord, FileUpdate};
pub use registry::StoreRegistry;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use http::{request, HeaderMap, StatusCode};
use std::pin::Pin;

/// Chunk size used by the reference backends when streaming content (64 KB)
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Byte stream produced by a store and consumed by the download pipeline
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Outcome of the read authorization hook
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadAccess {
    /// Serve the file
    Allow,
    /// End the response with whatever the hook put in the [`ResponseHead`]
    Deny,
}

/// Response status and headers a read hook may set before the body is sent
#[derive(Clone, Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

/// A named file store.
///
/// Backends implement the catalog and stream opener; the hooks have
/// permissive defaults (allow every read, log read errors, identity
/// transform) so a backend overrides only what it needs.
#[async_trait]
pub trait Store: Send + Sync {
    /// Unique store name, used as the first path segment
    fn name(&self) -> &str;

    /// Metadata catalog
    fn catalog(&self) -> &dyn Catalog;

    /// Validate the hook configuration. An error here is a configuration
    /// error and is reported as 500 by the gateway.
    fn check_hooks(&self) -> Result<()> {
        Ok(())
    }

    /// Open a read stream over the stored content, optionally restricted to
    /// an inclusive byte range
    async fn open_read_stream(
        &self,
        file_id: &str,
        record: &FileRecord,
        range: Option<ByteRange>,
    ) -> Result<ByteStream>;

    /// Read authorization hook
    async fn on_read(
        &self,
        _file_id: &str,
        _record: &FileRecord,
        _request: &request::Parts,
        _response: &mut ResponseHead,
    ) -> ReadAccess {
        ReadAccess::Allow
    }

    /// Called once when streaming a file fails or the client goes away
    fn on_read_error(&self, error: &std::io::Error, file_id: &str, _record: &FileRecord) {
        tracing::error!(store = %self.name(), file_id = %file_id, error = %error, "Read failed");
    }

    /// Rewrite the content on its way out. May also adjust response headers,
    /// which have not been sent yet.
    fn transform_read(
        &self,
        source: ByteStream,
        _file_id: &str,
        _record: &FileRecord,
        _request: &request::Parts,
        _headers: &mut HeaderMap,
    ) -> ByteStream {
        source
    }
}

/// Split an in-memory buffer into a chunked byte stream
pub fn chunked_stream(data: Bytes, chunk_size: usize) -> ByteStream {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<std::io::Result<Bytes>> = (0..data.len())
        .step_by(chunk_size)
        .map(|offset| Ok(data.slice(offset..(offset + chunk_size).min(data.len()))))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}
