//! File catalog records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry describing a file's declared type, size and upload state.
///
/// Records are created as placeholders by whoever initiates an upload. The
/// gateway only ever touches `uploading` and `progress` (through
/// [`FileUpdate`]); `size` is the declared size and is authoritative for
/// range math and `Content-Length` regardless of how many bytes are staged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque file id
    pub id: String,
    /// Original file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extension without the leading dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Name of the owning store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Declared MIME type
    #[serde(rename = "type")]
    pub content_type: String,
    /// Declared size in bytes
    pub size: u64,
    /// Upload still in flight
    pub uploading: bool,
    /// Client-reported progress in `[0, 1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Backend finalized the content
    #[serde(default)]
    pub complete: bool,
    /// Set by the backend when finalizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Create a placeholder record for an upload that has not started yet
    pub fn new(id: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            name: None,
            extension: None,
            store: None,
            content_type: content_type.into(),
            size,
            uploading: true,
            progress: None,
            complete: false,
            uploaded_at: None,
        }
    }

    /// Create a placeholder from a file name, guessing the MIME type
    pub fn from_name(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let extension = std::path::Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        Self {
            name: Some(name),
            extension,
            ..Self::new(id, content_type, size)
        }
    }

    /// Set the owning store
    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, update: &FileUpdate) {
        if let Some(uploading) = update.uploading {
            self.uploading = uploading;
        }
        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(complete) = update.complete {
            self.complete = complete;
            if complete {
                self.uploaded_at = Some(Utc::now());
            }
        }
    }
}

/// Partial record update. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub uploading: Option<bool>,
    pub progress: Option<f64>,
    pub complete: Option<bool>,
}

impl FileUpdate {
    /// Update issued when an upload request body has been fully received
    pub fn upload_received(progress: Option<f64>) -> Self {
        Self {
            uploading: Some(false),
            progress,
            complete: None,
        }
    }

    /// Update issued by a backend once the content is finalized
    pub fn finalized() -> Self {
        Self {
            uploading: Some(false),
            progress: Some(1.0),
            complete: Some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Holiday.JPG", "image/jpeg", "jpg")]
    #[case("notes.txt", "text/plain", "txt")]
    #[case("song.mp3", "audio/mpeg", "mp3")]
    #[case("clip.mp4", "video/mp4", "mp4")]
    fn test_from_name_guesses_type(
        #[case] name: &str,
        #[case] content_type: &str,
        #[case] extension: &str,
    ) {
        let record = FileRecord::from_name("abc", name, 42);
        assert_eq!(record.content_type, content_type);
        assert_eq!(record.extension.as_deref(), Some(extension));
        assert!(record.uploading);
        assert_eq!(record.size, 42);
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let record = FileRecord::from_name("abc", "blob", 1);
        assert_eq!(record.content_type, "application/octet-stream");
        assert_eq!(record.extension, None);
    }

    #[test]
    fn test_apply_leaves_unset_fields() {
        let mut record = FileRecord::new("abc", "text/plain", 10);
        record.progress = Some(0.5);

        record.apply(&FileUpdate::upload_received(None));
        assert!(!record.uploading);
        assert_eq!(record.progress, Some(0.5));
        assert!(!record.complete);

        record.apply(&FileUpdate::finalized());
        assert!(record.complete);
        assert!(record.uploaded_at.is_some());
    }

    #[test]
    fn test_type_field_name() {
        let record = FileRecord::new("abc", "text/plain", 3);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "text/plain");
        assert!(json.get("progress").is_none());
    }
}
