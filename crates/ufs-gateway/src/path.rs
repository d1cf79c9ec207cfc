//! Request path parsing
//!
//! Paths are matched after the configured gateway prefix is stripped:
//!
//! ```text
//! OPTIONS, POST   /{store}/{fileId}
//! GET             /{store}/{fileId}[.{ext}][/{fileName}]
//! ```
//!
//! Segments are non-empty and never contain `/` or `?`.

/// A path addressing one file in one store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePath {
    pub store: String,
    pub file_id: String,
    /// Cosmetic extension stripped from the id segment (GET only)
    pub extension: Option<String>,
    /// Trailing file name segment, percent-decoded (GET only)
    pub file_name: Option<String>,
}

/// Remainder of `path` after the gateway prefix, or `None` when the path is
/// outside the gateway's namespace
pub fn strip_gateway_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    rest.starts_with('/').then_some(rest)
}

fn segments(rest: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = rest.strip_prefix('/')?.split('/').collect();
    parts
        .iter()
        .all(|s| !s.is_empty() && !s.contains('?'))
        .then_some(parts)
}

/// Match `/{store}/{fileId}` (OPTIONS and POST)
pub fn parse_upload_path(rest: &str) -> Option<FilePath> {
    match segments(rest)?.as_slice() {
        [store, file_id] => Some(FilePath {
            store: store.to_string(),
            file_id: file_id.to_string(),
            extension: None,
            file_name: None,
        }),
        _ => None,
    }
}

/// Match `/{store}/{fileId}[.{ext}][/{fileName}]` (GET).
///
/// Everything after the first `.` of the id segment is the extension and is
/// not part of the id.
pub fn parse_download_path(rest: &str) -> Option<FilePath> {
    let (store, id_segment, file_name) = match segments(rest)?.as_slice() {
        [store, id] => (*store, *id, None),
        [store, id, name] => (*store, *id, Some(*name)),
        _ => return None,
    };

    let (file_id, extension) = match id_segment.split_once('.') {
        Some((id, ext)) => (id, Some(ext.to_string())),
        None => (id_segment, None),
    };

    let file_name = file_name.map(|name| {
        urlencoding::decode(name)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| name.to_string())
    });

    Some(FilePath {
        store: store.to_string(),
        file_id: file_id.to_string(),
        extension,
        file_name,
    })
}
