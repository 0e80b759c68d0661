//! Local video asset handed to a pipeline run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A temporary video file owned by one pipeline run.
///
/// The run deletes the file when it finishes, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Path of the temporary file on local disk
    pub path: PathBuf,
    /// MIME type reported by the uploader (e.g. `video/mp4`)
    pub content_type: String,
    /// Filename as supplied by the caller
    pub original_filename: String,
}

impl VideoAsset {
    /// Create a new asset.
    pub fn new(
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
            original_filename: original_filename.into(),
        }
    }

    /// Build an asset from a path, guessing the content type from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let content_type = content_type_for(&path).to_string();
        Self {
            path,
            content_type,
            original_filename,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}
