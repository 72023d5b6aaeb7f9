//! Fixed media-type table.

use reelsync_core::UploadError;
use std::path::Path;

const MEDIA_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("txt", "text/plain"),
    ("srt", "text/plain"),
    ("log", "text/plain"),
];

/// Resolve the media type of a file from its extension (case-insensitive).
pub fn media_type_for(path: &Path) -> Result<&'static str, UploadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    MEDIA_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, media_type)| *media_type)
        .ok_or_else(|| UploadError::UnsupportedFileType {
            path: path.to_path_buf(),
            extension,
        })
}
