//! Local file naming for downloaded media.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Validate a provider media id for use as a file name.
///
/// Returns an error if the id contains path traversal patterns or separators.
pub fn sanitize_media_id(id: &str) -> Result<String> {
    // Reject path traversal attempts
    if id.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            id
        )));
    }

    if id.contains('/') || id.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in media id: '{}'",
            id
        )));
    }

    if id.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in media id: '{}'",
            id
        )));
    }

    let sanitized: String = id
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Media id cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Append an extension to a base path: `tmp/xyz` + `gif` → `tmp/xyz.gif`.
///
/// Unlike [`Path::with_extension`], a dot already present in the base name is kept.
pub fn append_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Unique in-progress download path next to the final base path.
pub fn temp_download_path(base: &Path) -> PathBuf {
    append_extension(base, &format!("{}.part", uuid::Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_media_id_valid() {
        assert_eq!(sanitize_media_id("xyz").unwrap(), "xyz");
        assert_eq!(sanitize_media_id("a:b").unwrap(), "a_b");
        assert_eq!(sanitize_media_id("LazyWeeGoat").unwrap(), "LazyWeeGoat");
    }

    #[test]
    fn test_sanitize_media_id_rejects_paths() {
        assert!(sanitize_media_id("../etc/passwd").is_err());
        assert!(sanitize_media_id("gallery/xyz").is_err());
        assert!(sanitize_media_id("..\\evil").is_err());
        assert!(sanitize_media_id("nul\0byte").is_err());
        assert!(sanitize_media_id("  ").is_err());
    }

    #[test]
    fn test_append_extension() {
        assert_eq!(
            append_extension(Path::new("tmp/xyz"), "gif"),
            PathBuf::from("tmp/xyz.gif")
        );
        assert_eq!(
            append_extension(Path::new("tmp/v1.2"), "mp4"),
            PathBuf::from("tmp/v1.2.mp4")
        );
    }

    #[test]
    fn test_temp_download_path_is_unique() {
        let base = Path::new("tmp/xyz");
        let a = temp_download_path(base);
        let b = temp_download_path(base);

        assert_ne!(a, b);
        assert!(a.to_string_lossy().starts_with("tmp/xyz."));
        assert!(a.to_string_lossy().ends_with(".part"));
    }
}
