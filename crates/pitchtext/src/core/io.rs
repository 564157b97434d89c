//! File reading helpers.
//!
//! I/O failures are returned as `PitchtextError::Io`. Batch extraction turns them into
//! per-file placeholders like any other failure.

use crate::{PitchtextError, Result};
use std::path::Path;
use tokio::fs;

pub async fn read_file_async(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(path.as_ref()).await.map_err(PitchtextError::Io)
}

pub fn read_file_sync(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(PitchtextError::Io)
}

pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// # Errors
///
/// `Validation` if the path does not exist.
pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    if !file_exists(&path) {
        return Err(PitchtextError::validation(format!(
            "File does not exist: {}",
            path.as_ref().display()
        )));
    }
    Ok(())
}

/// Reject files larger than `max_size` bytes without reading them.
///
/// # Errors
///
/// `Io` if the file metadata cannot be read, `Validation` if it is too large.
pub async fn validate_file_size(path: impl AsRef<Path>, max_size: u64) -> Result<()> {
    let path = path.as_ref();
    let size = fs::metadata(path).await.map_err(PitchtextError::Io)?.len();
    ensure_within_limit(size, max_size, &path.display().to_string())
}

pub(crate) fn ensure_within_limit(size: u64, max_size: u64, what: &str) -> Result<()> {
    if size > max_size {
        return Err(PitchtextError::validation(format!(
            "{} is {} bytes, larger than the {} byte limit",
            what, size, max_size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_file_async() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"deck").unwrap();

        let bytes = read_file_async(file.path()).await.unwrap();
        assert_eq!(bytes, b"deck");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_file_sync("/nonexistent/deck.pptx");
        assert!(matches!(result, Err(PitchtextError::Io(_))));
    }

    #[test]
    fn test_validate_file_exists() {
        let file = NamedTempFile::new().unwrap();
        assert!(validate_file_exists(file.path()).is_ok());
        assert!(matches!(
            validate_file_exists("/nonexistent/deck.pptx"),
            Err(PitchtextError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_file_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 32]).unwrap();

        assert!(validate_file_size(file.path(), 32).await.is_ok());
        let err = validate_file_size(file.path(), 31).await.unwrap_err();
        assert!(matches!(err, PitchtextError::Validation { .. }));
        assert!(err.to_string().contains("31 byte limit"));
    }
}
