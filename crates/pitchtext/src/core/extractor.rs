//! Extraction entry points.
//!
//! Single documents go through MIME detection, the size limit and the extractor registry.
//! Batches run the same path concurrently and return results in input order, with a
//! placeholder in the slot of every file that failed for a document-level reason.
//!
//! - [`extract_file`] / [`extract_bytes`] / [`extract_named_bytes`]
//! - [`batch_extract_file`] / [`batch_extract_bytes`]
//! - `*_sync` wrappers backed by a shared runtime

use crate::core::config::ExtractionConfig;
use crate::plugins::DocumentExtractor;
use crate::types::{ErrorMetadata, ExtractionResult, Metadata};
use crate::{PitchtextError, Result};
use once_cell::sync::Lazy;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runtime shared by the sync wrappers.
///
/// Creation only fails when the process is out of threads or memory, in which case
/// nothing else would work either.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

fn get_extractor(mime_type: &str) -> Result<Arc<dyn DocumentExtractor>> {
    let registry = crate::plugins::registry::get_document_extractor_registry();
    let registry_read = registry
        .read()
        .map_err(|e| PitchtextError::LockPoisoned(format!("Document extractor registry lock poisoned: {}", e)))?;
    registry_read.get(mime_type)
}

/// Extract text from a file.
///
/// The MIME type is taken from `mime_type` when given and detected from the extension
/// otherwise.
///
/// # Errors
///
/// - `Validation` if the file does not exist or exceeds `config.max_file_size`
/// - `UnsupportedFormat` for extensions or MIME types without an extractor
/// - `CorruptContainer` / `Parsing` when the document itself is unreadable
/// - `Io` for file system failures
///
/// # Example
///
/// ```rust,no_run
/// use pitchtext::{ExtractionConfig, extract_file};
///
/// # async fn example() -> pitchtext::Result<()> {
/// let result = extract_file("deck.pptx", None, &ExtractionConfig::default()).await?;
/// println!("{}", result.content);
/// # Ok(())
/// # }
/// ```
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(config, path),
    fields(
        extraction.path = %path.as_ref().display(),
    )
))]
pub async fn extract_file(
    path: impl AsRef<Path>,
    mime_type: Option<&str>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    use crate::core::{io, mime};

    let path = path.as_ref();

    io::validate_file_exists(path)?;

    let detected_mime = mime::detect_or_validate(Some(path), mime_type)?;

    io::validate_file_size(path, config.max_file_size).await?;

    crate::extractors::ensure_initialized()?;
    let extractor = get_extractor(&detected_mime)?;
    extractor.extract_file(path, &detected_mime, config).await
}

/// Extract text from bytes of a known MIME type.
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(config, content),
    fields(
        extraction.mime_type = mime_type,
        extraction.size_bytes = content.len(),
    )
))]
pub async fn extract_bytes(content: &[u8], mime_type: &str, config: &ExtractionConfig) -> Result<ExtractionResult> {
    use crate::core::{io, mime};

    let validated_mime = mime::validate_mime_type(mime_type)?;

    io::ensure_within_limit(content.len() as u64, config.max_file_size, "Input")?;

    crate::extractors::ensure_initialized()?;
    let extractor = get_extractor(&validated_mime)?;
    extractor.extract_bytes(content, &validated_mime, config).await
}

/// Extract text from bytes, dispatching on the extension of `file_name`.
///
/// The name is only used for its extension; nothing is read from disk.
pub async fn extract_named_bytes(
    content: &[u8],
    file_name: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let mime_type = crate::core::mime::detect_mime_type(file_name, false)?;
    extract_bytes(content, &mime_type, config).await
}

/// Placeholder standing in for a file that failed to extract.
pub fn error_placeholder(error: &PitchtextError) -> ExtractionResult {
    ExtractionResult {
        content: format!("Error: {}", error),
        mime_type: "text/plain".to_string(),
        metadata: Metadata {
            error: Some(ErrorMetadata {
                error_type: error.kind().to_string(),
                message: error.to_string(),
            }),
            ..Default::default()
        },
    }
}

/// Run one extraction future per input, at most `config.concurrency()` at a time, and
/// reassemble the results in input order.
async fn run_batch<I, F, Fut>(inputs: Vec<I>, config: &ExtractionConfig, extract: F) -> Result<Vec<ExtractionResult>>
where
    I: Send + 'static,
    F: Fn(I, Arc<ExtractionConfig>) -> Fut,
    Fut: Future<Output = Result<ExtractionResult>> + Send + 'static,
{
    if inputs.is_empty() {
        return Ok(vec![]);
    }

    let config = Arc::new(config.clone());
    let semaphore = Arc::new(Semaphore::new(config.concurrency()));

    let mut tasks = JoinSet::new();

    for (index, input) in inputs.into_iter().enumerate() {
        let semaphore_clone = Arc::clone(&semaphore);
        let future = extract(input, Arc::clone(&config));

        tasks.spawn(async move {
            let _permit = match semaphore_clone.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (index, Err(PitchtextError::Other(format!("Batch semaphore closed: {}", e)))),
            };
            let result = crate::core::batch_mode::with_batch_mode(future).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<ExtractionResult>> = vec![None; tasks.len()];

    while let Some(task_result) = tasks.join_next().await {
        match task_result {
            Ok((index, Ok(result))) => {
                results[index] = Some(result);
            }
            Ok((index, Err(e))) => {
                tracing::warn!("Batch item {} failed: {}", index, e);
                results[index] = Some(error_placeholder(&e));
            }
            Err(join_err) => {
                // The slot stays empty and is filled below.
                tracing::warn!("Batch task panicked: {}", join_err);
            }
        }
    }

    Ok(results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            result.unwrap_or_else(|| {
                error_placeholder(&PitchtextError::Other(format!("Task panicked while extracting item {}", index)))
            })
        })
        .collect())
}

/// Extract many files concurrently, returning results in input order.
///
/// # Errors
///
/// Per-file failures never fail the batch, including I/O errors and panicked tasks. Each
/// becomes a placeholder whose `metadata.error` names the failure.
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(config, paths),
    fields(
        extraction.batch_size = paths.len(),
    )
))]
pub async fn batch_extract_file(
    paths: Vec<impl AsRef<Path>>,
    config: &ExtractionConfig,
) -> Result<Vec<ExtractionResult>> {
    let paths: Vec<_> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
    run_batch(paths, config, |path, config| async move {
        extract_file(&path, None, &config).await
    })
    .await
}

/// Extract many `(bytes, mime_type)` inputs concurrently, returning results in input order.
#[cfg_attr(feature = "otel", tracing::instrument(
    skip(config, contents),
    fields(
        extraction.batch_size = contents.len(),
    )
))]
pub async fn batch_extract_bytes(
    contents: Vec<(&[u8], &str)>,
    config: &ExtractionConfig,
) -> Result<Vec<ExtractionResult>> {
    let owned_contents: Vec<(Vec<u8>, String)> = contents
        .into_iter()
        .map(|(bytes, mime)| (bytes.to_vec(), mime.to_string()))
        .collect();

    run_batch(owned_contents, config, |(bytes, mime_type), config| async move {
        extract_bytes(&bytes, &mime_type, &config).await
    })
    .await
}

/// Blocking wrapper for [`extract_file`].
pub fn extract_file_sync(
    path: impl AsRef<Path>,
    mime_type: Option<&str>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_file(path, mime_type, config))
}

/// Blocking wrapper for [`extract_bytes`].
pub fn extract_bytes_sync(content: &[u8], mime_type: &str, config: &ExtractionConfig) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_bytes(content, mime_type, config))
}

/// Blocking wrapper for [`batch_extract_file`].
pub fn batch_extract_file_sync(
    paths: Vec<impl AsRef<Path>>,
    config: &ExtractionConfig,
) -> Result<Vec<ExtractionResult>> {
    GLOBAL_RUNTIME.block_on(batch_extract_file(paths, config))
}

/// Blocking wrapper for [`batch_extract_bytes`].
pub fn batch_extract_bytes_sync(
    contents: Vec<(&[u8], &str)>,
    config: &ExtractionConfig,
) -> Result<Vec<ExtractionResult>> {
    GLOBAL_RUNTIME.block_on(batch_extract_bytes(contents, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mime::{MARKDOWN_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    #[serial]
    async fn test_extract_file_plain_text() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"Seed round: $2M\n").unwrap();

        let result = extract_file(&file_path, None, &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(result.content, "Seed round: $2M");
        assert_eq!(result.mime_type, PLAIN_TEXT_MIME_TYPE);
    }

    #[tokio::test]
    #[serial]
    async fn test_extract_file_missing() {
        let result = extract_file("/nonexistent/deck.pptx", None, &ExtractionConfig::default()).await;
        assert!(matches!(result, Err(PitchtextError::Validation { .. })));
    }

    #[tokio::test]
    #[serial]
    async fn test_extract_file_unsupported_extension() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("logo.png");
        File::create(&file_path).unwrap();

        let result = extract_file(&file_path, None, &ExtractionConfig::default()).await;
        assert!(matches!(result, Err(PitchtextError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_extract_bytes_size_limit() {
        let config = ExtractionConfig {
            max_file_size: 4,
            ..Default::default()
        };
        let result = extract_bytes(b"too long", PLAIN_TEXT_MIME_TYPE, &config).await;
        assert!(matches!(result, Err(PitchtextError::Validation { .. })));

        let result = extract_bytes(b"ok", PLAIN_TEXT_MIME_TYPE, &config).await.unwrap();
        assert_eq!(result.content, "ok");
    }

    #[tokio::test]
    #[serial]
    async fn test_extract_named_bytes_uses_extension() {
        let result = extract_named_bytes(b"# Vision", "README.md", &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(result.mime_type, MARKDOWN_MIME_TYPE);

        let result = extract_named_bytes(b"x", "deck.key", &ExtractionConfig::default()).await;
        assert!(matches!(result, Err(PitchtextError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_batch_extract_bytes_keeps_order_and_placeholders() {
        let contents: Vec<(&[u8], &str)> = vec![
            (b"first", PLAIN_TEXT_MIME_TYPE),
            (b"second", "image/png"),
            (b"third", PLAIN_TEXT_MIME_TYPE),
        ];

        let results = batch_extract_bytes(contents, &ExtractionConfig::default()).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "first");
        assert!(results[1].is_error());
        assert_eq!(results[1].content, "Error: Unsupported format: image/png");
        assert_eq!(
            results[1].metadata.error.as_ref().unwrap().error_type,
            "UnsupportedFormat"
        );
        assert_eq!(results[2].content, "third");
    }

    #[tokio::test]
    #[serial]
    async fn test_batch_extract_file_missing_file_is_placeholder() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "here").unwrap();
        let missing = dir.path().join("missing.txt");

        let results = batch_extract_file(vec![&present, &missing], &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(results[0].content, "here");
        assert_eq!(results[1].metadata.error.as_ref().unwrap().error_type, "Validation");
    }

    #[tokio::test]
    #[serial]
    async fn test_batch_extract_file_unreadable_file_is_placeholder() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.txt");
        std::fs::write(&first, "first").unwrap();
        let directory = dir.path().join("b.txt");
        std::fs::create_dir(&directory).unwrap();
        let last = dir.path().join("c.txt");
        std::fs::write(&last, "last").unwrap();

        let results = batch_extract_file(vec![&first, &directory, &last], &ExtractionConfig::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "first");
        assert!(results[1].content.starts_with("Error: "));
        assert_eq!(results[1].metadata.error.as_ref().unwrap().error_type, "Io");
        assert_eq!(results[2].content, "last");
    }

    #[tokio::test]
    async fn test_batch_empty() {
        let results = batch_extract_bytes(vec![], &ExtractionConfig::default()).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    #[serial]
    fn test_sync_wrappers() {
        let result = extract_bytes_sync(b"sync", PLAIN_TEXT_MIME_TYPE, &ExtractionConfig::default()).unwrap();
        assert_eq!(result.content, "sync");

        let results =
            batch_extract_bytes_sync(vec![(b"a".as_slice(), PLAIN_TEXT_MIME_TYPE)], &ExtractionConfig::default())
                .unwrap();
        assert_eq!(results[0].content, "a");
    }
}
