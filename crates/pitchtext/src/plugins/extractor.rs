//! Document extractor plugin trait.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::plugins::Plugin;
use crate::types::ExtractionResult;
use async_trait::async_trait;
use std::path::Path;

/// Turns document bytes of one or more MIME types into text.
///
/// Registering an extractor for a MIME type that is already served replaces the
/// current extractor for that type.
///
/// # Example
///
/// ```rust
/// use pitchtext::plugins::{DocumentExtractor, Plugin};
/// use pitchtext::types::{ExtractionResult, Metadata};
/// use pitchtext::{ExtractionConfig, Result};
/// use async_trait::async_trait;
///
/// struct UpperCaseText;
///
/// impl Plugin for UpperCaseText {
///     fn name(&self) -> &str { "upper-case-text" }
///     fn version(&self) -> String { "1.0.0".to_string() }
///     fn initialize(&self) -> Result<()> { Ok(()) }
///     fn shutdown(&self) -> Result<()> { Ok(()) }
/// }
///
/// #[async_trait]
/// impl DocumentExtractor for UpperCaseText {
///     async fn extract_bytes(&self, content: &[u8], mime_type: &str, _config: &ExtractionConfig)
///         -> Result<ExtractionResult> {
///         let text = String::from_utf8_lossy(content).to_uppercase();
///         Ok(ExtractionResult::from_text(text, mime_type, Metadata::default()))
///     }
///
///     fn supported_mime_types(&self) -> &[&str] {
///         &["text/x-shout"]
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentExtractor: Plugin {
    /// Extract text from bytes.
    ///
    /// # Errors
    ///
    /// Primary-content failures are errors (`CorruptContainer`, `Parsing`). Failures in
    /// auxiliary content such as drawings or comments are logged and skipped.
    async fn extract_bytes(
        &self,
        content: &[u8],
        mime_type: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult>;

    /// Extract text from a file. Reads the file and delegates to `extract_bytes`.
    async fn extract_file(&self, path: &Path, mime_type: &str, config: &ExtractionConfig) -> Result<ExtractionResult> {
        use crate::core::io;
        let bytes = io::read_file_async(path).await?;
        self.extract_bytes(&bytes, mime_type, config).await
    }

    fn supported_mime_types(&self) -> &[&str];
}
