//! Plain text, Markdown and CSV extractor.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::mime::{CSV_MIME_TYPE, MARKDOWN_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};
use crate::extraction::text::decode_text_bytes;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtractionResult, FormatMetadata, Metadata, TextMetadata};
use async_trait::async_trait;

/// Passes text through after encoding detection. Markdown and CSV are not reinterpreted.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text-extractor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &str {
        "Extracts content from plain text files"
    }
}

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    #[cfg_attr(feature = "otel", tracing::instrument(
        skip(self, content, _config),
        fields(
            extractor.name = self.name(),
            content.size_bytes = content.len(),
        )
    ))]
    async fn extract_bytes(
        &self,
        content: &[u8],
        mime_type: &str,
        _config: &ExtractionConfig,
    ) -> Result<ExtractionResult> {
        let decoded = decode_text_bytes(content);

        let metadata = Metadata {
            format: Some(FormatMetadata::Text(TextMetadata {
                line_count: decoded.line_count,
                word_count: decoded.word_count,
                character_count: decoded.character_count,
                encoding: Some(decoded.encoding),
            })),
            ..Default::default()
        };

        Ok(ExtractionResult::from_text(decoded.content, mime_type, metadata))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[PLAIN_TEXT_MIME_TYPE, MARKDOWN_MIME_TYPE, "text/x-markdown", CSV_MIME_TYPE]
    }
}
