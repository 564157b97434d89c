//! Word document extractor.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::mime::DOCX_MIME_TYPE;
use crate::extraction::docx::extract_docx;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{DocxMetadata, ExtractionResult, FormatMetadata, Metadata};
use async_trait::async_trait;

/// `.docx` extractor producing the indented block outline plus text box and drawing
/// shape text.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DocxExtractor {
    fn name(&self) -> &str {
        "docx-extractor"
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
}

#[async_trait]
impl DocumentExtractor for DocxExtractor {
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
        let document = if crate::core::batch_mode::is_batch_mode() {
            let content_owned = content.to_vec();
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || {
                let _guard = span.entered();
                extract_docx(&content_owned)
            })
            .await
            .map_err(|e| crate::PitchtextError::parsing(format!("DOCX extraction task failed: {}", e)))??
        } else {
            extract_docx(content)?
        };

        let mut metadata = Metadata {
            format: Some(FormatMetadata::Docx(DocxMetadata {
                paragraph_count: document.paragraph_count,
                table_count: document.table_count,
                shape_count: document.shape_count,
            })),
            ..Default::default()
        };
        document.properties.apply_to(&mut metadata);

        Ok(ExtractionResult::from_text(document.content, mime_type, metadata))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[DOCX_MIME_TYPE]
    }
}
