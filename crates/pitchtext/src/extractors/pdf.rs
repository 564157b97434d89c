//! PDF extractor.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::mime::PDF_MIME_TYPE;
use crate::extraction::pdf::extract_pdf;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtractionResult, FormatMetadata, Metadata, PdfMetadata};
use async_trait::async_trait;

/// PDF extractor rebuilding lines from positioned text runs.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extractor"
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
impl DocumentExtractor for PdfExtractor {
    #[cfg_attr(feature = "otel", tracing::instrument(
        skip(self, content, config),
        fields(
            extractor.name = self.name(),
            content.size_bytes = content.len(),
        )
    ))]
    async fn extract_bytes(
        &self,
        content: &[u8],
        mime_type: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult> {
        let pdf = if crate::core::batch_mode::is_batch_mode() {
            let content_owned = content.to_vec();
            let pdf_config = config.pdf.clone();
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || {
                let _guard = span.entered();
                extract_pdf(&content_owned, &pdf_config)
            })
            .await
            .map_err(|e| crate::PitchtextError::parsing(format!("PDF extraction task failed: {}", e)))??
        } else {
            extract_pdf(content, &config.pdf)?
        };

        let metadata = Metadata {
            title: pdf.title,
            authors: pdf.author.map(|author| vec![author]),
            created_at: pdf.created,
            format: Some(FormatMetadata::Pdf(PdfMetadata {
                page_count: pdf.page_count,
            })),
            ..Default::default()
        };

        Ok(ExtractionResult::from_text(pdf.content, mime_type, metadata))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[PDF_MIME_TYPE]
    }
}
