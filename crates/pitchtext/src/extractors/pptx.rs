//! PowerPoint presentation extractor.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::mime::POWER_POINT_MIME_TYPE;
use crate::extraction::pptx::extract_pptx;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtractionResult, FormatMetadata, Metadata, PptxMetadata};
use async_trait::async_trait;

/// `.pptx` extractor: slide text runs, speaker notes and pooled drawing shapes.
pub struct PptxExtractor;

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for PptxExtractor {
    fn name(&self) -> &str {
        "pptx-extractor"
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
        "Extracts slide text, speaker notes and shapes from PowerPoint presentations"
    }
}

#[async_trait]
impl DocumentExtractor for PptxExtractor {
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
        let include_notes = config.include_notes;
        let presentation = if crate::core::batch_mode::is_batch_mode() {
            let content_owned = content.to_vec();
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || {
                let _guard = span.entered();
                extract_pptx(&content_owned, include_notes)
            })
            .await
            .map_err(|e| crate::PitchtextError::parsing(format!("PPTX extraction task failed: {}", e)))??
        } else {
            extract_pptx(content, include_notes)?
        };

        let mut metadata = Metadata {
            format: Some(FormatMetadata::Pptx(PptxMetadata {
                slide_count: presentation.slide_count,
                notes_count: presentation.notes_count,
                shape_count: presentation.shape_count,
            })),
            ..Default::default()
        };
        presentation.properties.apply_to(&mut metadata);

        Ok(ExtractionResult::from_text(presentation.content, mime_type, metadata))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[POWER_POINT_MIME_TYPE]
    }
}
