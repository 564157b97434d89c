//! Spreadsheet extractor.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::core::mime::{
    EXCEL_BINARY_2007_MIME_TYPE, EXCEL_BINARY_MIME_TYPE, EXCEL_MACRO_MIME_TYPE, EXCEL_MIME_TYPE,
    OPENDOC_SPREADSHEET_MIME_TYPE,
};
use crate::extraction::xlsx::{LegacyWorkbook, SpreadsheetContent, extract_legacy_workbook, extract_xlsx};
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExcelMetadata, ExtractionResult, FormatMetadata, Metadata};
use async_trait::async_trait;

/// Workbooks: `.xlsx`/`.xlsm` with styles, comments and drawing shapes; `.xls`, `.xlsb`
/// and `.ods` with cell text only.
pub struct ExcelExtractor;

impl Default for ExcelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExcelExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse(content: &[u8], mime_type: &str, config: &ExtractionConfig) -> Result<SpreadsheetContent> {
        match mime_type {
            EXCEL_BINARY_MIME_TYPE => extract_legacy_workbook(content, LegacyWorkbook::Xls, config),
            EXCEL_BINARY_2007_MIME_TYPE => extract_legacy_workbook(content, LegacyWorkbook::Xlsb, config),
            OPENDOC_SPREADSHEET_MIME_TYPE => extract_legacy_workbook(content, LegacyWorkbook::Ods, config),
            _ => extract_xlsx(content, config),
        }
    }
}

impl Plugin for ExcelExtractor {
    fn name(&self) -> &str {
        "excel-extractor"
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
        "Extracts sheet tables, comments and drawing shapes from workbooks"
    }
}

#[async_trait]
impl DocumentExtractor for ExcelExtractor {
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
        let workbook = if crate::core::batch_mode::is_batch_mode() {
            let content_owned = content.to_vec();
            let mime_owned = mime_type.to_string();
            let config_owned = config.clone();
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || {
                let _guard = span.entered();
                Self::parse(&content_owned, &mime_owned, &config_owned)
            })
            .await
            .map_err(|e| crate::PitchtextError::parsing(format!("Spreadsheet extraction task failed: {}", e)))??
        } else {
            Self::parse(content, mime_type, config)?
        };

        let mut metadata = Metadata {
            format: Some(FormatMetadata::Excel(ExcelMetadata {
                sheet_count: workbook.sheet_names.len(),
                sheet_names: workbook.sheet_names,
                comment_count: workbook.comment_count,
                shape_count: workbook.shape_count,
            })),
            ..Default::default()
        };
        workbook.properties.apply_to(&mut metadata);

        Ok(ExtractionResult::from_text(workbook.content, mime_type, metadata))
    }

    fn supported_mime_types(&self) -> &[&str] {
        &[
            EXCEL_MIME_TYPE,
            EXCEL_MACRO_MIME_TYPE,
            EXCEL_BINARY_MIME_TYPE,
            EXCEL_BINARY_2007_MIME_TYPE,
            OPENDOC_SPREADSHEET_MIME_TYPE,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PitchtextError;
    use crate::extraction::container::test_support::build_package;

    const WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Market" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    const WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>TAM</t></is></c><c r="B1"><v>3000000000</v></c></row></sheetData></worksheet>"#;
    const CORE: &str = r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Market model</dc:title><dc:creator>Founder</dc:creator></cp:coreProperties>"#;

    #[test]
    fn test_excel_extractor_plugin_interface() {
        let extractor = ExcelExtractor::new();
        assert_eq!(extractor.name(), "excel-extractor");
        assert!(extractor.initialize().is_ok());
        assert_eq!(extractor.supported_mime_types().len(), 5);
    }

    #[tokio::test]
    async fn test_extract_xlsx_metadata() {
        let bytes = build_package(&[
            ("[Content_Types].xml", "<Types/>"),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
            ("docProps/core.xml", CORE),
        ]);

        let result = ExcelExtractor::new()
            .extract_bytes(&bytes, EXCEL_MIME_TYPE, &ExtractionConfig::default())
            .await
            .unwrap();

        assert!(result.content.starts_with("【Sheet: Market】\nTAM\t3000000000"));
        assert_eq!(result.metadata.title.as_deref(), Some("Market model"));
        assert_eq!(result.metadata.authors, Some(vec!["Founder".to_string()]));
        match result.metadata.format {
            Some(FormatMetadata::Excel(meta)) => {
                assert_eq!(meta.sheet_count, 1);
                assert_eq!(meta.sheet_names, vec!["Market"]);
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_corrupt_workbook_in_batch_mode() {
        let result = crate::core::batch_mode::with_batch_mode(async {
            ExcelExtractor::new()
                .extract_bytes(b"not a zip", EXCEL_MIME_TYPE, &ExtractionConfig::default())
                .await
        })
        .await;
        assert!(matches!(result, Err(PitchtextError::CorruptContainer { .. })));
    }
}
