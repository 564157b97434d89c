use serde::{Deserialize, Serialize};

// ============================================================================
// ============================================================================

/// Final text block produced for one input file.
///
/// This is the unit handed across the crate boundary: the extracted, layout-preserving
/// text plus whatever metadata the extractor could recover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: String,
    pub mime_type: String,
    pub metadata: Metadata,
}

impl ExtractionResult {
    /// Build a result from text, trimming trailing blank lines.
    pub fn from_text(content: impl Into<String>, mime_type: impl Into<String>, metadata: Metadata) -> Self {
        let content = content.into();
        let trimmed = content.trim_end_matches(['\n', '\r', ' ', '\t']).to_string();
        Self {
            content: trimmed,
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Whether this result is a batch placeholder for a failed file.
    pub fn is_error(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// Format-specific metadata (discriminated union).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format_type", rename_all = "snake_case")]
pub enum FormatMetadata {
    Excel(ExcelMetadata),
    Docx(DocxMetadata),
    Pptx(PptxMetadata),
    Pdf(PdfMetadata),
    Text(TextMetadata),
}

/// Extraction result metadata.
///
/// Document properties come from `docProps/core.xml` for Office packages; they are
/// absent for PDF and plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Primary author(s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Creation timestamp (ISO 8601 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Last modification timestamp (ISO 8601 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatMetadata>,

    /// Set only on batch placeholders for files that failed to extract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMetadata>,
}

/// Spreadsheet metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcelMetadata {
    pub sheet_count: usize,
    pub sheet_names: Vec<String>,
    /// Number of comments emitted across all sheets
    pub comment_count: usize,
    /// Number of shape fragments emitted across all drawing parts
    pub shape_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocxMetadata {
    pub paragraph_count: usize,
    pub table_count: usize,
    pub shape_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PptxMetadata {
    pub slide_count: usize,
    pub notes_count: usize,
    pub shape_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub page_count: usize,
}

/// Text/Markdown metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMetadata {
    pub line_count: usize,
    pub word_count: usize,
    pub character_count: usize,
    /// Encoding the bytes were decoded with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

/// Error metadata (for batch operations).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetadata {
    pub error_type: String,
    pub message: String,
}

// ============================================================================
// ============================================================================

/// One piece of text placed on a sheet or slide grid.
///
/// `row` and `col` are zero-based; `None` means the source format carries no reliable
/// coordinate for the fragment. Equality covers all three fields, so identical text at
/// two different positions is two distinct fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub row: Option<u32>,
    pub col: Option<u32>,
    pub text: String,
}

impl PositionedFragment {
    pub fn at(row: u32, col: u32, text: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            col: Some(col),
            text: text.into(),
        }
    }

    pub fn unpositioned(text: impl Into<String>) -> Self {
        Self {
            row: None,
            col: None,
            text: text.into(),
        }
    }

    /// Both coordinates known.
    pub fn position(&self) -> Option<(u32, u32)> {
        match (self.row, self.col) {
            (Some(row), Some(col)) => Some((row, col)),
            _ => None,
        }
    }
}
