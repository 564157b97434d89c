pub mod normalize;
pub mod text;

#[cfg(feature = "office")]
pub mod comments;

#[cfg(feature = "office")]
pub mod container;

#[cfg(feature = "office")]
pub mod docx;

#[cfg(feature = "office")]
pub mod grid;

#[cfg(feature = "office")]
pub mod numfmt;

#[cfg(feature = "office")]
pub mod pptx;

#[cfg(feature = "office")]
pub mod properties;

#[cfg(feature = "office")]
pub mod relationships;

#[cfg(feature = "office")]
pub mod shapes;

#[cfg(feature = "excel")]
pub mod xlsx;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use normalize::normalize_whitespace;
pub use text::{DecodedText, decode_text_bytes};

#[cfg(feature = "office")]
pub use container::{Container, DECODER_ATTEMPTS, DecoderAttempt, PackagePart, PartSource, decode_text};

#[cfg(feature = "office")]
pub use docx::{Block, WordContent, extract_docx};

#[cfg(feature = "office")]
pub use grid::{Composition, compose};

#[cfg(feature = "office")]
pub use pptx::{PresentationContent, extract_pptx};

#[cfg(feature = "office")]
pub use relationships::{
    DrawingAssociation, RelationshipEntry, RelationshipMap, SheetDescriptor, SheetEntry, associate_drawings,
    build_relationship_map, build_sheet_index, resolve_path,
};

#[cfg(feature = "office")]
pub use shapes::parse_shapes;

#[cfg(feature = "excel")]
pub use xlsx::{LegacyWorkbook, SpreadsheetContent, extract_legacy_workbook, extract_xlsx};

#[cfg(feature = "pdf")]
pub use pdf::{PdfContent, TextRun, TextRunSource, extract_pdf, reconstruct_page};
