//! pitchtext - structural text extraction from office documents
//!
//! pitchtext turns spreadsheets, Word documents, presentations, PDFs and plain text into
//! one layout-preserving text block per file, ready to be concatenated under an
//! instruction prompt and handed to a language model.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pitchtext::{extract_file_sync, ExtractionConfig};
//!
//! # fn main() -> pitchtext::Result<()> {
//! let config = ExtractionConfig::default();
//! let result = extract_file_sync("financials.xlsx", None, &config)?;
//! println!("{}", result.content);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): orchestration, MIME routing, configuration, batching and the payload builder
//! - **Plugins** (`plugins`): the extractor trait and the MIME-keyed registry
//! - **Extractors** (`extractors`): one plugin per format family
//! - **Extraction** (`extraction`): the format parsers, including drawing shapes and the
//!   grid compositor that places shape text at sheet coordinates
//! - **Cache** (`cache`): optional result caching over an injected store
//!
//! # Features
//!
//! - `office`: `.docx` and `.pptx`, plus the OOXML package machinery
//! - `excel`: workbooks through calamine (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`)
//! - `pdf`: PDF text through lopdf
//! - `quality`: encoding detection for plain text
//! - `otel`: tracing spans on extraction entry points

#![deny(unsafe_code)]

pub mod cache;
pub mod core;
pub mod error;
pub mod extraction;
pub mod extractors;
pub mod plugins;
pub mod types;

pub use error::{PitchtextError, Result};
pub use types::*;

pub use core::extractor::{batch_extract_bytes, batch_extract_file};
pub use core::extractor::{extract_bytes, extract_file, extract_named_bytes};

pub use core::extractor::{batch_extract_bytes_sync, batch_extract_file_sync, extract_bytes_sync, extract_file_sync};

pub use core::config::{ExtractionConfig, LabelConfig, PayloadConfig, PdfConfig};

pub use core::mime::{
    CSV_MIME_TYPE, DOCX_MIME_TYPE, EXCEL_MIME_TYPE, MARKDOWN_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE,
    POWER_POINT_MIME_TYPE, detect_mime_type, validate_mime_type,
};

pub use core::payload::PayloadBuilder;

pub use cache::{CachedExtractor, KvStore, MemoryStore};

pub use plugins::registry::{DocumentExtractorRegistry, get_document_extractor_registry};
