//! Extraction orchestration: configuration, MIME routing, file I/O, batching and the
//! downstream payload.

pub mod batch_mode;
pub mod config;
pub mod extractor;
pub mod io;
pub mod mime;
pub mod payload;

pub use config::{CONFIG_FILE_NAME, ExtractionConfig, LabelConfig, PayloadConfig, PdfConfig};
pub use extractor::{
    batch_extract_bytes, batch_extract_bytes_sync, batch_extract_file, batch_extract_file_sync, error_placeholder,
    extract_bytes, extract_bytes_sync, extract_file, extract_file_sync, extract_named_bytes,
};
pub use mime::{detect_mime_type, detect_or_validate, validate_mime_type};
pub use payload::PayloadBuilder;
