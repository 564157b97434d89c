//! Plugin system.
//!
//! Every supported format is served by a [`DocumentExtractor`] registered in the global
//! [`DocumentExtractorRegistry`]. Built-in extractors are registered lazily on first use;
//! a custom extractor registered later replaces them for the MIME types it claims.

pub mod extractor;
pub mod registry;
pub mod traits;

pub use extractor::DocumentExtractor;
pub use registry::{DocumentExtractorRegistry, get_document_extractor_registry};
pub use traits::Plugin;
