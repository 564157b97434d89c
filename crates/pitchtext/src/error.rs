//! Error types for pitchtext.
//!
//! Every fallible operation in the crate returns [`Result`], backed by
//! [`PitchtextError`].
//!
//! # Error Handling Philosophy
//!
//! **System errors always bubble up unchanged:**
//! - `PitchtextError::Io` (from `std::io::Error`) covers file system and permission errors.
//!   Batch extraction never turns these into per-file placeholders.
//!
//! **Document errors are wrapped with context:**
//! - `CorruptContainer` - the byte stream is not a readable ZIP package
//! - `Parsing` - the primary content of a document could not be parsed
//! - `Validation` - bad configuration, oversized input, unusable prompt
//! - `UnsupportedFormat` - the extension or MIME type has no extractor
//!
//! **Auxiliary content never produces an error.** A drawing, comment part or number
//! format that cannot be read is logged through `tracing` and contributes nothing.
//!
//! # Example
//!
//! ```rust
//! use pitchtext::{PitchtextError, Result};
//!
//! fn load(path: &str) -> Result<Vec<u8>> {
//!     let bytes = std::fs::read(path)?;
//!     if bytes.is_empty() {
//!         return Err(PitchtextError::validation(format!("File is empty: {}", path)));
//!     }
//!     Ok(bytes)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `PitchtextError`.
pub type Result<T> = std::result::Result<T, PitchtextError>;

/// Main error type for all pitchtext operations.
#[derive(Debug, Error)]
pub enum PitchtextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt container: {message}")]
    CorruptContainer {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Plugin error in '{plugin_name}': {message}")]
    Plugin { message: String, plugin_name: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "excel")]
impl From<calamine::Error> for PitchtextError {
    fn from(err: calamine::Error) -> Self {
        PitchtextError::Parsing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "office")]
impl From<zip::result::ZipError> for PitchtextError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io_err) => PitchtextError::Io(io_err),
            other => PitchtextError::CorruptContainer {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for PitchtextError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PitchtextError::Io(io_err),
            other => PitchtextError::Parsing {
                message: format!("Invalid PDF: {}", other),
                source: Some(Box::new(other)),
            },
        }
    }
}

impl From<serde_json::Error> for PitchtextError {
    fn from(err: serde_json::Error) -> Self {
        PitchtextError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rmp_serde::encode::Error> for PitchtextError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        PitchtextError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rmp_serde::decode::Error> for PitchtextError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        PitchtextError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PitchtextError {
    error_constructor!(corrupt_container, CorruptContainer);
    error_constructor!(parsing, Parsing);
    error_constructor!(validation, Validation);
    error_constructor!(cache, Cache);
    error_constructor!(serialization, Serialization);

    /// Short, stable name of the variant, used in placeholder metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            PitchtextError::Io(_) => "Io",
            PitchtextError::CorruptContainer { .. } => "CorruptContainer",
            PitchtextError::Parsing { .. } => "Parsing",
            PitchtextError::Validation { .. } => "Validation",
            PitchtextError::Cache { .. } => "Cache",
            PitchtextError::Serialization { .. } => "Serialization",
            PitchtextError::Plugin { .. } => "Plugin",
            PitchtextError::LockPoisoned(_) => "LockPoisoned",
            PitchtextError::UnsupportedFormat(_) => "UnsupportedFormat",
            PitchtextError::Other(_) => "Other",
        }
    }
}
