//! Configuration loading and management.
//!
//! [`ExtractionConfig`] can be built in code or loaded from TOML, YAML or JSON. Every field
//! has a default, so a config file only needs the settings it changes.

use crate::{PitchtextError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name looked up by [`ExtractionConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "pitchtext.toml";

/// Main extraction configuration.
///
/// # Example
///
/// ```rust
/// use pitchtext::core::config::ExtractionConfig;
///
/// let config = ExtractionConfig::default();
/// assert_eq!(config.labels.unknown_sheet, "Unknown Sheet");
///
/// // let config = ExtractionConfig::from_file("pitchtext.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Consult the result store in `CachedExtractor`
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Entries kept by `MemoryStore` before the oldest is evicted
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Inputs larger than this many bytes are rejected before parsing
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Batch concurrency limit (None = CPU count × 2)
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,

    /// Append cell comment blocks to spreadsheet output
    #[serde(default = "default_true")]
    pub include_comments: bool,

    /// Append speaker notes to presentation output
    #[serde(default = "default_true")]
    pub include_notes: bool,

    #[serde(default)]
    pub pdf: PdfConfig,

    #[serde(default)]
    pub labels: LabelConfig,

    #[serde(default)]
    pub payload: PayloadConfig,
}

/// Line reconstruction thresholds for PDF text runs, in PDF user-space units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Runs whose baselines differ by less than this share a line
    #[serde(default = "default_pdf_threshold")]
    pub line_tolerance: f64,

    /// Horizontal gap that becomes one space
    #[serde(default = "default_pdf_threshold")]
    pub space_unit: f64,
}

/// Fixed strings placed into extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Bucket for drawings no sheet references
    #[serde(default = "default_unknown_sheet")]
    pub unknown_sheet: String,

    /// Stand-in body for a sheet without cells
    #[serde(default = "default_empty_sheet")]
    pub empty_sheet: String,
}

/// Options for [`PayloadBuilder`](crate::core::payload::PayloadBuilder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadConfig {
    /// Appended after the last file
    #[serde(default = "default_footer")]
    pub footer: String,

    /// A prompt still containing this marker has not been filled in
    #[serde(default = "default_placeholder_marker")]
    pub placeholder_marker: String,

    /// Literal `(from, to)` substitutions applied to the finished payload, in order
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
}

fn default_true() -> bool {
    true
}
fn default_cache_capacity() -> usize {
    64
}
fn default_max_file_size() -> u64 {
    25 * 1024 * 1024
}
fn default_pdf_threshold() -> f64 {
    5.0
}
fn default_unknown_sheet() -> String {
    "Unknown Sheet".to_string()
}
fn default_empty_sheet() -> String {
    "(sheet is empty or has no valid data)".to_string()
}
fn default_footer() -> String {
    "\n\nEnd of input. Follow the instructions at the top.\n\n".to_string()
}
fn default_placeholder_marker() -> String {
    "●●●".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_capacity: default_cache_capacity(),
            max_file_size: default_max_file_size(),
            max_concurrent_extractions: None,
            include_comments: true,
            include_notes: true,
            pdf: PdfConfig::default(),
            labels: LabelConfig::default(),
            payload: PayloadConfig::default(),
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            line_tolerance: default_pdf_threshold(),
            space_unit: default_pdf_threshold(),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            unknown_sheet: default_unknown_sheet(),
            empty_sheet: default_empty_sheet(),
        }
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            footer: default_footer(),
            placeholder_marker: default_placeholder_marker(),
            replacements: Vec::new(),
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PitchtextError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PitchtextError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| PitchtextError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| PitchtextError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(PitchtextError::validation(format!(
                "Unsupported config format: {} (expected .toml, .yaml or .json)",
                path.display()
            ))),
        }
    }

    /// Search for `pitchtext.toml` in the current directory and its parents.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(PitchtextError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Reject settings no extraction can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(PitchtextError::validation("max_file_size must be greater than zero"));
        }
        if self.max_concurrent_extractions == Some(0) {
            return Err(PitchtextError::validation(
                "max_concurrent_extractions must be greater than zero",
            ));
        }
        if !(self.pdf.line_tolerance.is_finite() && self.pdf.line_tolerance >= 0.0) {
            return Err(PitchtextError::validation("pdf.line_tolerance must be a non-negative number"));
        }
        if !(self.pdf.space_unit.is_finite() && self.pdf.space_unit > 0.0) {
            return Err(PitchtextError::validation("pdf.space_unit must be a positive number"));
        }
        Ok(())
    }

    /// Effective batch concurrency.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_extractions.unwrap_or_else(|| num_cpus::get() * 2).max(1)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PitchtextError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
