//! Whitespace normalization shared by cell, shape and comment text.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAKS_AND_TABS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n\t]+").expect("Line break regex pattern is valid and should compile"));
static REPEATED_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("Repeated whitespace regex pattern is valid and should compile"));

/// Collapse newlines and tabs to single spaces, squeeze repeated whitespace and trim.
///
/// Cell and shape text end up inside tab/newline-delimited grids, so neither
/// character may survive inside a single cell.
pub fn normalize_whitespace(text: &str) -> String {
    let flattened = LINE_BREAKS_AND_TABS.replace_all(text, " ");
    let squeezed = REPEATED_WHITESPACE.replace_all(&flattened, " ");
    squeezed.trim().to_string()
}
