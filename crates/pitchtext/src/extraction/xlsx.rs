//! Spreadsheet extraction.
//!
//! Cell values come from calamine. For `.xlsx` packages the same bytes are also opened as a
//! [`Container`] so that number formats, cell comments and drawing shapes can be read from
//! the parts calamine does not surface.
//!
//! Output is one block per sheet in workbook order, each followed by that sheet's comments,
//! then one shape section for the whole workbook:
//!
//! ```text
//! 【Sheet: Summary】
//! Metric	Value
//! ARR	1,200,000
//!
//!
//! 【Shapes in "Summary"】
//! Problem	Solution
//! ```

use crate::core::config::ExtractionConfig;
use crate::error::{PitchtextError, Result};
use crate::extraction::comments::{CellComment, parse_comments, render_comment_block};
use crate::extraction::container::{Container, PartSource};
use crate::extraction::grid::{compose, serialize_cells};
use crate::extraction::normalize::normalize_whitespace;
use crate::extraction::numfmt::{NumberFormats, cell_styles, format_datetime, format_general, format_number};
use crate::extraction::properties::CoreProperties;
use crate::extraction::relationships::{SheetDescriptor, associate_drawings, comment_parts_for, load_workbook_sheets};
use crate::extraction::shapes::{dedup_fragments, parse_shapes};
use crate::types::PositionedFragment;
use ahash::{AHashMap, AHashSet};
use calamine::{Data, Range, Reader};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::io::Cursor;

/// Drawing parts that are picked up even when no sheet references them.
static WORKBOOK_DRAWING_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^xl/drawings/(drawing\d+\.xml|vmlDrawing\d+\.vml)$")
        .expect("Workbook drawing pattern is valid and should compile")
});

/// Extracted spreadsheet text and what was found along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadsheetContent {
    pub content: String,
    pub sheet_names: Vec<String>,
    pub comment_count: usize,
    pub shape_count: usize,
    pub properties: CoreProperties,
}

/// Spreadsheet formats read through calamine alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyWorkbook {
    Xls,
    Xlsb,
    Ods,
}

/// Per-cell number format lookup for one sheet.
struct SheetStyles<'f> {
    formats: &'f NumberFormats,
    cells: AHashMap<(u32, u32), usize>,
}

impl SheetStyles<'_> {
    fn code_at(&self, row: u32, col: u32) -> Option<Cow<'_, str>> {
        let style = *self.cells.get(&(row, col))?;
        self.formats.code_for_style(style)
    }
}

/// Extract an Office Open XML workbook (`.xlsx`, `.xlsm`).
///
/// # Errors
///
/// `CorruptContainer` if the bytes are not a ZIP package, `Parsing` if calamine cannot read
/// the workbook. Comments, drawings and styles that cannot be read contribute nothing.
pub fn extract_xlsx(bytes: &[u8], config: &ExtractionConfig) -> Result<SpreadsheetContent> {
    let mut container = Container::open(bytes)?;
    let descriptors = load_workbook_sheets(&mut container);
    let properties = CoreProperties::load(&mut container);

    let formats = match container.read_text("xl/styles.xml") {
        Some(xml) => NumberFormats::parse(&xml).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable xl/styles.xml: {}", e);
            NumberFormats::default()
        }),
        None => NumberFormats::default(),
    };

    let mut workbook = calamine::Xlsx::new(Cursor::new(bytes))
        .map_err(|e| PitchtextError::parsing(format!("Failed to parse XLSX: {}", e)))?;
    let sheet_names = workbook.sheet_names();

    let mut content = String::new();
    let mut comment_count = 0;
    for name in &sheet_names {
        let descriptor = descriptors.iter().find(|d| &d.name == name);
        let sheet_path = descriptor.and_then(|d| d.file_path.as_deref());

        let styles = SheetStyles {
            formats: &formats,
            cells: sheet_path
                .and_then(|path| container.read_text(path))
                .map(|xml| cell_styles(&xml))
                .unwrap_or_default(),
        };
        let range = read_range(&mut workbook, name);
        content.push_str(&render_sheet(name, range.as_ref(), Some(&styles), config));

        if config.include_comments
            && let Some(path) = sheet_path
        {
            let comments = load_comments(path, &mut container);
            comment_count += comments.len();
            content.push_str(&render_comment_block(name, &comments));
        }
    }

    let sheet_order: Vec<String> = if descriptors.is_empty() {
        sheet_names.clone()
    } else {
        descriptors.iter().map(|d| d.name.clone()).collect()
    };
    let (shape_text, shape_count) = extract_workbook_shapes(&mut container, &descriptors, &sheet_order, config);
    if !shape_text.is_empty() {
        content.push_str(&shape_text);
        content.push('\n');
    }

    Ok(SpreadsheetContent {
        content,
        sheet_names,
        comment_count,
        shape_count,
        properties,
    })
}

/// Extract a workbook calamine reads natively. These formats carry no drawing parts.
pub fn extract_legacy_workbook(
    bytes: &[u8],
    kind: LegacyWorkbook,
    config: &ExtractionConfig,
) -> Result<SpreadsheetContent> {
    let cursor = Cursor::new(bytes);
    match kind {
        LegacyWorkbook::Xls => {
            let workbook = calamine::Xls::new(cursor)
                .map_err(|e| PitchtextError::parsing(format!("Failed to parse XLS: {}", e)))?;
            Ok(render_calamine_workbook(workbook, config))
        }
        LegacyWorkbook::Xlsb => {
            let workbook = calamine::Xlsb::new(cursor)
                .map_err(|e| PitchtextError::parsing(format!("Failed to parse XLSB: {}", e)))?;
            Ok(render_calamine_workbook(workbook, config))
        }
        LegacyWorkbook::Ods => {
            let workbook = calamine::Ods::new(cursor)
                .map_err(|e| PitchtextError::parsing(format!("Failed to parse ODS: {}", e)))?;
            Ok(render_calamine_workbook(workbook, config))
        }
    }
}

fn render_calamine_workbook<RS, R>(mut workbook: R, config: &ExtractionConfig) -> SpreadsheetContent
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
{
    let sheet_names = workbook.sheet_names();
    let mut content = String::new();
    for name in &sheet_names {
        let range = read_range(&mut workbook, name);
        content.push_str(&render_sheet(name, range.as_ref(), None, config));
    }

    SpreadsheetContent {
        content,
        sheet_names,
        ..Default::default()
    }
}

/// An unreadable sheet is rendered as empty.
fn read_range<RS, R>(workbook: &mut R, name: &str) -> Option<Range<Data>>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
{
    match workbook.worksheet_range(name) {
        Ok(range) => Some(range),
        Err(e) => {
            tracing::warn!("Could not read sheet '{}': {:?}", name, e);
            None
        }
    }
}

fn render_sheet(
    name: &str,
    range: Option<&Range<Data>>,
    styles: Option<&SheetStyles<'_>>,
    config: &ExtractionConfig,
) -> String {
    let table = range.map(|range| sheet_table(range, styles)).unwrap_or_default();
    let body = if table.is_empty() {
        config.labels.empty_sheet.as_str()
    } else {
        table.as_str()
    };
    format!("【Sheet: {}】\n{}\n\n\n", name, body)
}

/// Tab-separated cell text with empty rows and columns pruned, without a trailing newline.
fn sheet_table(range: &Range<Data>, styles: Option<&SheetStyles<'_>>) -> String {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut cells = std::collections::BTreeMap::new();

    for (row, col, value) in range.used_cells() {
        let (row, col) = (start_row + row as u32, start_col + col as u32);
        let code = styles.and_then(|s| s.code_at(row, col));
        let text = normalize_whitespace(&cell_display(value, code.as_deref()));
        if !text.is_empty() {
            cells.insert((row, col), text);
        }
    }

    serialize_cells(&cells).trim_end_matches('\n').to_string()
}

/// Display string of one cell, honoring its number format when there is one.
pub fn cell_display(value: &Data, format_code: Option<&str>) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_numeric(*f, format_code),
        Data::Int(i) => format_numeric(*i as f64, format_code),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if dt.is_duration() {
                return format_duration(serial);
            }
            let Some(datetime) = dt.as_datetime() else {
                return format_general(serial);
            };
            if let Some(text) = format_code.and_then(|code| format_datetime(datetime, code)) {
                return text;
            }
            let pattern = if serial.fract() == 0.0 {
                "%Y-%m-%d"
            } else if serial < 1.0 {
                "%H:%M:%S"
            } else {
                "%Y-%m-%d %H:%M:%S"
            };
            datetime.format(pattern).to_string()
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn format_numeric(value: f64, format_code: Option<&str>) -> String {
    format_code
        .and_then(|code| format_number(value, code))
        .unwrap_or_else(|| format_general(value))
}

/// Elapsed time as `h:mm:ss`, hours unbounded.
fn format_duration(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!("{}{}:{:02}:{:02}", sign, total / 3600, (total % 3600) / 60, total % 60)
}

fn load_comments(sheet_path: &str, source: &mut impl PartSource) -> Vec<CellComment> {
    let mut comments = Vec::new();
    for part in comment_parts_for(sheet_path, source) {
        let Some(xml) = source.read_text(&part) else {
            tracing::debug!("Comment part {} is referenced but missing", part);
            continue;
        };
        match parse_comments(&xml) {
            Ok(parsed) => comments.extend(parsed),
            Err(e) => tracing::warn!("Skipping comment part {}: {}", part, e),
        }
    }
    comments
}

/// Collect shape text from every drawing in the package, bucketed by owning sheet.
///
/// Returns the rendered section (trimmed, empty when there are no shapes) and the number of
/// distinct fragments found.
pub fn extract_workbook_shapes(
    source: &mut impl PartSource,
    sheets: &[SheetDescriptor],
    sheet_order: &[String],
    config: &ExtractionConfig,
) -> (String, usize) {
    let association = associate_drawings(sheets, source);
    let mut buckets: IndexMap<String, Vec<PositionedFragment>> = IndexMap::new();
    let mut processed = AHashSet::new();

    for (path, owner) in association.iter() {
        let Some(xml) = source.read_text(path) else {
            tracing::debug!("Drawing {} of sheet '{}' is referenced but missing", path, owner.sheet);
            continue;
        };
        processed.insert(path.to_lowercase());
        let fragments = parse_shapes(&xml, path);
        if !fragments.is_empty() {
            buckets.entry(owner.sheet.clone()).or_default().extend(fragments);
        }
    }

    let unknown = config.labels.unknown_sheet.as_str();
    for name in source.part_names() {
        if !WORKBOOK_DRAWING_PART.is_match(&name) || processed.contains(&name.to_lowercase()) {
            continue;
        }
        let Some(xml) = source.read_text(&name) else {
            continue;
        };
        let fragments = parse_shapes(&xml, &name);
        if !fragments.is_empty() {
            tracing::debug!("Drawing {} is not referenced by any sheet", name);
            buckets.entry(unknown.to_string()).or_default().extend(fragments);
        }
    }

    let mut ordered: Vec<(String, Vec<PositionedFragment>)> = Vec::with_capacity(buckets.len());
    for sheet in sheet_order {
        if sheet != unknown
            && let Some(fragments) = buckets.shift_remove(sheet)
        {
            ordered.push((sheet.clone(), fragments));
        }
    }
    let trailing_unknown = buckets.shift_remove(unknown);
    ordered.extend(buckets);
    if let Some(fragments) = trailing_unknown {
        ordered.push((unknown.to_string(), fragments));
    }

    let mut section = String::new();
    let mut shape_count = 0;
    for (sheet, fragments) in ordered {
        let fragments = dedup_fragments(fragments);
        shape_count += fragments.len();
        section.push_str(&render_shape_bucket(&sheet, &fragments));
    }
    (section.trim().to_string(), shape_count)
}

fn render_shape_bucket(sheet: &str, fragments: &[PositionedFragment]) -> String {
    let composition = compose(fragments);
    let mut block = String::new();
    if !composition.grid.trim().is_empty() {
        block.push_str(&format!("【Shapes in \"{}\"】\n{}\n", sheet, composition.grid));
    }
    if !composition.unpositioned.is_empty() {
        block.push_str(&format!(
            "【Other Shapes (e.g., VML) in \"{}\"】\n{}\n\n",
            sheet,
            composition.auxiliary_text()
        ));
    }
    block
}
