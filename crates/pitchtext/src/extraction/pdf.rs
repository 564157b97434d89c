//! PDF text reconstruction.
//!
//! Each page is reduced to positioned text runs and the runs are regrouped into lines by
//! their baseline. Run collection sits behind [`TextRunSource`]; the grouping in
//! [`reconstruct_page`] is a pure function of the runs and two thresholds.
//!
//! Glyph widths are estimated from the font size rather than read from font programs, so
//! gap-derived spacing is approximate. String bytes are decoded as UTF-16BE when they carry
//! a byte order mark and as Latin-1 otherwise; fonts with custom CMaps are not mapped.

use crate::core::config::PdfConfig;
use crate::error::{PitchtextError, Result};
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::cmp::Ordering;

/// Average glyph advance as a fraction of the font size.
const ESTIMATED_GLYPH_WIDTH: f64 = 0.5;

/// One shown string with its origin in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl TextRun {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }
}

/// Anything that can produce text runs page by page.
pub trait TextRunSource {
    fn page_count(&self) -> usize;

    /// Runs of every page, in page order.
    fn page_runs(&self) -> Result<Vec<Vec<TextRun>>>;
}

/// Extracted PDF text and document info.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfContent {
    pub content: String,
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
}

/// Extract text from PDF bytes.
///
/// # Errors
///
/// `Parsing` for unreadable or encrypted documents.
pub fn extract_pdf(bytes: &[u8], config: &PdfConfig) -> Result<PdfContent> {
    let source = LopdfSource::load(bytes)?;
    let pages = source.page_runs()?;
    let content = pages
        .iter()
        .map(|runs| reconstruct_page(runs, config))
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(PdfContent {
        content,
        page_count: source.page_count(),
        title: source.info_string(b"Title"),
        author: source.info_string(b"Author"),
        created: source.info_string(b"CreationDate"),
    })
}

/// Group runs into lines and lines into page text.
///
/// Runs are ordered top to bottom, then left to right. A run joins the current line while
/// its baseline is within `line_tolerance` of the line's first run. Within a line, a gap
/// wider than `space_unit` becomes one space per full `space_unit`, at least one.
pub fn reconstruct_page(runs: &[TextRun], config: &PdfConfig) -> String {
    let mut ordered: Vec<&TextRun> = runs.iter().filter(|r| !r.text.is_empty()).collect();
    ordered.sort_by(|a, b| match b.y.total_cmp(&a.y) {
        Ordering::Equal => a.x.total_cmp(&b.x),
        other => other,
    });

    let mut lines: Vec<Vec<&TextRun>> = Vec::new();
    let mut line_y = f64::NAN;
    for run in ordered {
        match lines.last_mut() {
            Some(line) if (run.y - line_y).abs() < config.line_tolerance => line.push(run),
            _ => {
                line_y = run.y;
                lines.push(vec![run]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            let mut text = String::new();
            let mut previous: Option<&TextRun> = None;
            for run in line {
                if let Some(prev) = previous {
                    let gap = run.x - (prev.x + prev.width);
                    if gap > config.space_unit {
                        let spaces = ((gap / config.space_unit).floor() as usize).max(1);
                        text.push_str(&" ".repeat(spaces));
                    }
                }
                text.push_str(&run.text);
                previous = Some(run);
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// [`TextRunSource`] over a parsed lopdf document.
pub struct LopdfSource {
    document: Document,
}

impl LopdfSource {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes)?;
        if document.is_encrypted() {
            return Err(PitchtextError::parsing("PDF is password protected"));
        }
        Ok(Self { document })
    }

    fn info_string(&self, key: &[u8]) -> Option<String> {
        let info_id = self.document.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let info = self.document.get_dictionary(info_id).ok()?;
        match info.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)).filter(|s| !s.trim().is_empty()),
            _ => None,
        }
    }
}

impl TextRunSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn page_runs(&self) -> Result<Vec<Vec<TextRun>>> {
        let mut pages = Vec::new();
        for (number, page_id) in self.document.get_pages() {
            let runs = match self.document.get_page_content(page_id) {
                Ok(data) => match Content::decode(&data) {
                    Ok(content) => runs_from_operations(&content.operations),
                    Err(e) => {
                        tracing::warn!("Skipping undecodable content of page {}: {}", number, e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!("Skipping unreadable page {}: {}", number, e);
                    Vec::new()
                }
            };
            pages.push(runs);
        }
        Ok(pages)
    }
}

/// Affine transform `[a b c d e f]` as used by PDF content streams.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values: Vec<f64> = operands.iter().filter_map(number).collect();
        let [a, b, c, d, e, f] = values.as_slice() else {
            return None;
        };
        Some(Matrix {
            a: *a,
            b: *b,
            c: *c,
            d: *d,
            e: *e,
            f: *f,
        })
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn translated(&self, tx: f64, ty: f64) -> Matrix {
        Matrix {
            e: tx * self.a + ty * self.c + self.e,
            f: tx * self.b + ty * self.d + self.f,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = self.line_matrix.translated(tx, ty);
        self.text_matrix = self.line_matrix;
    }

    /// Emit a run at the current position and advance past it.
    fn show(&mut self, text: String, runs: &mut Vec<TextRun>) {
        let advance = text.chars().count() as f64 * self.font_size * ESTIMATED_GLYPH_WIDTH;
        let origin = self.text_matrix.multiply(&self.ctm);
        let scale = (origin.a * origin.a + origin.b * origin.b).sqrt();
        if !text.is_empty() {
            runs.push(TextRun::new(text, origin.e, origin.f, advance * scale));
        }
        self.text_matrix = self.text_matrix.translated(advance, 0.0);
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Walk content stream operations and collect shown strings with their positions.
fn runs_from_operations(operations: &[lopdf::content::Operation]) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut state = TextState::default();
    let mut saved: Vec<TextState> = Vec::new();

    for op in operations {
        let operands = &op.operands;
        let n = |i: usize| operands.get(i).and_then(number);
        match op.operator.as_str() {
            "q" => saved.push(state),
            "Q" => {
                if let Some(previous) = saved.pop() {
                    state.ctm = previous.ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.ctm = m.multiply(&state.ctm);
                }
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = n(1) {
                    state.font_size = size.abs();
                }
            }
            "TL" => state.leading = n(0).unwrap_or(state.leading),
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "Td" => state.next_line(n(0).unwrap_or(0.0), n(1).unwrap_or(0.0)),
            "TD" => {
                let ty = n(1).unwrap_or(0.0);
                state.leading = -ty;
                state.next_line(n(0).unwrap_or(0.0), ty);
            }
            "T*" => state.next_line(0.0, -state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(decode_pdf_string(bytes), &mut runs);
                }
            }
            "'" => {
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    state.show(decode_pdf_string(bytes), &mut runs);
                }
            }
            "\"" => {
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    state.show(decode_pdf_string(bytes), &mut runs);
                }
            }
            "TJ" => {
                let Some(Object::Array(items)) = operands.first() else {
                    continue;
                };
                let mut text = String::new();
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                        other => {
                            // Large negative kerning is a word gap.
                            if number(other).is_some_and(|k| k < -200.0) {
                                text.push(' ');
                            }
                        }
                    }
                }
                state.show(text, &mut runs);
            }
            _ => {}
        }
    }
    runs
}

/// Text string bytes to a Rust string: UTF-16BE with a byte order mark, Latin-1 otherwise.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}
