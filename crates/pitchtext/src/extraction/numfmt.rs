//! Spreadsheet number formats.
//!
//! calamine hands back typed values; the text a user sees in the cell depends on the cell's
//! style. This module reads `xl/styles.xml` and the per-cell style indices from a worksheet
//! part, and renders numbers the way the format code asks for: fixed decimals, thousands
//! separators, percentages, scientific notation and literal prefixes and suffixes. Date and
//! time codes are translated token by token into `chrono` format items, so a cell styled
//! `d-mmm-yy` prints as `1-Jan-24`.

use crate::error::{PitchtextError, Result};
use ahash::AHashMap;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::borrow::Cow;

/// Number format table from `xl/styles.xml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberFormats {
    custom: AHashMap<u32, String>,
    cell_xfs: Vec<u32>,
}

impl NumberFormats {
    pub fn parse(styles_xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(styles_xml)
            .map_err(|e| PitchtextError::parsing_with_source("Failed to parse styles", e))?;

        let mut formats = NumberFormats::default();
        for node in doc.descendants().filter(|n| n.has_tag_name("numFmt")) {
            let id = node.attribute("numFmtId").and_then(|v| v.parse::<u32>().ok());
            if let (Some(id), Some(code)) = (id, node.attribute("formatCode")) {
                formats.custom.insert(id, code.to_string());
            }
        }

        if let Some(cell_xfs) = doc.descendants().find(|n| n.has_tag_name("cellXfs")) {
            formats.cell_xfs = cell_xfs
                .children()
                .filter(|n| n.has_tag_name("xf"))
                .map(|xf| xf.attribute("numFmtId").and_then(|v| v.parse().ok()).unwrap_or(0))
                .collect();
        }
        Ok(formats)
    }

    /// Format code for a cell style index, built-in or custom.
    pub fn code_for_style(&self, style: usize) -> Option<Cow<'_, str>> {
        let id = *self.cell_xfs.get(style)?;
        if let Some(code) = self.custom.get(&id) {
            return Some(Cow::Borrowed(code.as_str()));
        }
        builtin_format(id).map(Cow::Borrowed)
    }
}

/// Built-in format codes that do not depend on the reader's locale.
pub fn builtin_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "yyyy-mm-dd",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "yyyy-mm-dd h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// How a date-like cell should be printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    Date,
    Time { seconds: bool },
    DateTime { seconds: bool },
}

/// Classify a format code as a date/time format, or `None` for anything else.
pub fn date_kind(code: &str) -> Option<DateTimeKind> {
    let section = sections(code).into_iter().next().unwrap_or_default();
    let letters = section_letters(&section).to_ascii_lowercase();
    if letters.contains("general") {
        return None;
    }
    let letters = letters.replace("ampm", "").replace("ap", "");

    let has_hours = letters.contains('h');
    let has_seconds = letters.contains('s');
    let has_time = has_hours || has_seconds;
    let has_date = letters.contains('y') || letters.contains('d') || (letters.contains('m') && !has_time);

    match (has_date, has_time) {
        (true, true) => Some(DateTimeKind::DateTime { seconds: has_seconds }),
        (true, false) => Some(DateTimeKind::Date),
        (false, true) => Some(DateTimeKind::Time { seconds: has_seconds }),
        (false, false) => None,
    }
}

/// Render a date cell with its format code.
///
/// Returns `None` for codes that are not date/time formats. Seconds are rounded to the
/// nearest whole second before printing.
#[cfg(feature = "excel")]
pub fn format_datetime(datetime: chrono::NaiveDateTime, code: &str) -> Option<String> {
    use chrono::Timelike;
    use std::fmt::Write;

    date_kind(code)?;
    let section = sections(code).into_iter().next()?;
    let tokens = resolve_minutes(date_tokens(&section));
    let twelve_hour = tokens.iter().any(|t| matches!(t, DateToken::AmPm(_)));

    let rounded = (datetime + chrono::TimeDelta::milliseconds(500)).with_nanosecond(0)?;
    let items: Vec<chrono::format::Item<'static>> =
        tokens.iter().map(|token| date_item(token, twelve_hour, &rounded)).collect();

    let mut rendered = String::new();
    write!(rendered, "{}", rounded.format_with_items(items.iter())).ok()?;
    Some(rendered)
}

#[cfg(feature = "excel")]
#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Year(usize),
    Month(usize),
    /// `m`/`mm` before resolution: minutes next to hours or seconds, months otherwise
    MonthOrMinute(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    AmPm(AmPmStyle),
    Literal(String),
}

#[cfg(feature = "excel")]
#[derive(Debug, Clone, Copy, PartialEq)]
enum AmPmStyle {
    Upper,
    Lower,
    Letter { upper: bool },
}

#[cfg(feature = "excel")]
fn date_tokens(section: &str) -> Vec<DateToken> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let run = chars[i..].iter().take_while(|c| c.eq_ignore_ascii_case(&ch)).count();
        let token = match ch.to_ascii_lowercase() {
            '"' => {
                let quoted: String = chars[i + 1..].iter().take_while(|c| **c != '"').collect();
                i += quoted.chars().count() + 2;
                literal.push_str(&quoted);
                continue;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    literal.push(*next);
                }
                i += 2;
                continue;
            }
            '_' => {
                literal.push(' ');
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            '[' => {
                let inner: String = chars[i + 1..].iter().take_while(|c| **c != ']').collect();
                i += inner.chars().count() + 2;
                let width = inner.chars().count();
                match inner.chars().next().map(|c| c.to_ascii_lowercase()) {
                    Some('h') if inner.chars().all(|c| c.eq_ignore_ascii_case(&'h')) => DateToken::Hour(width),
                    Some('m') if inner.chars().all(|c| c.eq_ignore_ascii_case(&'m')) => DateToken::Minute(width),
                    Some('s') if inner.chars().all(|c| c.eq_ignore_ascii_case(&'s')) => DateToken::Second(width),
                    _ => continue,
                }
            }
            'a' => {
                let rest: String = chars[i..].iter().collect();
                let lower = rest.to_ascii_lowercase();
                if lower.starts_with("am/pm") {
                    i += 5;
                    DateToken::AmPm(if ch == 'a' { AmPmStyle::Lower } else { AmPmStyle::Upper })
                } else if lower.starts_with("a/p") {
                    i += 3;
                    DateToken::AmPm(AmPmStyle::Letter { upper: ch == 'A' })
                } else {
                    literal.push(ch);
                    i += 1;
                    continue;
                }
            }
            'y' | 'e' => {
                i += run;
                DateToken::Year(if ch.eq_ignore_ascii_case(&'e') { 4 } else { run })
            }
            'm' => {
                i += run;
                if run > 2 { DateToken::Month(run) } else { DateToken::MonthOrMinute(run) }
            }
            'd' => {
                i += run;
                DateToken::Day(run)
            }
            'h' => {
                i += run;
                DateToken::Hour(run)
            }
            's' => {
                i += run;
                DateToken::Second(run)
            }
            _ => {
                literal.push(ch);
                i += 1;
                continue;
            }
        };
        if !literal.is_empty() {
            tokens.push(DateToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }
    if !literal.is_empty() {
        tokens.push(DateToken::Literal(literal));
    }
    tokens
}

/// `m`/`mm` right after an hour or right before a second is a minute.
#[cfg(feature = "excel")]
fn resolve_minutes(mut tokens: Vec<DateToken>) -> Vec<DateToken> {
    let fields: Vec<usize> = (0..tokens.len())
        .filter(|i| !matches!(tokens[*i], DateToken::Literal(_)))
        .collect();
    for (position, &index) in fields.iter().enumerate() {
        let DateToken::MonthOrMinute(width) = tokens[index] else {
            continue;
        };
        let after_hour = position > 0 && matches!(tokens[fields[position - 1]], DateToken::Hour(_));
        let before_second = fields
            .get(position + 1)
            .is_some_and(|next| matches!(tokens[*next], DateToken::Second(_)));
        tokens[index] = if after_hour || before_second {
            DateToken::Minute(width)
        } else {
            DateToken::Month(width)
        };
    }
    tokens
}

#[cfg(feature = "excel")]
fn date_item(token: &DateToken, twelve_hour: bool, datetime: &chrono::NaiveDateTime) -> chrono::format::Item<'static> {
    use chrono::Timelike;
    use chrono::format::{Fixed, Item, Numeric, Pad};

    let pad = |width: usize| if width >= 2 { Pad::Zero } else { Pad::None };
    match token {
        DateToken::Year(width) if *width <= 2 => Item::Numeric(Numeric::YearMod100, Pad::Zero),
        DateToken::Year(_) => Item::Numeric(Numeric::Year, Pad::Zero),
        DateToken::Month(3) => Item::Fixed(Fixed::ShortMonthName),
        DateToken::Month(4) => Item::Fixed(Fixed::LongMonthName),
        DateToken::Month(width) if *width > 4 => {
            let name = datetime.format("%B").to_string();
            Item::OwnedLiteral(name.chars().take(1).collect::<String>().into_boxed_str())
        }
        DateToken::Month(width) | DateToken::MonthOrMinute(width) => Item::Numeric(Numeric::Month, pad(*width)),
        DateToken::Minute(width) => Item::Numeric(Numeric::Minute, pad(*width)),
        DateToken::Day(3) => Item::Fixed(Fixed::ShortWeekdayName),
        DateToken::Day(width) if *width > 3 => Item::Fixed(Fixed::LongWeekdayName),
        DateToken::Day(width) => Item::Numeric(Numeric::Day, pad(*width)),
        DateToken::Hour(width) if twelve_hour => Item::Numeric(Numeric::Hour12, pad(*width)),
        DateToken::Hour(width) => Item::Numeric(Numeric::Hour, pad(*width)),
        DateToken::Second(width) => Item::Numeric(Numeric::Second, pad(*width)),
        DateToken::AmPm(AmPmStyle::Upper) => Item::Fixed(Fixed::UpperAmPm),
        DateToken::AmPm(AmPmStyle::Lower) => Item::Fixed(Fixed::LowerAmPm),
        DateToken::AmPm(AmPmStyle::Letter { upper }) => {
            let letter = match (datetime.hour() < 12, upper) {
                (true, true) => "A",
                (true, false) => "a",
                (false, true) => "P",
                (false, false) => "p",
            };
            Item::Literal(letter)
        }
        DateToken::Literal(text) => Item::OwnedLiteral(text.clone().into_boxed_str()),
    }
}

/// Render a number with a format code.
///
/// Returns `None` when the code has no digit placeholders (General, text, dates), in which
/// case the caller falls back to [`format_general`].
pub fn format_number(value: f64, code: &str) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let parts = sections(code);
    let (section, value, explicit_sign) = match parts.as_slice() {
        [_, negative, ..] if value < 0.0 && !negative.trim().is_empty() => (negative.clone(), -value, true),
        [positive, ..] => (positive.clone(), value, false),
        [] => return None,
    };
    if section.eq_ignore_ascii_case("general") || date_kind(&section).is_some() {
        return None;
    }

    let tokens = tokenize(&section);
    let first = tokens.iter().position(|t| matches!(t, Token::Digits(_)))?;
    let last = tokens.iter().rposition(|t| matches!(t, Token::Digits(_)))?;
    if tokens[first..=last]
        .iter()
        .any(|t| matches!(t, Token::Literal(text) if text.contains('/')))
    {
        // fractions
        return None;
    }

    let mut pattern = String::new();
    let mut prefix = String::new();
    let mut suffix = String::new();
    let mut percent = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Percent => {
                percent += 1;
                if i < first { prefix.push('%') } else { suffix.push('%') }
            }
            Token::Literal(text) if i < first => prefix.push_str(text),
            Token::Literal(text) if i > last => suffix.push_str(text),
            Token::Literal(_) => {}
            Token::Digits(digits) => pattern.push_str(digits),
        }
    }

    let mut scaled = value;
    for _ in 0..percent {
        scaled *= 100.0;
    }

    let number = if let Some(exp_at) = pattern.find(['E', 'e']) {
        format_scientific(scaled, &pattern[..exp_at])
    } else {
        format_fixed(scaled, &pattern)
    };

    let sign = if scaled < 0.0 && !explicit_sign && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    let number = number.trim_start_matches('-');
    Some(format!("{}{}{}{}", sign, prefix, number, suffix))
}

fn format_fixed(value: f64, pattern: &str) -> String {
    let (integer_part, fraction_part) = pattern.split_once('.').unwrap_or((pattern, ""));

    let trailing_commas = integer_part.len() - integer_part.trim_end_matches(',').len();
    let integer_part = integer_part.trim_end_matches(',');
    let mut value = value;
    for _ in 0..trailing_commas {
        value /= 1000.0;
    }

    let decimals = fraction_part.chars().filter(|c| matches!(c, '0' | '#' | '?')).count();
    let min_integer_digits = integer_part.chars().filter(|c| *c == '0').count();
    let grouped = integer_part.contains(',');

    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_digits, frac_digits) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));

    let mut int_digits = int_digits.trim_start_matches('0').to_string();
    while int_digits.len() < min_integer_digits {
        int_digits.insert(0, '0');
    }
    if grouped {
        int_digits = group_thousands(&int_digits);
    }

    let optional_decimals = fraction_part.chars().rev().take_while(|c| *c == '#').count();
    let mut frac_digits = frac_digits.to_string();
    for _ in 0..optional_decimals {
        if frac_digits.ends_with('0') {
            frac_digits.pop();
        }
    }

    let sign = if value < 0.0 { "-" } else { "" };
    if frac_digits.is_empty() {
        if int_digits.is_empty() {
            int_digits.push('0');
        }
        format!("{}{}", sign, int_digits)
    } else {
        format!("{}{}.{}", sign, int_digits, frac_digits)
    }
}

fn format_scientific(value: f64, mantissa_pattern: &str) -> String {
    let decimals = mantissa_pattern
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count())
        .unwrap_or(0);
    let rendered = format!("{:.*e}", decimals, value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}E{}{:02}", mantissa, sign, exponent.abs())
        }
        None => rendered,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Render a number the way the General format shows it.
pub fn format_general(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let rendered = format!("{:.10}", value);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" { "0".to_string() } else { trimmed.to_string() }
}

#[derive(Debug, PartialEq)]
enum Token {
    Digits(String),
    Percent,
    Literal(String),
}

/// Split a format code into `;`-separated sections, respecting quotes and escapes.
fn sections(code: &str) -> Vec<String> {
    let mut sections = vec![String::new()];
    let mut chars = code.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                if let Some(section) = sections.last_mut() {
                    section.push('\\');
                    if let Some(next) = chars.next() {
                        section.push(next);
                    }
                }
                continue;
            }
            ';' if !in_quotes => {
                sections.push(String::new());
                continue;
            }
            _ => {}
        }
        if let Some(section) = sections.last_mut() {
            section.push(ch);
        }
    }
    sections
}

/// Unquoted letters of a section, outside brackets, for date/time classification.
fn section_letters(section: &str) -> String {
    let mut letters = String::new();
    let mut chars = section.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                if inner.chars().all(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's')) {
                    letters.push_str(&inner);
                }
            }
            c if c.is_ascii_alphabetic() => letters.push(c),
            _ => {}
        }
    }
    letters
}

fn tokenize(section: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = section.chars().peekable();
    let mut in_quotes = false;
    let mut quoted = String::new();

    let push_literal = |tokens: &mut Vec<Token>, text: &str| {
        if let Some(Token::Literal(existing)) = tokens.last_mut() {
            existing.push_str(text);
        } else {
            tokens.push(Token::Literal(text.to_string()));
        }
    };

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
                push_literal(&mut tokens, &quoted);
                quoted.clear();
            } else {
                quoted.push(ch);
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '\\' => {
                if let Some(next) = chars.next() {
                    push_literal(&mut tokens, &next.to_string());
                }
            }
            '_' => {
                chars.next();
                push_literal(&mut tokens, " ");
            }
            '*' => {
                chars.next();
            }
            '[' => {
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '%' => tokens.push(Token::Percent),
            '0' | '#' | '?' | '.' | ',' => {
                if let Some(Token::Digits(digits)) = tokens.last_mut() {
                    digits.push(ch);
                } else if matches!(ch, '0' | '#' | '?') {
                    tokens.push(Token::Digits(ch.to_string()));
                } else if ch == '.' && chars.peek().is_some_and(|c| matches!(c, '0' | '#' | '?')) {
                    tokens.push(Token::Digits(ch.to_string()));
                } else {
                    push_literal(&mut tokens, &ch.to_string());
                }
            }
            'E' | 'e' if matches!(tokens.last(), Some(Token::Digits(_))) && chars.peek().is_some_and(|c| matches!(c, '+' | '-')) => {
                if let Some(Token::Digits(digits)) = tokens.last_mut() {
                    digits.push('E');
                    if let Some(sign) = chars.next() {
                        digits.push(sign);
                    }
                }
            }
            other => push_literal(&mut tokens, &other.to_string()),
        }
    }
    tokens
}

/// Style index of every styled cell in a worksheet part, keyed by zero-based `(row, col)`.
///
/// Cells without an `r` attribute take the position after the previous cell in the row.
pub fn cell_styles(sheet_xml: &str) -> AHashMap<(u32, u32), usize> {
    let mut styles = AHashMap::new();
    let mut reader = Reader::from_str(sheet_xml);
    reader.config_mut().check_end_names = false;

    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"r")
                        .and_then(|a| std::str::from_utf8(&a.value).ok()?.parse::<u32>().ok())
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or(next_row);
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let mut position = None;
                    let mut style = None;
                    for attr in e.attributes().flatten() {
                        let Ok(value) = std::str::from_utf8(&attr.value) else {
                            continue;
                        };
                        match attr.key.local_name().as_ref() {
                            b"r" => position = parse_cell_ref(value),
                            b"s" => style = value.parse::<usize>().ok(),
                            _ => {}
                        }
                    }
                    let (cell_row, cell_col) = position.unwrap_or((row, next_col));
                    next_col = cell_col + 1;
                    if let Some(style) = style.filter(|s| *s != 0) {
                        styles.insert((cell_row, cell_col), style);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Stopped reading cell styles at {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }
    styles
}

/// Parse an A1-style reference into zero-based `(row, col)`.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.trim().trim_start_matches('$');
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let letters = letters.trim_end_matches('$');
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for ch in letters.chars() {
        col = col.checked_mul(26)?.checked_add(u32::from(ch.to_ascii_uppercase() as u8 - b'A' + 1))?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Format an A1-style reference from zero-based coordinates.
pub fn cell_ref(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
        <numFmts count="2">
          <numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.0"/>
          <numFmt numFmtId="165" formatCode="yyyy/mm/dd"/>
        </numFmts>
        <cellXfs count="4">
          <xf numFmtId="0"/><xf numFmtId="9"/><xf numFmtId="164"/><xf numFmtId="165"/>
        </cellXfs></styleSheet>"#;

    #[test]
    fn test_parse_styles_resolves_builtin_and_custom() {
        let formats = NumberFormats::parse(STYLES).unwrap();
        assert_eq!(formats.code_for_style(0).as_deref(), Some("General"));
        assert_eq!(formats.code_for_style(1).as_deref(), Some("0%"));
        assert_eq!(formats.code_for_style(2).as_deref(), Some("\"$\"#,##0.0"));
        assert_eq!(formats.code_for_style(9), None);
    }

    #[test]
    fn test_percent_formats() {
        assert_eq!(format_number(0.25, "0%").as_deref(), Some("25%"));
        assert_eq!(format_number(0.1234, "0.00%").as_deref(), Some("12.34%"));
    }

    #[test]
    fn test_fixed_and_grouped_formats() {
        assert_eq!(format_number(1234567.891, "#,##0").as_deref(), Some("1,234,568"));
        assert_eq!(format_number(1234.5, "#,##0.00").as_deref(), Some("1,234.50"));
        assert_eq!(format_number(3.14159, "0.00").as_deref(), Some("3.14"));
        assert_eq!(format_number(0.5, "#.##").as_deref(), Some(".5"));
        assert_eq!(format_number(7.0, "0").as_deref(), Some("7"));
    }

    #[test]
    fn test_literal_prefix_and_suffix() {
        assert_eq!(format_number(4200000.0, "\"$\"#,##0.0").as_deref(), Some("$4,200,000.0"));
        assert_eq!(format_number(12.0, "0\" users\"").as_deref(), Some("12 users"));
    }

    #[test]
    fn test_negative_section() {
        assert_eq!(format_number(-1500.0, "#,##0 ;(#,##0)").as_deref(), Some("(1,500)"));
        assert_eq!(format_number(-2.5, "0.0").as_deref(), Some("-2.5"));
    }

    #[test]
    fn test_thousands_scaling() {
        assert_eq!(format_number(2500000.0, "#,##0,\"K\"").as_deref(), Some("2,500K"));
    }

    #[test]
    fn test_scientific() {
        assert_eq!(format_number(12345.0, "0.00E+00").as_deref(), Some("1.23E+04"));
    }

    #[test]
    fn test_general_and_dates_fall_back() {
        assert_eq!(format_number(1.5, "General"), None);
        assert_eq!(format_number(45000.0, "yyyy-mm-dd"), None);
        assert_eq!(format_number(1.0, "@"), None);
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(3.0), "3");
        assert_eq!(format_general(0.1 + 0.2), "0.3");
        assert_eq!(format_general(-12.75), "-12.75");
    }

    #[test]
    fn test_date_kind() {
        assert_eq!(date_kind("yyyy/mm/dd"), Some(DateTimeKind::Date));
        assert_eq!(date_kind("mmm-yy"), Some(DateTimeKind::Date));
        assert_eq!(date_kind("h:mm AM/PM"), Some(DateTimeKind::Time { seconds: false }));
        assert_eq!(date_kind("[h]:mm:ss"), Some(DateTimeKind::Time { seconds: true }));
        assert_eq!(date_kind("yyyy-mm-dd h:mm"), Some(DateTimeKind::DateTime { seconds: false }));
        assert_eq!(date_kind("#,##0.00"), None);
        assert_eq!(date_kind("\"day\" 0"), None);
        assert_eq!(date_kind("General"), None);
        assert_eq!(date_kind("0.00E+00"), None);
    }

    #[test]
    fn test_cell_refs() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("AB12"), Some((11, 27)));
        assert_eq!(parse_cell_ref("$C$3"), Some((2, 2)));
        assert_eq!(parse_cell_ref("12"), None);
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(11, 27), "AB12");
        assert_eq!(cell_ref(0, 702), "AAA1");
    }

    #[test]
    fn test_cell_styles_reads_explicit_and_implicit_positions() {
        let sheet = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
            <row r="2"><c r="B2" s="1"><v>0.5</v></c><c s="2"><v>3</v></c><c r="E2"><v>1</v></c></row>
            <row><c s="3"><v>45000</v></c></row>
          </sheetData></worksheet>"#;
        let styles = cell_styles(sheet);
        assert_eq!(styles.get(&(1, 1)), Some(&1));
        assert_eq!(styles.get(&(1, 2)), Some(&2));
        assert_eq!(styles.get(&(1, 4)), None);
        assert_eq!(styles.get(&(2, 0)), Some(&3));
    }

    #[cfg(feature = "excel")]
    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[cfg(feature = "excel")]
    #[test]
    fn test_format_datetime_follows_custom_codes() {
        let new_year = at(2024, 1, 1, 13, 5, 9);
        let render = |code: &str| format_datetime(new_year, code);

        assert_eq!(render("yyyy/mm/dd").as_deref(), Some("2024/01/01"));
        assert_eq!(render("d-mmm-yy").as_deref(), Some("1-Jan-24"));
        assert_eq!(render("mmmm d, yyyy").as_deref(), Some("January 1, 2024"));
        assert_eq!(render("dddd").as_deref(), Some("Monday"));
        assert_eq!(render("yyyy\"年\"m\"月\"d\"日\"").as_deref(), Some("2024年1月1日"));
        assert_eq!(render("[$-409]mmmmm").as_deref(), Some("J"));
    }

    #[cfg(feature = "excel")]
    #[test]
    fn test_format_datetime_minutes_and_clock() {
        let afternoon = at(2024, 3, 15, 13, 5, 9);
        let render = |code: &str| format_datetime(afternoon, code);

        assert_eq!(render("h:mm AM/PM").as_deref(), Some("1:05 PM"));
        assert_eq!(render("hh:mm:ss").as_deref(), Some("13:05:09"));
        assert_eq!(render("m/d/yy h:mm").as_deref(), Some("3/15/24 13:05"));
        assert_eq!(render("mm:ss").as_deref(), Some("05:09"));
        assert_eq!(render("yyyy-mm-dd h:mm").as_deref(), Some("2024-03-15 13:05"));
        assert_eq!(render("h:mm a/p").as_deref(), Some("1:05 p"));
        assert_eq!(render("0.00"), None);
    }

    #[cfg(feature = "excel")]
    #[test]
    fn test_format_datetime_rounds_to_whole_seconds() {
        let almost = at(2024, 1, 1, 9, 59, 59) + chrono::TimeDelta::milliseconds(700);
        assert_eq!(format_datetime(almost, "hh:mm:ss").as_deref(), Some("10:00:00"));
    }
}
