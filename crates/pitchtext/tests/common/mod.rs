//! Shared fixtures: OOXML packages assembled in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const SPREADSHEET_DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const PRESENTATION_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

pub fn build_package(parts: &[(&str, String)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, content) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}

/// Inline-string cell.
pub fn text_cell(reference: &str, text: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
}

pub fn worksheet(rows: &[(u32, Vec<String>)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(number, cells)| format!(r#"<row r="{number}">{}</row>"#, cells.concat()))
        .collect();
    format!(r#"<worksheet xmlns="{SPREADSHEET_NS}"><sheetData>{rows}</sheetData></worksheet>"#)
}

/// Workbook, workbook relationships and content types for `sheet_names`, with sheet N
/// stored at `xl/worksheets/sheetN.xml`.
pub fn workbook_parts(sheet_names: &[&str]) -> Vec<(&'static str, String)> {
    let sheets: String = sheet_names
        .iter()
        .enumerate()
        .map(|(i, name)| format!(r#"<sheet name="{name}" sheetId="{}" r:id="rId{}"/>"#, i + 1, i + 1))
        .collect();
    let rels: String = (1..=sheet_names.len())
        .map(|i| {
            format!(r#"<Relationship Id="rId{i}" Type="{RELATIONSHIP_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#)
        })
        .collect();

    vec![
        (
            "[Content_Types].xml",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(r#"<workbook xmlns="{SPREADSHEET_NS}" xmlns:r="{RELATIONSHIP_NS}"><sheets>{sheets}</sheets></workbook>"#),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">{rels}</Relationships>"#),
        ),
    ]
}

pub fn drawing_relationship(target: &str) -> String {
    format!(
        r#"<Relationships xmlns="{PACKAGE_RELS_NS}"><Relationship Id="rId1" Type="{RELATIONSHIP_NS}/drawing" Target="{target}"/></Relationships>"#
    )
}

/// Drawing with one two-cell anchored shape per `(from, to, text)`.
pub fn drawing(shapes: &[((u32, u32), (u32, u32), &str)]) -> String {
    let anchors: String = shapes
        .iter()
        .map(|((from_row, from_col), (to_row, to_col), text)| {
            format!(
                "<xdr:twoCellAnchor>\
                 <xdr:from><xdr:col>{from_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{from_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>\
                 <xdr:to><xdr:col>{to_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{to_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>\
                 <xdr:sp><xdr:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></xdr:txBody></xdr:sp>\
                 <xdr:clientData/></xdr:twoCellAnchor>"
            )
        })
        .collect();
    format!(r#"<xdr:wsDr xmlns:xdr="{SPREADSHEET_DRAWING_NS}" xmlns:a="{DRAWING_NS}">{anchors}</xdr:wsDr>"#)
}

pub fn slide(texts: &[&str]) -> String {
    let paragraphs: String = texts
        .iter()
        .map(|t| format!("<a:p><a:r><a:t>{t}</a:t></a:r></a:p>"))
        .collect();
    format!(
        r#"<p:sld xmlns:p="{PRESENTATION_NS}" xmlns:a="{DRAWING_NS}"><p:cSld><p:spTree><p:sp><p:txBody>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
    )
}
